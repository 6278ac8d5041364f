/// Email processing modules
pub mod parser;

pub use parser::{EmailParser, MailParserEmailParser};
