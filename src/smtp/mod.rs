/// SMTP protocol layer
pub mod commands;
pub mod response;
pub mod server;
pub mod session;

pub use server::SmtpServer;
