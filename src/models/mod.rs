/// Data models
pub mod config;
pub mod email;

pub use config::{GatewayConfig, ServerConfig};
pub use email::{Attachment, Email, EmailAddress, EmailBody};
