/// Error types for the mailgate system
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailgateError {
    #[error("No authentication supported")]
    AuthenticationRejected,

    #[error("Not allowed: {0}")]
    RecipientRejected(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailure(String),

    #[error("Email parsing error: {0}")]
    EmailParsing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MailgateError {
    /// Whether the failure is permanent from the submitting client's view.
    ///
    /// Permanent failures map to SMTP 5xx replies, transient ones to 4xx.
    /// Delivery failures are transient: the client may resend, the gateway
    /// itself never retries.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::AuthenticationRejected => true,
            Self::RecipientRejected(_) => true,
            Self::InvalidAddress(_) => true,
            Self::Config(_) => true,
            Self::BrokerUnavailable(_) => false,
            Self::DeliveryFailure(_) => false,
            Self::EmailParsing(_) => false,
        }
    }
}

impl From<serde_json::Error> for MailgateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<lapin::Error> for MailgateError {
    fn from(err: lapin::Error) -> Self {
        Self::DeliveryFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_errors() {
        assert!(MailgateError::AuthenticationRejected.is_permanent());
        assert!(MailgateError::RecipientRejected("a@b.c".to_string()).is_permanent());
        assert!(!MailgateError::DeliveryFailure("publish failed".to_string()).is_permanent());
        assert!(!MailgateError::EmailParsing("bad MIME".to_string()).is_permanent());
    }

    #[test]
    fn test_error_display() {
        let err = MailgateError::RecipientRejected("nobody@example.net".to_string());
        assert_eq!(err.to_string(), "Not allowed: nobody@example.net");

        assert_eq!(
            MailgateError::AuthenticationRejected.to_string(),
            "No authentication supported"
        );
    }
}
