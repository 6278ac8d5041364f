/// SMTP reply formatting
use crate::constants::{MAX_MESSAGE_SIZE_BYTES, SERVER_BANNER};

/// A reply line (or lines) sent back to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    pub code: u16,
    pub message: String,
    /// Extra lines for multiline replies (EHLO capabilities)
    pub extra: Vec<String>,
}

impl SmtpResponse {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            extra: Vec::new(),
        }
    }

    pub fn greeting(hostname: &str) -> Self {
        Self::new(220, format!("{} {}", hostname, SERVER_BANNER))
    }

    pub fn ok() -> Self {
        Self::new(250, "OK")
    }

    pub fn helo(hostname: &str, client: &str) -> Self {
        Self::new(250, format!("{} Hello {}", hostname, client))
    }

    /// EHLO reply. AUTH is never advertised.
    pub fn ehlo(hostname: &str, client: &str) -> Self {
        Self {
            code: 250,
            message: format!("{} Hello {}", hostname, client),
            extra: vec![format!("SIZE {}", MAX_MESSAGE_SIZE_BYTES), "8BITMIME".to_string()],
        }
    }

    pub fn data_start() -> Self {
        Self::new(354, "End data with <CR><LF>.<CR><LF>")
    }

    pub fn queued(token: &str) -> Self {
        Self::new(250, format!("Message queued as {}", token))
    }

    pub fn quit(hostname: &str) -> Self {
        Self::new(221, format!("{} Bye", hostname))
    }

    /// Wire format, CRLF-terminated; multiline replies use the dash
    /// continuation form.
    pub fn format(&self) -> String {
        if self.extra.is_empty() {
            return format!("{} {}\r\n", self.code, self.message);
        }

        let mut out = format!("{}-{}\r\n", self.code, self.message);
        for (i, line) in self.extra.iter().enumerate() {
            if i == self.extra.len() - 1 {
                out.push_str(&format!("{} {}\r\n", self.code, line));
            } else {
                out.push_str(&format!("{}-{}\r\n", self.code, line));
            }
        }
        out
    }
}
