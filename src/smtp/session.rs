/// Per-connection SMTP transaction state
use crate::constants::{MAX_MESSAGE_SIZE_BYTES, MAX_RECIPIENTS};
use crate::error::MailgateError;
use crate::handlers::{Delivery, IngestPipeline};
use crate::smtp::commands::Command;
use crate::smtp::response::SmtpResponse;

/// State for one inbound session. Command handling within a session is
/// strictly sequential; concurrency lives at the connection level.
#[derive(Debug, Default)]
pub struct Session {
    greeted: bool,
    sender: Option<String>,
    deliveries: Vec<Delivery>,
    data: Vec<u8>,
    in_data: bool,
    discarding: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_data(&self) -> bool {
        self.in_data
    }

    /// Whether the current body is being discarded after the size cap
    /// tripped
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Clears the current mail transaction, keeping the greeting
    pub fn reset(&mut self) {
        self.sender = None;
        self.deliveries.clear();
        self.data.clear();
        self.in_data = false;
        self.discarding = false;
    }

    /// Applies one command and returns the reply to send. DATA only
    /// switches the session into body-collection mode; body completion is
    /// handled by the connection loop.
    pub fn apply(&mut self, command: Command, hostname: &str, pipeline: &IngestPipeline) -> SmtpResponse {
        match command {
            Command::Helo(client) => {
                self.greeted = true;
                self.reset();
                SmtpResponse::helo(hostname, &client)
            }
            Command::Ehlo(client) => {
                self.greeted = true;
                self.reset();
                SmtpResponse::ehlo(hostname, &client)
            }
            Command::Auth => error_response(&pipeline.reject_authentication()),
            Command::MailFrom(address) => {
                if !self.greeted {
                    return SmtpResponse::new(503, "Send HELO/EHLO first");
                }
                self.reset();
                self.sender = Some(address);
                SmtpResponse::ok()
            }
            Command::RcptTo(address) => {
                if self.sender.is_none() {
                    return SmtpResponse::new(503, "Need MAIL command first");
                }
                if self.deliveries.len() >= MAX_RECIPIENTS {
                    return SmtpResponse::new(452, "Too many recipients");
                }
                match pipeline.decide_recipient(&address) {
                    Ok(delivery) => {
                        self.deliveries.push(delivery);
                        SmtpResponse::ok()
                    }
                    Err(e) => error_response(&e),
                }
            }
            Command::Data => {
                if self.deliveries.is_empty() {
                    return SmtpResponse::new(503, "Need RCPT command first");
                }
                self.in_data = true;
                self.data.clear();
                SmtpResponse::data_start()
            }
            Command::Rset => {
                self.reset();
                SmtpResponse::ok()
            }
            Command::Noop => SmtpResponse::ok(),
            Command::Quit => SmtpResponse::quit(hostname),
            Command::Unknown(_) => SmtpResponse::new(500, "Command not recognized"),
        }
    }

    /// Appends one raw data line (already stripped of the terminator dot
    /// handling). Once the size cap trips the session stays in data mode
    /// and swallows the rest of the body; the single 552 reply goes out at
    /// the terminating dot. Body content must never be parsed as commands.
    pub fn push_data_line(&mut self, line: &[u8]) {
        if self.discarding {
            return;
        }
        if self.data.len() + line.len() > MAX_MESSAGE_SIZE_BYTES {
            self.data.clear();
            self.discarding = true;
            return;
        }
        self.data.extend_from_slice(line);
    }

    /// Ends body collection, yielding the delivery that drives routing
    /// (the first accepted recipient) and the raw body.
    pub fn take_body(&mut self) -> Option<(Delivery, Vec<u8>)> {
        if !self.in_data || self.discarding {
            return None;
        }
        let delivery = self.deliveries.first().cloned()?;
        let body = std::mem::take(&mut self.data);
        self.reset();
        Some((delivery, body))
    }
}

/// Maps a pipeline error onto the SMTP reply the client sees. Permanent
/// failures get 5xx, transient delivery failures 4xx.
pub fn error_response(error: &MailgateError) -> SmtpResponse {
    let code = match error {
        MailgateError::AuthenticationRejected => 502,
        MailgateError::RecipientRejected(_) => 550,
        MailgateError::InvalidAddress(_) => 501,
        _ if error.is_permanent() => 550,
        _ => 451,
    };
    SmtpResponse::new(code, error.to_string())
}
