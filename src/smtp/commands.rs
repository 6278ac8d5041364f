/// SMTP command parsing
use crate::constants::MAX_EMAIL_ADDRESS_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Helo(String),
    Ehlo(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    Rset,
    Noop,
    Quit,
    Auth,
    Unknown(String),
}

/// Parses one command line. Verbs are case-insensitive; address arguments
/// are kept as received.
pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let mut parts = trimmed.splitn(2, ' ');
    let verb = parts.next().unwrap_or_default().to_uppercase();
    let rest = parts.next().unwrap_or_default().trim();

    match verb.as_str() {
        "HELO" => Command::Helo(rest.to_string()),
        "EHLO" => Command::Ehlo(rest.to_string()),
        "MAIL" => match reverse_path(rest, "FROM:") {
            Some(addr) => Command::MailFrom(addr),
            None => Command::Unknown(trimmed.to_string()),
        },
        "RCPT" => match reverse_path(rest, "TO:") {
            Some(addr) => Command::RcptTo(addr),
            None => Command::Unknown(trimmed.to_string()),
        },
        "DATA" => Command::Data,
        "RSET" => Command::Rset,
        "NOOP" => Command::Noop,
        "QUIT" => Command::Quit,
        "AUTH" => Command::Auth,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

/// Extracts the address from `FROM:<addr>` / `TO:<addr>` arguments,
/// tolerating a space after the colon and ignoring trailing ESMTP
/// parameters.
fn reverse_path(arg: &str, prefix: &str) -> Option<String> {
    let upper = arg.to_uppercase();
    if !upper.starts_with(prefix) {
        return None;
    }

    let rest = arg[prefix.len()..].trim_start();
    let open = rest.find('<')?;
    let close = rest[open..].find('>')? + open;
    let addr = &rest[open + 1..close];

    if addr.len() > MAX_EMAIL_ADDRESS_LENGTH {
        return None;
    }

    Some(addr.to_string())
}
