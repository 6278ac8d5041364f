/// Logging utilities for address redaction
///
/// Recipient addresses are PII; log lines keep the domain for debugging
/// and mask the local part.
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap());

/// Redacts email addresses from text, preserving domain for debugging
///
/// # Examples
/// ```
/// use mailgate::utils::logging::redact_email;
///
/// assert_eq!(redact_email("user@example.com"), "***@example.com");
/// ```
pub fn redact_email(text: &str) -> String {
    EMAIL_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let email = &caps[0];
            match email.find('@') {
                Some(at_pos) => format!("***{}", &email[at_pos..]),
                None => "***@***".to_string(),
            }
        })
        .to_string()
}

/// Extracts the domain from an address for safe logging
pub fn domain_for_log(email: &str) -> String {
    email.split('@').nth(1).unwrap_or("unknown").to_string()
}
