/// Recipient address decomposition
use crate::constants::TAG_DELIMITER;
use crate::error::MailgateError;

/// Structured decomposition of a recipient address.
///
/// Computed per resolution call; carries no identity beyond it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    /// Local part before the first tag delimiter
    pub user: String,
    /// Sub-addressing tag segments, in order, possibly empty
    pub tags: Vec<String>,
    /// Portion after the `@`
    pub domain: String,
    /// `user@domain` with tags stripped
    pub canonical: String,
}

/// Splits an address into user, tags, domain and canonical form.
///
/// The upstream protocol layer is expected to hand over addresses that
/// contain an `@`; anything else is a contract violation and fails with
/// `InvalidAddress`. Tags are the `+`-delimited segments of the local part
/// after the first; they are kept verbatim, untrimmed and undeduplicated.
pub fn parse_address(address: &str) -> Result<ParsedAddress, MailgateError> {
    let (local_part, domain) = address
        .split_once('@')
        .ok_or_else(|| MailgateError::InvalidAddress(address.to_string()))?;

    let mut segments = local_part.split(TAG_DELIMITER);
    let user = segments.next().unwrap_or_default().to_string();
    let tags: Vec<String> = segments.map(str::to_string).collect();

    let canonical = format!("{}@{}", user, domain);

    Ok(ParsedAddress {
        user,
        tags,
        domain: domain.to_string(),
        canonical,
    })
}
