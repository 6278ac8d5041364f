/// Queue resolution against the routing table
use crate::error::MailgateError;
use crate::routing::address::parse_address;
use serde::Deserialize;
use std::collections::HashMap;

/// One routing table entry.
///
/// Configuration values are strings or `null`: a non-empty string maps the
/// key to a named queue, an empty string routes to the key itself, and
/// `null` explicitly refuses delivery for the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEntry {
    /// Route to an explicitly named queue
    Mapped(String),
    /// Entry present without a queue name; the matched key is the queue
    Unnamed,
    /// Refuse delivery for this key
    Blocked,
}

impl<'de> Deserialize<'de> for RouteEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(match value {
            None => RouteEntry::Blocked,
            Some(name) if name.is_empty() => RouteEntry::Unnamed,
            Some(name) => RouteEntry::Mapped(name),
        })
    }
}

/// Operator-supplied mapping from canonical address or bare domain to a
/// route entry. Keys are exact-match and case-sensitive; canonical-address
/// entries are consulted before domain entries, with no other precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable(HashMap<String, RouteEntry>);

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the flat JSON object form used in configuration, e.g.
    /// `{"example.org": "somequeue", "blocked@example.org": null}`.
    pub fn from_json(json: &str) -> Result<Self, MailgateError> {
        serde_json::from_str(json)
            .map_err(|e| MailgateError::Config(format!("Invalid routing table JSON: {}", e)))
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: RouteEntry) {
        self.0.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&RouteEntry> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of routing a recipient address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Deliver to the named queue
    Accept(String),
    /// Refuse the recipient
    Reject,
}

fn resolve_entry(entry: &RouteEntry, matched_key: &str) -> RoutingDecision {
    match entry {
        RouteEntry::Mapped(queue) => RoutingDecision::Accept(queue.clone()),
        RouteEntry::Unnamed => RoutingDecision::Accept(matched_key.to_string()),
        RouteEntry::Blocked => RoutingDecision::Reject,
    }
}

/// Maps a recipient address to a destination queue or a rejection.
///
/// Canonical-address entries strictly shadow domain entries for that one
/// mailbox, whatever their value; a blocked mailbox does not block its
/// siblings, which still fall through to the domain entry. Tags attach to
/// the decomposition and never to the decision.
pub fn resolve_queue(
    address: &str,
    table: &RoutingTable,
) -> Result<RoutingDecision, MailgateError> {
    let parsed = parse_address(address)?;

    if let Some(entry) = table.get(&parsed.canonical) {
        return Ok(resolve_entry(entry, &parsed.canonical));
    }

    match table.get(&parsed.domain) {
        Some(entry) => Ok(resolve_entry(entry, &parsed.domain)),
        None => Ok(RoutingDecision::Reject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, RouteEntry)]) -> RoutingTable {
        let mut t = RoutingTable::new();
        for (key, entry) in entries {
            t.insert(*key, entry.clone());
        }
        t
    }

    #[test]
    fn test_domain_entry_routes_all_mailboxes() {
        let t = table(&[("example.org", RouteEntry::Mapped("somequeue".into()))]);

        assert_eq!(
            resolve_queue("anyone@example.org", &t).unwrap(),
            RoutingDecision::Accept("somequeue".to_string())
        );
        assert_eq!(
            resolve_queue("someone.else@example.org", &t).unwrap(),
            RoutingDecision::Accept("somequeue".to_string())
        );
    }

    #[test]
    fn test_unknown_domain_is_rejected() {
        let t = table(&[("example.org", RouteEntry::Mapped("somequeue".into()))]);

        assert_eq!(
            resolve_queue("user@other.org", &t).unwrap(),
            RoutingDecision::Reject
        );
    }

    #[test]
    fn test_canonical_entry_shadows_domain_entry() {
        let t = table(&[
            ("example.org", RouteEntry::Mapped("domain-q".into())),
            ("special@example.org", RouteEntry::Mapped("full-q".into())),
        ]);

        assert_eq!(
            resolve_queue("special@example.org", &t).unwrap(),
            RoutingDecision::Accept("full-q".to_string())
        );
        assert_eq!(
            resolve_queue("other@example.org", &t).unwrap(),
            RoutingDecision::Accept("domain-q".to_string())
        );
    }

    #[test]
    fn test_unnamed_entry_routes_to_matched_key() {
        let t = table(&[("example.org", RouteEntry::Unnamed)]);

        assert_eq!(
            resolve_queue("x@example.org", &t).unwrap(),
            RoutingDecision::Accept("example.org".to_string())
        );

        let t = table(&[("inbox@example.org", RouteEntry::Unnamed)]);
        assert_eq!(
            resolve_queue("inbox@example.org", &t).unwrap(),
            RoutingDecision::Accept("inbox@example.org".to_string())
        );
    }

    #[test]
    fn test_blocked_domain_rejects_all_mailboxes() {
        let t = table(&[("example.com", RouteEntry::Blocked)]);

        assert_eq!(
            resolve_queue("anyone@example.com", &t).unwrap(),
            RoutingDecision::Reject
        );
    }

    #[test]
    fn test_blocked_mailbox_does_not_block_siblings() {
        let t = table(&[
            ("example.org", RouteEntry::Mapped("domain-q".into())),
            ("noreply@example.org", RouteEntry::Blocked),
        ]);

        assert_eq!(
            resolve_queue("noreply@example.org", &t).unwrap(),
            RoutingDecision::Reject
        );
        // Siblings still fall through to the domain entry
        assert_eq!(
            resolve_queue("support@example.org", &t).unwrap(),
            RoutingDecision::Accept("domain-q".to_string())
        );
    }

    #[test]
    fn test_tags_never_affect_routing() {
        let t = table(&[
            ("example.org", RouteEntry::Mapped("domain-q".into())),
            ("popkiller@example.org", RouteEntry::Mapped("anotherqueue".into())),
        ]);

        assert_eq!(
            resolve_queue("popkiller@example.org", &t).unwrap(),
            resolve_queue("popkiller+tag1@example.org", &t).unwrap()
        );
        assert_eq!(
            resolve_queue("other@example.org", &t).unwrap(),
            resolve_queue("other+a+b@example.org", &t).unwrap()
        );
    }

    #[test]
    fn test_empty_table_rejects_everything() {
        let t = RoutingTable::new();
        assert_eq!(
            resolve_queue("user@example.org", &t).unwrap(),
            RoutingDecision::Reject
        );
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let t = table(&[("Example.org", RouteEntry::Mapped("q".into()))]);
        assert_eq!(
            resolve_queue("user@example.org", &t).unwrap(),
            RoutingDecision::Reject
        );
    }

    #[test]
    fn test_table_from_json() {
        let t = RoutingTable::from_json(
            r#"{"example.org": "somequeue", "drop@example.org": null, "example.net": ""}"#,
        )
        .unwrap();

        assert_eq!(
            t.get("example.org"),
            Some(&RouteEntry::Mapped("somequeue".to_string()))
        );
        assert_eq!(t.get("drop@example.org"), Some(&RouteEntry::Blocked));
        assert_eq!(t.get("example.net"), Some(&RouteEntry::Unnamed));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_table_from_invalid_json() {
        let result = RoutingTable::from_json("not json");
        assert!(matches!(result, Err(MailgateError::Config(_))));
    }
}
