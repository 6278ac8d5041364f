/// Ingest pipeline - the two decision points of a message's lifetime
use crate::email::parser::EmailParser;
use crate::error::MailgateError;
use crate::routing::{RoutingDecision, RoutingTable, parse_address, resolve_queue};
use crate::services::broker::BrokerPublisher;
use crate::utils::logging::redact_email;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Routing outcome remembered between recipient acceptance and body
/// delivery: where the message goes and which tags travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub queue: String,
    pub tags: Vec<String>,
}

/// Orchestrates recipient acceptance and body delivery.
///
/// Routing decisions are pure and synchronous; the only suspension points
/// are queue declare, parse and publish. Nothing here retries: a failure
/// fails that one message and surfaces to the submitting client.
pub struct IngestPipeline {
    table: RoutingTable,
    parser: Arc<dyn EmailParser>,
    broker: Arc<dyn BrokerPublisher>,
}

impl IngestPipeline {
    pub fn new(
        table: RoutingTable,
        parser: Arc<dyn EmailParser>,
        broker: Arc<dyn BrokerPublisher>,
    ) -> Self {
        Self {
            table,
            parser,
            broker,
        }
    }

    /// Credential offers are refused unconditionally, before any routing
    /// logic runs.
    pub fn reject_authentication(&self) -> MailgateError {
        MailgateError::AuthenticationRejected
    }

    /// Recipient-acceptance decision point. Resolves the destination queue
    /// for `address` or rejects the recipient.
    pub fn decide_recipient(&self, address: &str) -> Result<Delivery, MailgateError> {
        match resolve_queue(address, &self.table)? {
            RoutingDecision::Accept(queue) => {
                let parsed = parse_address(address)?;
                info!(
                    recipient = %redact_email(address),
                    queue = %queue,
                    "Accepted recipient"
                );
                Ok(Delivery {
                    queue,
                    tags: parsed.tags,
                })
            }
            RoutingDecision::Reject => {
                warn!(recipient = %redact_email(address), "Rejected recipient");
                Err(MailgateError::RecipientRejected(address.to_string()))
            }
        }
    }

    /// Body-received decision point: declare the destination queue, parse
    /// the raw body, attach the recipient's tags, serialize and publish.
    /// Returns the ack token for the protocol-level acknowledgment.
    pub async fn handle_body(
        &self,
        delivery: &Delivery,
        raw_body: &[u8],
    ) -> Result<String, MailgateError> {
        self.broker.assert_queue(&delivery.queue).await?;

        let mut email = self.parser.parse(raw_body).await?;
        email.tags = delivery.tags.clone();

        let payload = serde_json::to_vec(&email)
            .map_err(|e| MailgateError::DeliveryFailure(format!("serialization failed: {}", e)))?;

        self.broker.publish(&delivery.queue, &payload).await?;

        let token = Utc::now().timestamp_millis().to_string();
        info!(
            queue = %delivery.queue,
            token = %token,
            bytes = payload.len(),
            "Message queued"
        );
        Ok(token)
    }

    /// Closes the broker channel and connection. Called on shutdown before
    /// the listener is released.
    pub async fn shutdown(&self) -> Result<(), MailgateError> {
        self.broker.close().await
    }
}
