/// AMQP broker publisher
use crate::error::MailgateError;
use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

/// Broker contract the pipeline depends on.
///
/// Deliberately narrow: idempotent durable declare, fire-and-forget
/// publish, and an orderly close. The pipeline never sees the wire
/// protocol behind it.
#[async_trait]
pub trait BrokerPublisher: Send + Sync {
    /// Idempotent durable queue declaration; safe for existing queues
    /// declared with matching durability.
    async fn assert_queue(&self, name: &str) -> Result<(), MailgateError>;

    /// Publishes one payload to the named queue. All-or-nothing: a failure
    /// here means nothing was written.
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), MailgateError>;

    /// Closes channel then connection.
    async fn close(&self) -> Result<(), MailgateError>;
}

/// lapin-backed publisher holding the process-wide connection and the one
/// channel reused for every message. lapin channels are internally
/// synchronized, so concurrent session publishes may interleave without
/// extra locking.
pub struct LapinBroker {
    connection: Connection,
    channel: Channel,
}

impl LapinBroker {
    /// Establishes the connection and channel. Failure here is fatal to
    /// startup; the caller must not begin accepting connections without a
    /// usable broker handle.
    pub async fn connect(url: &str) -> Result<Self, MailgateError> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| MailgateError::BrokerUnavailable(e.to_string()))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| MailgateError::BrokerUnavailable(e.to_string()))?;

        info!(url = %url, "Connected to broker");
        Ok(Self { connection, channel })
    }
}

#[async_trait]
impl BrokerPublisher for LapinBroker {
    async fn assert_queue(&self, name: &str) -> Result<(), MailgateError> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| MailgateError::DeliveryFailure(format!("queue declare failed: {}", e)))?;

        debug!(queue = %name, "Declared durable queue");
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), MailgateError> {
        self.channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default(),
            )
            .await
            .map_err(|e| MailgateError::DeliveryFailure(format!("publish failed: {}", e)))?
            .await
            .map_err(|e| MailgateError::DeliveryFailure(format!("publish failed: {}", e)))?;

        debug!(queue = %queue, bytes = payload.len(), "Published message");
        Ok(())
    }

    async fn close(&self) -> Result<(), MailgateError> {
        self.channel
            .close(200, "shutdown")
            .await
            .map_err(|e| MailgateError::DeliveryFailure(format!("channel close failed: {}", e)))?;

        self.connection
            .close(200, "shutdown")
            .await
            .map_err(|e| {
                MailgateError::DeliveryFailure(format!("connection close failed: {}", e))
            })?;

        info!("Broker connection closed");
        Ok(())
    }
}
