/// Configuration models - loaded once at process start
use crate::constants::{DEFAULT_BROKER_URL, DEFAULT_HOST, DEFAULT_PORT};
use crate::error::MailgateError;
use crate::routing::RoutingTable;

/// Gateway configuration, immutable for the process lifetime
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub broker_url: String,
    pub routes: RoutingTable,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl GatewayConfig {
    /// Loads configuration from the environment:
    ///
    /// - `MAILGATE_HOST` / `MAILGATE_PORT` - listen address (default
    ///   localhost:2525)
    /// - `BROKER_URL` - AMQP broker URL (default amqp://localhost)
    /// - `MAILGATE_ROUTES` - routing table as a flat JSON object; values
    ///   are queue names, `""` for key-named queues, or `null` to block
    pub fn from_env() -> Result<Self, MailgateError> {
        let host = std::env::var("MAILGATE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match std::env::var("MAILGATE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| MailgateError::Config(format!("Invalid MAILGATE_PORT: {}", value)))?,
            Err(_) => DEFAULT_PORT,
        };

        let broker_url =
            std::env::var("BROKER_URL").unwrap_or_else(|_| DEFAULT_BROKER_URL.to_string());

        let routes = match std::env::var("MAILGATE_ROUTES") {
            Ok(json) => RoutingTable::from_json(&json)?,
            Err(_) => RoutingTable::new(),
        };

        Ok(Self {
            server: ServerConfig { host, port },
            broker_url,
            routes,
        })
    }
}
