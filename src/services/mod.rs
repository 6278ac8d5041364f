/// External service clients
pub mod broker;

pub use broker::{BrokerPublisher, LapinBroker};
