/// Address routing modules
pub mod address;
pub mod resolver;

pub use address::{ParsedAddress, parse_address};
pub use resolver::{RouteEntry, RoutingDecision, RoutingTable, resolve_queue};
