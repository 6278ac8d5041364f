/// Message handling pipeline
pub mod ingest;

pub use ingest::{Delivery, IngestPipeline};
