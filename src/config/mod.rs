//! Runtime configuration read from the environment (after `dotenvy`).
//! Factor tables have their own loader in `crate::factors::tables`.

pub mod enrichment;
pub mod service;

pub use enrichment::{EnrichMode, EnrichmentConfig};
pub use service::ServiceConfig;
