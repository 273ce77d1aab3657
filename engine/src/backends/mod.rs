//! Built-in backend adapters
//!
//! Concrete implementations of the [`MetricsBackend`](crate::backend::MetricsBackend)
//! contract. Each adapter owns its provider client and implements only the
//! SLI methods its provider can answer.

pub mod elasticsearch;
pub mod memory;
pub mod prometheus;

pub use elasticsearch::ElasticsearchBackend;
pub use memory::MemoryBackend;
pub use prometheus::PrometheusBackend;
