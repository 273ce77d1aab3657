//! Report sinks
//!
//! An [`Exporter`] consumes finished reports after computation. Exporters
//! are pure consumers: reports are immutable by the time they arrive here.
//! Like backends, exporter kinds are resolved through a static mapping
//! from the configuration's `class` field.

pub mod http;
pub mod json;

pub use http::HttpExporter;
pub use json::JsonLinesExporter;

use async_trait::async_trait;

use crate::config::ExporterConfig;
use crate::error::{ConfigError, ExporterResult, Result};
use crate::report::Report;

/// Contract for exporting a batch of finished reports
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Exporter kind name, for logging
    fn name(&self) -> &'static str;

    /// Deliver the reports to the sink
    async fn export(&self, reports: &[Report]) -> ExporterResult<()>;
}

/// Build an exporter from its configuration
pub fn build(config: &ExporterConfig) -> Result<Box<dyn Exporter>> {
    config.validate()?;
    match config.class.as_str() {
        "json" => {
            // validate() guarantees the path is present
            let path = config.path.clone().ok_or(ConfigError::MissingField {
                field: "exporters.path".to_string(),
            })?;
            Ok(Box::new(JsonLinesExporter::new(path)))
        }
        "http" => {
            let url = config.url.clone().ok_or(ConfigError::MissingField {
                field: "exporters.url".to_string(),
            })?;
            Ok(Box::new(HttpExporter::new(url)))
        }
        other => Err(ConfigError::UnknownExporter {
            name: other.to_string(),
        }
        .into()),
    }
}
