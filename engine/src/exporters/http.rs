//! HTTP webhook exporter
//!
//! POSTs the batch of reports as a JSON array to a configured URL.
//! Delivery failures surface as exporter errors; the engine does not
//! retry.

use async_trait::async_trait;
use tracing::debug;

use super::Exporter;
use crate::error::{ExporterError, ExporterResult};
use crate::report::Report;

/// Exporter delivering reports to an HTTP endpoint
pub struct HttpExporter {
    client: reqwest::Client,
    url: String,
}

impl HttpExporter {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Exporter for HttpExporter {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn export(&self, reports: &[Report]) -> ExporterResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(reports)
            .send()
            .await
            .map_err(|err| ExporterError::Delivery {
                exporter: "http".to_string(),
                reason: err.to_string(),
            })?;

        response
            .error_for_status()
            .map_err(|err| ExporterError::Delivery {
                exporter: "http".to_string(),
                reason: err.to_string(),
            })?;

        debug!(url = %self.url, reports = reports.len(), "reports delivered");
        Ok(())
    }
}
