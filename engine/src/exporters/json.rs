//! JSON-lines file exporter
//!
//! Appends each report as one JSON object per line, suitable for ingestion
//! by log shippers and ad-hoc analysis with standard tooling.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::Exporter;
use crate::error::ExporterResult;
use crate::report::Report;

/// Exporter appending reports to a JSON-lines file
pub struct JsonLinesExporter {
    path: PathBuf,
}

impl JsonLinesExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Exporter for JsonLinesExporter {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn export(&self, reports: &[Report]) -> ExporterResult<()> {
        let mut buffer = String::new();
        for report in reports {
            buffer.push_str(&serde_json::to_string(report)?);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), reports = reports.len(), "reports exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, ErrorBudgetPolicyStep, MeasurementConfig, SloConfig};
    use chrono::{TimeZone, Utc};

    fn sample_report() -> Report {
        let slo = SloConfig {
            service_name: "web".to_string(),
            feature_name: "checkout".to_string(),
            slo_name: "availability".to_string(),
            slo_description: String::new(),
            slo_target: 0.95,
            backend: BackendConfig {
                provider: "memory".to_string(),
                method: "good_bad_ratio".to_string(),
                url: None,
                index: None,
                date_field: None,
                measurement: MeasurementConfig::default(),
            },
            exporters: Vec::new(),
        };
        let step = ErrorBudgetPolicyStep {
            name: "1 hour".to_string(),
            window_seconds: 3600,
            burn_rate_threshold: 1.0,
            alerting_burn_rate_threshold: None,
            message_alert: String::new(),
            message_ok: String::new(),
        };
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        Report::build(&slo, &step, timestamp, 0.9)
    }

    #[tokio::test]
    async fn test_appends_one_line_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.jsonl");
        let exporter = JsonLinesExporter::new(path.clone());

        let report = sample_report();
        exporter.export(&[report.clone()]).await.unwrap();
        exporter.export(&[report.clone(), report]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let parsed: Report = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.service_name, "web");
        assert!((parsed.burn_rate - 2.0).abs() < 1e-9);
    }
}
