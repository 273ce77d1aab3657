//! Output rendering for computed reports

use console::style;
use slo_engine::compute::{BatchEntry, BatchOutcome};
use slo_engine::Report;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
    quiet: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool, quiet: bool) -> Self {
        Self {
            format,
            colored,
            quiet,
        }
    }

    /// Render a batch of reports in the selected format
    pub fn print_reports(&self, reports: &[Report]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(reports)?);
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(reports)?);
            }
            OutputFormat::Csv => {
                let mut writer = csv::Writer::from_writer(std::io::stdout());
                for report in reports {
                    writer.serialize(report)?;
                }
                writer.flush()?;
            }
            OutputFormat::Table => {
                self.print_report_table(reports);
            }
        }
        Ok(())
    }

    fn print_report_table(&self, reports: &[Report]) {
        if reports.is_empty() {
            println!("No reports produced.");
            return;
        }

        println!(
            "{:<40} {:<12} {:>10} {:>8} {:>8} {:>10} {:>7}",
            "SLO", "STEP", "WINDOW", "SLI", "TARGET", "BURN RATE", "ALERT"
        );
        for report in reports {
            let slo = format!(
                "{}/{}/{}",
                report.service_name, report.feature_name, report.slo_name
            );
            let alert = if report.alert { "ALERT" } else { "ok" };
            let alert = if self.colored {
                if report.alert {
                    style(alert).red().bold().to_string()
                } else {
                    style(alert).green().to_string()
                }
            } else {
                alert.to_string()
            };
            println!(
                "{:<40} {:<12} {:>9}s {:>8.4} {:>8.4} {:>10.2} {:>7}",
                slo,
                report.step_name,
                report.window_seconds,
                report.sli_measurement,
                report.slo_target,
                report.burn_rate,
                alert
            );
        }
    }

    /// Summarize failed configs and failed steps on stderr
    pub fn print_failures(&self, outcome: &BatchOutcome) {
        for entry in &outcome.entries {
            match &entry.outcome {
                Err(err) => {
                    eprintln!("{}: {}", self.error_label(&entry.slo), err);
                }
                Ok(evaluation) => {
                    for failure in &evaluation.failures {
                        eprintln!(
                            "{}: step \"{}\" ({}s): {}",
                            self.error_label(&entry.slo),
                            failure.step_name,
                            failure.window_seconds,
                            failure.error
                        );
                    }
                }
            }
        }
    }

    /// One line per config: evaluated, partially evaluated, or failed
    pub fn print_batch_summary(&self, outcome: &BatchOutcome) {
        if self.quiet {
            return;
        }
        for entry in &outcome.entries {
            let status = Self::entry_status(entry);
            let status = if self.colored {
                match status {
                    "ok" => style(status).green().to_string(),
                    "partial" => style(status).yellow().to_string(),
                    _ => style(status).red().bold().to_string(),
                }
            } else {
                status.to_string()
            };
            println!("{:<40} {}", entry.slo, status);
        }
    }

    /// One line per config after a delete pass
    pub fn print_delete_outcome(&self, slo: &str, deleted: usize, missing: usize) {
        if self.quiet {
            return;
        }
        println!(
            "{:<40} deleted {} window(s), {} already absent",
            slo, deleted, missing
        );
    }

    fn entry_status(entry: &BatchEntry) -> &'static str {
        match &entry.outcome {
            Ok(evaluation) if evaluation.is_complete() => "ok",
            Ok(_) => "partial",
            Err(_) => "failed",
        }
    }

    fn error_label(&self, slo: &str) -> String {
        if self.colored {
            format!("{} {}", style("error").red().bold(), slo)
        } else {
            format!("error {}", slo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("TABLE").unwrap(), OutputFormat::Table);
        assert!(OutputFormat::from_str("xml").is_err());
    }
}
