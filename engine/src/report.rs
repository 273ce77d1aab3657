//! SLO report entity and error budget arithmetic
//!
//! A [`Report`] is the structured outcome of evaluating one SLO against one
//! error budget policy step at one instant. Reports are immutable once
//! built and are handed to report sinks as plain serializable records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{ErrorBudgetPolicyStep, SloConfig};

/// Compliance report for one (SLO, policy step) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Service the SLO belongs to
    pub service_name: String,

    /// Feature within the service
    pub feature_name: String,

    /// SLO identifier within the feature
    pub slo_name: String,

    /// Human-readable SLO description
    pub slo_description: String,

    /// Name of the policy step this report covers
    pub step_name: String,

    /// Evaluation instant, unix seconds
    pub timestamp: i64,

    /// Evaluation instant, RFC 3339
    pub timestamp_human: String,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Measured SLI. Non-negative; may exceed 1.0 for some distribution
    /// methods, so consumers must not assume a hard upper bound.
    pub sli_measurement: f64,

    /// Goal compliance ratio
    pub slo_target: f64,

    /// `sli_measurement - slo_target`
    pub gap: f64,

    /// Allowed failure ratio: `1 - slo_target`
    pub error_budget_target: f64,

    /// Observed failure ratio: `1 - sli_measurement`
    pub error_budget_measurement: f64,

    /// Share of the budget left. Negative once the budget is exhausted;
    /// never clamped.
    pub error_budget_remaining: f64,

    /// Budget left expressed in minutes of the window; negative when the
    /// budget is exhausted
    pub error_budget_minutes: f64,

    /// Minutes of the window spent out of compliance
    pub error_minutes: f64,

    /// Budget consumption rate relative to the allowed rate
    pub burn_rate: f64,

    /// Burn rate above which this step alerts
    pub burn_rate_threshold: f64,

    /// Optional paging threshold carried from the policy step
    pub alerting_burn_rate_threshold: Option<f64>,

    /// Whether the observed burn rate meets or exceeds the step threshold
    pub alert: bool,

    /// Step message matching the alert state
    pub message: String,
}

impl Report {
    /// Assemble the report for one policy step from a derived SLI value.
    ///
    /// Callers must have rejected `slo_target == 1.0` beforehand; the engine
    /// does so before issuing any backend query.
    pub fn build(
        slo: &SloConfig,
        step: &ErrorBudgetPolicyStep,
        timestamp: DateTime<Utc>,
        sli_measurement: f64,
    ) -> Self {
        let error_budget_target = 1.0 - slo.slo_target;
        let error_budget_measurement = 1.0 - sli_measurement;
        let burn_rate = error_budget_measurement / error_budget_target;
        let error_budget_remaining = 1.0 - burn_rate;
        let window_minutes = step.window_seconds as f64 / 60.0;
        let alert = burn_rate >= step.burn_rate_threshold;

        Report {
            service_name: slo.service_name.clone(),
            feature_name: slo.feature_name.clone(),
            slo_name: slo.slo_name.clone(),
            slo_description: slo.slo_description.clone(),
            step_name: step.name.clone(),
            timestamp: timestamp.timestamp(),
            timestamp_human: timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            window_seconds: step.window_seconds,
            sli_measurement,
            slo_target: slo.slo_target,
            gap: sli_measurement - slo.slo_target,
            error_budget_target,
            error_budget_measurement,
            error_budget_remaining,
            error_budget_minutes: window_minutes * error_budget_target * error_budget_remaining,
            error_minutes: window_minutes * error_budget_measurement,
            burn_rate,
            burn_rate_threshold: step.burn_rate_threshold,
            alerting_burn_rate_threshold: step.alerting_burn_rate_threshold,
            alert,
            message: if alert {
                step.message_alert.clone()
            } else {
                step.message_ok.clone()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, MeasurementConfig};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn slo(target: f64) -> SloConfig {
        SloConfig {
            service_name: "web".to_string(),
            feature_name: "checkout".to_string(),
            slo_name: "availability".to_string(),
            slo_description: String::new(),
            slo_target: target,
            backend: BackendConfig {
                provider: "memory".to_string(),
                method: "good_bad_ratio".to_string(),
                url: None,
                index: None,
                date_field: None,
                measurement: MeasurementConfig::default(),
            },
            exporters: Vec::new(),
        }
    }

    fn step(window_seconds: u64, burn_rate_threshold: f64) -> ErrorBudgetPolicyStep {
        ErrorBudgetPolicyStep {
            name: "test window".to_string(),
            window_seconds,
            burn_rate_threshold,
            alerting_burn_rate_threshold: None,
            message_alert: "over budget".to_string(),
            message_ok: "within budget".to_string(),
        }
    }

    fn eval_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_burn_rate_scenario() {
        // good=90, bad=10 measured elsewhere: sli = 0.9 against target 0.95
        let report = Report::build(&slo(0.95), &step(3600, 1.0), eval_time(), 0.9);

        assert!((report.burn_rate - 2.0).abs() < 1e-9);
        assert!((report.error_budget_remaining - (-1.0)).abs() < 1e-9);
        assert!(report.alert);
        assert_eq!(report.message, "over budget");
        assert!((report.error_minutes - 6.0).abs() < 1e-9);
        // 3 allowed minutes, 6 consumed: -3 minutes of budget left
        assert!((report.error_budget_minutes - (-3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_fully_compliant_window() {
        let report = Report::build(&slo(0.99), &step(3600, 1.0), eval_time(), 1.0);

        assert_eq!(report.burn_rate, 0.0);
        assert_eq!(report.error_budget_remaining, 1.0);
        assert!(!report.alert);
        assert_eq!(report.message, "within budget");
        assert_eq!(report.error_minutes, 0.0);
    }

    #[test]
    fn test_gap_and_identity_fields() {
        let report = Report::build(&slo(0.95), &step(7200, 2.0), eval_time(), 0.97);

        assert_eq!(report.service_name, "web");
        assert_eq!(report.step_name, "test window");
        assert_eq!(report.window_seconds, 7200);
        assert!((report.gap - 0.02).abs() < 1e-9);
        assert_eq!(report.timestamp, eval_time().timestamp());
        assert!(report.timestamp_human.starts_with("2024-01-15T12:00:00"));
    }

    #[test]
    fn test_negative_budget_not_clamped() {
        let report = Report::build(&slo(0.999), &step(3600, 1.0), eval_time(), 0.5);
        assert!(report.error_budget_remaining < -400.0);
        assert!(report.error_budget_minutes < 0.0);
    }

    proptest! {
        #[test]
        fn prop_sli_at_target_burns_at_unit_rate(
            target in 0.001f64..0.999,
            threshold in 0.1f64..10.0,
        ) {
            let report = Report::build(&slo(target), &step(3600, threshold), eval_time(), target);
            prop_assert!((report.burn_rate - 1.0).abs() < 1e-9);
            prop_assert_eq!(report.alert, 1.0 >= threshold);
        }

        #[test]
        fn prop_counts_yield_bounded_sli(good in 0.0f64..1e9, bad in 0.0f64..1e9) {
            prop_assume!(good + bad > 0.0);
            let sli = crate::backend::Measurement::GoodBad { good, bad }.sli_value();
            prop_assert!((0.0..=1.0).contains(&sli));
        }

        #[test]
        fn prop_budget_identity(target in 0.5f64..0.999, sli in 0.0f64..1.0) {
            let report = Report::build(&slo(target), &step(3600, 1.0), eval_time(), sli);
            // remaining budget and burn rate always sum to 1
            prop_assert!((report.error_budget_remaining + report.burn_rate - 1.0).abs() < 1e-9);
        }
    }
}
