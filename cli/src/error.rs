use thiserror::Error;

#[derive(Error, Debug)]
pub enum SloctlError {
    #[error("Engine error: {0}")]
    Engine(#[from] slo_engine::EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Environment variable {name} should be set")]
    MissingEnvVar { name: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("No SLO configs found in {path}")]
    NoConfigsFound { path: String },

    #[error("Invalid evaluation timestamp: {value}")]
    InvalidTimestamp { value: i64 },

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Evaluation failed for {count} SLO config(s)")]
    BatchFailed { count: usize },
}

impl SloctlError {
    pub fn exit_code(&self) -> i32 {
        match self {
            SloctlError::Engine(_) => 1,
            SloctlError::Io(_) => 2,
            SloctlError::Yaml(_) | SloctlError::Json(_) | SloctlError::Csv(_) => 6,
            SloctlError::MissingEnvVar { .. } => 3,
            SloctlError::FileNotFound { .. } | SloctlError::NoConfigsFound { .. } => 5,
            SloctlError::InvalidTimestamp { .. } => 6,
            SloctlError::Metrics(_) => 1,
            SloctlError::BatchFailed { .. } => 8,
        }
    }
}

pub type Result<T> = std::result::Result<T, SloctlError>;

/// Format an error for user-facing display
pub fn format_error(error: &SloctlError) -> String {
    match error {
        SloctlError::MissingEnvVar { name } => {
            format!(
                "Environment variable \"{}\" should be set.\n\nSLO configs may reference ${{VAR}} placeholders; export the variable and retry.",
                name
            )
        }
        SloctlError::NoConfigsFound { path } => {
            format!(
                "No SLO configs found in {}.\n\nExpected a config file or a directory containing slo_*.yaml files.",
                path
            )
        }
        SloctlError::BatchFailed { count } => {
            format!(
                "Evaluation failed for {} SLO config(s). See the log above for per-config details.",
                count
            )
        }
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err = SloctlError::NoConfigsFound {
            path: "/etc/slo".to_string(),
        };
        assert_eq!(err.exit_code(), 5);

        let err = SloctlError::BatchFailed { count: 2 };
        assert_eq!(err.exit_code(), 8);
    }

    #[test]
    fn test_format_missing_env_var() {
        let err = SloctlError::MissingEnvVar {
            name: "PROJECT_ID".to_string(),
        };
        assert!(format_error(&err).contains("PROJECT_ID"));
    }
}
