use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup errors. Nothing is served while one of these is pending.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration value: set {0}")]
    Missing(&'static str),

    #[error("Invalid config file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Per-request errors. The session stays usable after any of these.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Flow request failed with status {status}: {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode response as JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected response structure")]
    UnexpectedStructure,

    #[error("Missing field `{0}` in response")]
    MissingField(&'static str),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type FlowResult = Result<String, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_structure_message() {
        assert_eq!(
            FlowError::UnexpectedStructure.to_string(),
            "Unexpected response structure"
        );
    }

    #[test]
    fn test_http_error_mentions_status() {
        let err = FlowError::Http {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "down".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("down"));
    }

    #[test]
    fn test_missing_config_names_variable() {
        let msg = ConfigError::Missing("LANGFLOW_FLOW_ID").to_string();
        assert!(msg.contains("LANGFLOW_FLOW_ID"));
    }
}
