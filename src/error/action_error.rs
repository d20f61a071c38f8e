//! Dispatch-pipeline error types.

use super::{GatewayError, MergeError};
use crate::eval::EvalError;
use thiserror::Error;

/// Errors raised while loading, evaluating, and dispatching actions.
///
/// Configuration-shaped variants (`ConfigError`, `ParseError`,
/// `UnsupportedOperation`) indicate metadata bugs and are raised before any
/// side effect. Gateway failures are recoverable at dispatch time through an
/// `error` continuation.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Action parse error: {0}")]
    ParseError(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("No records selected")]
    NoRecordSelected,
    #[error("Too many records selected: {count} selected, limit is {max}")]
    TooManyRecords { count: usize, max: usize },
    #[error("Action chain exceeded {0} steps")]
    ChainLimitExceeded(usize),
    #[error("An action chain is already in flight")]
    ChainInFlight,
    #[error("Condition error: {0}")]
    ConditionError(String),
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),
    #[error("Merge error: {0}")]
    MergeError(#[from] MergeError),
}

impl From<EvalError> for ActionError {
    fn from(e: EvalError) -> Self {
        ActionError::ConditionError(e.to_string())
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(e: serde_json::Error) -> Self {
        ActionError::ParseError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        assert_eq!(
            ActionError::ConfigError("missing url".into()).to_string(),
            "Configuration error: missing url"
        );
        assert_eq!(
            ActionError::ParseError("bad json".into()).to_string(),
            "Action parse error: bad json"
        );
        assert_eq!(
            ActionError::UnsupportedOperation("upsert".into()).to_string(),
            "Unsupported operation: upsert"
        );
        assert_eq!(
            ActionError::NoRecordSelected.to_string(),
            "No records selected"
        );
        assert_eq!(
            ActionError::TooManyRecords { count: 12, max: 10 }.to_string(),
            "Too many records selected: 12 selected, limit is 10"
        );
        assert_eq!(
            ActionError::ChainLimitExceeded(64).to_string(),
            "Action chain exceeded 64 steps"
        );
        assert_eq!(
            ActionError::ChainInFlight.to_string(),
            "An action chain is already in flight"
        );
    }

    #[test]
    fn test_action_error_from_gateway_error() {
        let err: ActionError = GatewayError::new("down").into();
        assert!(matches!(err, ActionError::GatewayError(_)));
        assert_eq!(err.to_string(), "Gateway error: down");
    }

    #[test]
    fn test_action_error_from_merge_error() {
        let err: ActionError = MergeError::MissingTokenMap.into();
        assert!(matches!(err, ActionError::MergeError(_)));
    }
}
