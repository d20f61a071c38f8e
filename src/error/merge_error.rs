//! Merge-engine error types.

use super::GatewayError;
use thiserror::Error;

/// Errors raised while resolving and substituting template tokens.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Missing token map for tokenized template")]
    MissingTokenMap,
    #[error("Fetch error for domain {domain}: {source}")]
    FetchError {
        domain: String,
        #[source]
        source: GatewayError,
    },
    #[error("Cannot resolve {domain} tokens: missing {what}")]
    MissingContext {
        domain: &'static str,
        what: &'static str,
    },
}

impl MergeError {
    pub(crate) fn fetch(domain: impl Into<String>, source: GatewayError) -> Self {
        MergeError::FetchError {
            domain: domain.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_error_display() {
        assert_eq!(
            MergeError::MissingTokenMap.to_string(),
            "Missing token map for tokenized template"
        );
        assert_eq!(
            MergeError::fetch("RCD", GatewayError::new("timeout")).to_string(),
            "Fetch error for domain RCD: timeout"
        );
        assert_eq!(
            MergeError::MissingContext {
                domain: "USR",
                what: "user id"
            }
            .to_string(),
            "Cannot resolve USR tokens: missing user id"
        );
    }
}
