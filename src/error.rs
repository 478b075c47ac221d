//! Error taxonomy for the routing layer.
//!
//! Mirrors the error kinds enumerated in the design: configuration errors are raised
//! synchronously at construction time, discovery/table-metadata failures are absorbed
//! locally, and everything else propagates to the caller for the outer SDK's retry
//! logic to observe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouterError {
    /// Invalid configuration, raised synchronously at client construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No live endpoints available to build a query plan from.
    #[error("no endpoints available for routing")]
    Routing,

    /// GZIP compression failed for an outgoing request body.
    #[error("compression error: {0}")]
    Compression(String),

    /// A node responded, or the transport itself failed, in a way that should be
    /// passed straight through to the caller's retry logic.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_carries_message() {
        let err = RouterError::Configuration("headers whitelist missing Host".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: headers whitelist missing Host"
        );
    }

    #[test]
    fn routing_error_has_stable_message() {
        assert_eq!(
            RouterError::Routing.to_string(),
            "no endpoints available for routing"
        );
    }
}
