//! Error types for lsp-nav-source.
//!
//! This module defines the error types used throughout the crate,
//! organized by subsystem: the concrete LSP client, the gather pipeline,
//! and the crate-wide [`Error`].

use std::fmt;

use thiserror::Error;

/// Errors related to LSP client operations.
#[derive(Debug, Error)]
pub enum LspError {
    /// The language server process failed to start.
    #[error("failed to start language server: {0}")]
    ServerStartFailed(String),

    /// Failed to initialize the language server.
    #[error("language server initialization failed: {0}")]
    InitializationFailed(String),

    /// A request to the language server timed out.
    #[error("language server request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Failed to send a request to the language server.
    #[error("failed to send request to language server: {0}")]
    RequestFailed(String),

    /// Failed to parse the params or response of a request.
    #[error("failed to parse language server payload: {0}")]
    ParseError(String),

    /// Invalid position in document.
    #[error("invalid position: line {line}, column {column}")]
    InvalidPosition {
        /// The line number.
        line: u32,
        /// The column number.
        column: u32,
    },

    /// Document not found or not addressable.
    #[error("document not found: {0}")]
    DocumentNotFound(String),
}

/// Reason code attached to every terminal condition of a gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The configured method tag is not a known navigation method.
    ConfigurationError,
    /// No attached server supports the method, or no server is attached.
    CapabilityAbsent,
    /// The server answered without usable data.
    EmptyResult,
    /// The transport itself failed.
    TransportFailure,
}

impl Reason {
    /// Stable identifier used as the `reason` field of log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::ConfigurationError => "configuration_error",
            Reason::CapabilityAbsent => "capability_absent",
            Reason::EmptyResult => "empty_result",
            Reason::TransportFailure => "transport_failure",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal conditions of a gather.
///
/// None of these reach the consumer of [`crate::source::Source::gather`]:
/// they close the stream without a batch and are reported through
/// [`GatherError::log`].
#[derive(Debug, Error)]
pub enum GatherError {
    /// The method tag is not one of the selectable navigation methods.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// The attached servers all declined the method.
    #[error("{0} is not supported by any of the servers")]
    Unsupported(&'static str),

    /// Capability negotiation found no server for the buffer.
    #[error("No server attached")]
    NoServer,

    /// The server answered with nothing usable.
    #[error("empty result")]
    EmptyResult,

    /// The buffer or cursor could not be turned into protocol identifiers.
    #[error("identity resolution failed: {0}")]
    Identity(#[source] LspError),

    /// The transport failed to deliver the request.
    #[error("transport failed: {0}")]
    Transport(#[source] LspError),
}

impl GatherError {
    /// Maps the condition to its reason code.
    pub fn reason(&self) -> Reason {
        match self {
            GatherError::UnknownMethod(_) => Reason::ConfigurationError,
            GatherError::Unsupported(_) | GatherError::NoServer => Reason::CapabilityAbsent,
            GatherError::EmptyResult | GatherError::Identity(_) => Reason::EmptyResult,
            GatherError::Transport(_) => Reason::TransportFailure,
        }
    }

    /// Emits the diagnostic event for this condition.
    ///
    /// Empty results are silent.
    pub fn log(&self, method: &str) {
        let reason = self.reason();
        match self {
            GatherError::UnknownMethod(_) => {
                tracing::warn!(method, reason = %reason, "{self}");
            }
            GatherError::Unsupported(_) | GatherError::NoServer => {
                tracing::info!(method, reason = %reason, "{self}");
            }
            GatherError::Identity(_) => {
                tracing::debug!(method, reason = %reason, "{self}");
            }
            GatherError::Transport(_) => {
                tracing::warn!(method, reason = %reason, "{self}");
            }
            GatherError::EmptyResult => {}
        }
    }
}

/// A unified error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// LSP-related error.
    #[error("LSP error: {0}")]
    Lsp(#[from] LspError),

    /// Gather pipeline termination.
    #[error("gather error: {0}")]
    Gather(#[from] GatherError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for lsp-nav-source operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsp_error_display() {
        let err = LspError::ServerStartFailed("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "failed to start language server: connection refused"
        );
    }

    #[test]
    fn test_gather_error_messages() {
        assert_eq!(
            GatherError::UnknownMethod("textDocument/bogus".to_string()).to_string(),
            "Unknown method: textDocument/bogus"
        );
        assert_eq!(
            GatherError::Unsupported("textDocument/references").to_string(),
            "textDocument/references is not supported by any of the servers"
        );
        assert_eq!(GatherError::NoServer.to_string(), "No server attached");
    }

    #[test]
    fn test_capability_absent_shares_reason() {
        assert_eq!(
            GatherError::Unsupported("workspace/symbol").reason(),
            Reason::CapabilityAbsent
        );
        assert_eq!(GatherError::NoServer.reason(), Reason::CapabilityAbsent);
        assert_eq!(GatherError::EmptyResult.reason(), Reason::EmptyResult);
        assert_eq!(Reason::ConfigurationError.to_string(), "configuration_error");
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = GatherError::NoServer.into();
        assert!(matches!(err, Error::Gather(GatherError::NoServer)));
    }
}
