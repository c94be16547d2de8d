//! Error types of the audit engine.

use sparesults::QueryResultsParseError;
use std::io;

/// A failure of the SPARQL service or of the transport to it.
///
/// Checks never return it: they turn it into a warning finding and carry on.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// I/O error while talking to the service (connection refused, timeout...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The service returned results that could not be parsed.
    #[error(transparent)]
    Results(#[from] QueryResultsParseError),
    /// The service answered with a results format that is not supported.
    #[error("The SPARQL service returned an unsupported content type: {0}")]
    UnsupportedMediaType(String),
    /// The service answered a SELECT query with something that is not a list of solutions.
    #[error("The SPARQL service did not return solutions for a SELECT query")]
    NotSolutions,
    /// The gateway is not able to apply updates.
    #[error("This gateway does not support updates")]
    UpdateUnsupported,
    /// The service reported an error.
    #[error("{0}")]
    Service(String),
}

impl GatewayError {
    #[cfg(any(test, feature = "http-client"))]
    pub(crate) fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }
}

/// An error raised while writing a report.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
