use thiserror::Error;

use crate::dom::dom_model::NodeId;

/// Faults raised while reading or mutating the page document.
#[derive(Debug, Error)]
pub enum DomError {
    /// The handle does not point into this document
    #[error("node {0:?} does not exist in this document")]
    MissingNode(NodeId),

    /// The handle points at a text or document node
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// A mutation addressed an element id that is not on the page
    #[error("no element with id '{0}'")]
    UnknownTarget(String),
}

#[derive(Debug, Error)]
pub enum JobFillError {
    /// Reading or writing a local file failed
    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// JSON parsing failed (snapshot, profile, mutation script)
    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        source: serde_json::Error,
    },

    /// JSON serialization failed
    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        source: serde_json::Error,
    },

    /// Transport-level HTTP failure talking to the backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API {endpoint} returned {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Base URL or endpoint could not be built
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Dom(#[from] DomError),
}
