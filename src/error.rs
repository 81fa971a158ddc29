use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Failures surfaced by the client itself. A well-formed JSON envelope that
/// contains an `error` key is *not* one of these; it is returned as data so
/// callers can inspect it (see [`crate::remote_error`]).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response, expected JSON: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("unsupported media type for {url}")]
    UnsupportedMedia { url: String },

    #[error("upload for {url} returned no media id")]
    MissingMediaId { url: String },
}
