// Error types shared by the library modules.
// The UI and binary wrap these in `anyhow` where they only need to be shown;
// the dispatcher returns them typed so callers can decide how to render them.

use std::path::PathBuf;

/// Failures talking to the catalog API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection refused, DNS failure, timeout and friends.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status code.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The server answered, but not with JSON.
    #[error("response (HTTP {status}) is not JSON: {body}")]
    MalformedResponse { status: u16, body: String },
}

/// Failures reading an image to embed in a request.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to read image {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image {} has no file extension", .0.display())]
    NoExtension(PathBuf),

    #[error("unsupported image format '{0}'")]
    UnsupportedExtension(String),
}

/// Outcome of `Dispatcher::execute` when no usable response was obtained.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Invalid values found while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("CATALOG_API_TIMEOUT_SECS must be a whole number of seconds, got '{0}'")]
    InvalidTimeout(String),
}
