use thiserror::Error;

/// Errors raised at the session persistence boundary
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session JSON could not be parsed: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Session is missing required section `{0}`")]
    MissingSection(&'static str),
    #[error("Session field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Unsupported session schema version {0}")]
    UnsupportedVersion(u64),
    #[error("Session JSON does not match the schema: {0}")]
    Schema(#[source] serde_json::Error),
    #[error("Session could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("No live data to save: start the camera and wait for landmarks")]
    NoLiveData,
}

/// Errors reported when the capture device cannot be started
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    #[error("Capture failed: {0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid pipeline setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
