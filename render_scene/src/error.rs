//! Error types for the Prism render scene
//!
//! Per-frame queries never fail: unready assets and unknown handles produce
//! empty results. Errors only surface from scene construction and from
//! encoding/decoding persisted state.

use std::fmt;

/// Result type for render scene operations
pub type Result<T> = std::result::Result<T, Error>;

/// Render scene errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid resource (model, material, persisted record, ...)
    InvalidResource(String),

    /// JSON encode/decode failure
    Serialization(String),

    /// Persisted state written by an unknown (newer) version
    UnsupportedVersion(u32),

    /// Initialization failed (worker pool, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::UnsupportedVersion(version) => {
                write!(f, "Unsupported scene version: {}", version)
            }
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Log an error and build an `Error::InvalidResource` from the same message
///
/// ```ignore
/// return Err(prism_err!("prism::RenderScene", "Unknown emitter {}", entity.0));
/// ```
#[macro_export]
macro_rules! prism_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::prism_error!($source, "{}", message);
        $crate::error::Error::InvalidResource(message)
    }};
}

/// Log an error and return it from the enclosing function
#[macro_export]
macro_rules! prism_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::prism_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
