//! # Error Types
//!
//! Every failure the fetch pipeline can report. Axis classification and level
//! resolution errors end the processing of one variable; remote read and output
//! errors end the processing of one artifact. The batch driver records both kinds
//! and moves on to the next unit of work.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed source error carried by remote and output failures.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while fetching and writing SubX fields
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unrecognized axis '{axis}' on variable '{variable}'")]
    UnrecognizedAxis { variable: String, axis: String },

    #[error("Axis '{axis}' appears more than once on variable '{variable}'")]
    DuplicateAxis { variable: String, axis: String },

    #[error("Variable '{variable}' has no {role} axis '{axis}'")]
    MissingAxis {
        variable: String,
        axis: &'static str,
        role: &'static str,
    },

    #[error(
        "Variable '{variable}' has {ndims} axes, expected 5 (no pressure level) or 6 (with pressure level)"
    )]
    UnsupportedDimensionCount { variable: String, ndims: usize },

    #[error("Pressure level '{plev}' is not an integer")]
    InvalidLevel { plev: String },

    #[error("Pressure level '{plev}' not found on the P axis (available: {available:?})")]
    LevelNotFound { plev: String, available: Vec<f64> },

    #[error("Index {index} is out of range for axis '{axis}' of length {size}")]
    IndexOutOfRange {
        axis: &'static str,
        index: usize,
        size: usize,
    },

    #[error("Slice of '{variable}' returned {got} values, expected {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        got: usize,
    },

    #[error("Variable '{variable}' not found in {url}")]
    MissingVariable { url: String, variable: String },

    #[error("Missing attribute '{attribute}' on '{parent}'")]
    MissingAttribute { parent: String, attribute: String },

    #[error("Cannot decode time with units '{units}': {reason}")]
    TimeDecode { units: String, reason: String },

    #[error("Remote access failed for {url}: {source}")]
    RemoteAccess {
        url: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Cannot write {}: {source}", path.display())]
    OutputIo {
        path: PathBuf,
        #[source]
        source: BoxedSource,
    },

    #[error("Failed to read configuration {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON configuration: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("Invalid YAML configuration: {0}")]
    ConfigYaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

impl FetchError {
    pub fn remote<U: ToString, E: Into<BoxedSource>>(url: U, source: E) -> Self {
        Self::RemoteAccess {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub fn output<P: Into<PathBuf>, E: Into<BoxedSource>>(path: P, source: E) -> Self {
        Self::OutputIo {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn missing_attribute<P: ToString, A: ToString>(parent: P, attribute: A) -> Self {
        Self::MissingAttribute {
            parent: parent.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn time_decode<U: ToString, R: ToString>(units: U, reason: R) -> Self {
        Self::TimeDecode {
            units: units.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_item() {
        let err = FetchError::UnrecognizedAxis {
            variable: "ua".to_string(),
            axis: "Z".to_string(),
        };
        assert_eq!(err.to_string(), "Unrecognized axis 'Z' on variable 'ua'");

        let err = FetchError::LevelNotFound {
            plev: "700".to_string(),
            available: vec![850.0, 500.0, 200.0],
        };
        assert!(err.to_string().contains("'700'"));
        assert!(err.to_string().contains("850.0"));
    }

    #[test]
    fn test_remote_error_keeps_source() {
        let err = FetchError::remote("http://example/dods", "connection refused");
        assert!(err.to_string().contains("http://example/dods"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
