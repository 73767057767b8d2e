//! Error types for the artifact store

use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// No blob or log exists at the requested location
    NotFound(String),
    /// Team or hash cannot be used as a path segment
    InvalidKey(String),
    /// A log record would break the one-record-per-line layout
    InvalidRecord(String),
    Io(Box<std::io::Error>),
    Encode(Box<serde_json::Error>),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "Not found: {}", what),
            StoreError::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            StoreError::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
            StoreError::Io(err) => write!(f, "IO error: {}", err),
            StoreError::Encode(err) => write!(f, "Encode error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err.as_ref()),
            StoreError::Encode(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Encode(Box::new(err))
    }
}

impl StoreError {
    /// Map an IO error to `NotFound` when the file is missing
    pub(crate) fn from_io(err: std::io::Error, what: impl Into<String>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(what.into())
        } else {
            StoreError::Io(Box::new(err))
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_not_found_error_display() {
        let err = StoreError::NotFound("team-a/abc123".to_string());
        assert_eq!(format!("{}", err), "Not found: team-a/abc123");
    }

    #[test]
    fn test_invalid_key_error_display() {
        let err = StoreError::InvalidKey("hash must not contain '/'".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid key: hash must not contain '/'"
        );
    }

    #[test]
    fn test_from_io_maps_missing_file() {
        let err = StoreError::from_io(io::Error::from(io::ErrorKind::NotFound), "team-a/_meta");
        assert!(err.is_not_found());

        let err = StoreError::from_io(
            io::Error::from(io::ErrorKind::PermissionDenied),
            "team-a/_meta",
        );
        assert!(!err.is_not_found());
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;
        let err = StoreError::from(io::Error::other("disk full"));
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("disk full"));
    }
}
