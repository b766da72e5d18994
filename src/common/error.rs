//! Error types for pagesim.
//!
//! A single crate-wide error enum keeps handling consistent: every fallible
//! operation returns [`Result<T>`]. The engine itself is a deterministic
//! pure function of its inputs, so nothing here is retried — an error
//! aborts exactly the run that produced it.

use thiserror::Error;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagesim.
#[derive(Debug, Error)]
pub enum Error {
    /// A run was requested with parameters that can never work: a zero
    /// frame count, an empty frame-count sweep, or a policy parameter
    /// outside its valid range. Raised before any reference is processed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The reference trace failed normalization (timestamps going
    /// backwards, or a mix of timed and untimed references).
    #[error("malformed trace: {0}")]
    MalformedTrace(String),

    /// A policy state machine reached a state its preconditions rule out,
    /// e.g. a victim scan over an empty resident set. Indicates a logic
    /// defect; must propagate rather than be recovered.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),

    /// I/O error from report output. The core engine never produces this.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidConfiguration("frame_count must be > 0".into());
        assert_eq!(
            format!("{}", err),
            "invalid configuration: frame_count must be > 0"
        );

        let err = Error::InternalInvariant("victim scan over empty resident set");
        assert!(format!("{}", err).contains("internal invariant"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
