//! Unified error type for the CIRA crates.
//!
//! Loaders fail fast with a single diagnostic; solver outcomes are never
//! errors. `Unrepairable` is a legitimate result and is reported through
//! [`crate::RepairTag`], not through this type.

use thiserror::Error;

/// Error type shared by the loaders, the fault model and the CLI.
#[derive(Error, Debug)]
pub enum CiraError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported container format for an input file
    #[error("Input format error: {0}")]
    InputFormat(String),

    /// Malformed record inside a supported container
    #[error("Parse error: {0}")]
    Parse(String),

    /// Fault-model or sweep parameter out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A route row names a bump that is not in the bump map
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for Results using [`CiraError`].
pub type CiraResult<T> = Result<T, CiraError>;

impl From<anyhow::Error> for CiraError {
    fn from(err: anyhow::Error) -> Self {
        CiraError::Other(err.to_string())
    }
}

impl From<String> for CiraError {
    fn from(s: String) -> Self {
        CiraError::Other(s)
    }
}

impl From<&str> for CiraError {
    fn from(s: &str) -> Self {
        CiraError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CiraError::InvalidParameter("Shorted_Bumps_Number must be >= 1".into());
        assert!(err.to_string().contains("Invalid parameter"));
        assert!(err.to_string().contains("Shorted_Bumps_Number"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CiraError = io_err.into();
        assert!(matches!(err, CiraError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> CiraResult<()> {
            Err(CiraError::MissingReference("rxdata9_phy".into()))
        }

        fn outer() -> CiraResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
