//! Context-carrying error value for E57 operations

use e57fmt_core::ErrorCode;
use std::panic::Location;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of an E57 operation
///
/// Pairs an [`ErrorCode`] with a context string naming the offending node
/// and values, plus the source location that detected the failure.
#[derive(Error, Debug, Clone)]
#[error("{code}: {context}")]
pub struct Error {
    code: ErrorCode,
    context: String,
    location: &'static Location<'static>,
}

impl Error {
    /// Create an error, recording the caller's location
    #[track_caller]
    pub fn new(code: ErrorCode, context: impl Into<String>) -> Self {
        Self {
            code,
            context: context.into(),
            location: Location::caller(),
        }
    }

    /// Create an error wrapping a failed I/O call
    #[track_caller]
    pub(crate) fn io(code: ErrorCode, context: impl Into<String>, err: std::io::Error) -> Self {
        Self::new(code, format!("{} error={err}", context.into()))
    }

    /// Create an internal consistency error
    #[track_caller]
    pub(crate) fn internal(context: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, context)
    }

    /// Error kind
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Context string: node path and values involved
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Source location that detected the failure
    pub fn source_location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Multi-line diagnostic report
    pub fn report(&self) -> String {
        format!(
            "**** Got an e57 error: {}\n  Debug info:\n    context: {}\n    sourceFile: {}\n    sourceLine: {}\n",
            self.code.message(),
            self.context,
            self.location.file(),
            self.location.line()
        )
    }
}

impl From<ErrorCode> for Error {
    #[track_caller]
    fn from(code: ErrorCode) -> Self {
        Self::new(code, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_code_and_context() {
        let err = Error::new(ErrorCode::SetTwice, "this->pathName=/a");
        assert_eq!(err.code(), ErrorCode::SetTwice);
        assert_eq!(err.context(), "this->pathName=/a");
        assert!(err.to_string().contains("this->pathName=/a"));
        assert!(err.to_string().contains("E57 error 4"));
    }

    #[test]
    fn test_error_records_location() {
        let err = Error::new(ErrorCode::Internal, "x");
        assert!(err.source_location().file().ends_with("error.rs"));
        assert!(err.report().contains("sourceLine"));
    }

    #[test]
    fn test_from_code_via_question_mark() {
        fn fails() -> Result<()> {
            Err::<(), _>(ErrorCode::BadPathName)?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadPathName);
        assert!(err.context().is_empty());
    }
}
