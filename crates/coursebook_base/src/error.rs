use std::error::Error as StdError;
use std::fmt;

/// Error variants that can occur in coursebook operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// The request violated the declared interface schema
    BadRequest { message: String },

    /// A record id did not have the expected format
    InvalidIdentifier { id: String },

    /// No record with the given id exists in the collection
    NotFound { resource: String, id: String },

    /// The response violated the declared interface schema (a server-side bug)
    ResponseContract { message: String },

    /// The document store failed to complete an operation
    StorageUnavailable { message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

/* Error wraps ErrorKind with a stack of context strings. Callers pattern
match on ErrorKind for specific handling; context is only for display. */

/// Error type wrapping ErrorKind with optional context.
/// Implements the standard Error trait and supports context attachment.
#[derive(Debug)]
pub struct CoursebookError {
    kind: ErrorKind,
    context: Vec<String>,
}

impl CoursebookError {
    /// Creates a new error from an ErrorKind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
        }
    }

    /// Creates a catch-all error from a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates a request schema violation error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest {
            message: message.into(),
        })
    }

    /// Creates a malformed identifier error.
    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidIdentifier { id: id.into() })
    }

    /// Creates a missing record error.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound {
            resource: resource.into(),
            id: id.into(),
        })
    }

    /// Creates a response schema violation error.
    pub fn response_contract(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResponseContract {
            message: message.into(),
        })
    }

    /// Creates a store failure error.
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageUnavailable {
            message: message.into(),
        })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    /// Useful to avoid expensive string construction for successful paths.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    /// Allows pattern matching on specific error variants.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Whether this error is an expected outcome rather than a failure.
    /// NotFound is a normal result of addressing a missing record and must
    /// not be logged as an error.
    pub fn is_expected(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound { .. })
    }
}

impl From<ErrorKind> for CoursebookError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for CoursebookError {}

impl fmt::Display for CoursebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display context first if present
        for (i, ctx) in self.context.iter().enumerate() {
            if i == 0 {
                write!(f, "{}", ctx)?;
            } else {
                write!(f, ": {}", ctx)?;
            }
        }

        // Add a separator if we have context
        if !self.context.is_empty() {
            write!(f, ": ")?;
        }

        // Display the underlying error kind
        match &self.kind {
            ErrorKind::BadRequest { message } => {
                write!(f, "Bad request: {}", message)
            }
            ErrorKind::InvalidIdentifier { id } => {
                write!(f, "Invalid record id: {}", id)
            }
            ErrorKind::NotFound { resource, id } => {
                write!(f, "No {} record with id {}", resource, id)
            }
            ErrorKind::ResponseContract { message } => {
                write!(f, "Response violates interface schema: {}", message)
            }
            ErrorKind::StorageUnavailable { message } => {
                write!(f, "Document store unavailable: {}", message)
            }
            ErrorKind::Message { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

/* Boxing the error reduces the size of the result type, making it more
efficient to return in the common case. */

/// Standard result type for coursebook operations.
pub type CoursebookResult<T> = std::result::Result<T, Box<CoursebookError>>;

/// Extension trait for attaching context to Results.
/// Provides ergonomic error context attachment during error propagation.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    /// Eager evaluation: context is evaluated immediately.
    fn context(self, context: impl Into<String>) -> CoursebookResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    /// Prefer this to avoid expensive string formatting in the success path.
    fn with_context<F>(self, f: F) -> CoursebookResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for CoursebookResult<T> {
    fn context(self, context: impl Into<String>) -> CoursebookResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> CoursebookResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn test_error_from_message() {
        let error = CoursebookError::message("something went wrong");

        match error.kind() {
            ErrorKind::Message { message } => {
                assert_eq!(message, "something went wrong");
            }
            _ => panic!("Expected Message variant"),
        }
    }

    #[test]
    fn test_error_from_kind() {
        let kind = ErrorKind::InvalidIdentifier {
            id: "abc".to_string(),
        };
        let error: CoursebookError = kind.into();
        match error.kind() {
            ErrorKind::InvalidIdentifier { id } => {
                assert_eq!(id, "abc");
            }
            _ => panic!("Expected InvalidIdentifier variant"),
        }
    }

    #[test]
    fn test_error_context_attachment() {
        let error = CoursebookError::message("original error")
            .context("first context")
            .context("second context");

        assert_eq!(error.context.len(), 2);
        assert_eq!(error.context[0], "first context");
        assert_eq!(error.context[1], "second context");
    }

    #[test]
    fn test_error_with_context_lazy_evaluation() {
        let mut called = false;
        let error = CoursebookError::message("error").with_context(|| {
            called = true;
            "lazy context".to_string()
        });

        assert!(called);
        assert_eq!(error.context[0], "lazy context");
    }

    #[test]
    fn test_error_display_message_only() {
        let error = CoursebookError::message("test message");
        expect!["test message"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_error_display_with_context() {
        let error = CoursebookError::message("test message").context("operation failed");
        expect!["operation failed: test message"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = CoursebookError::message("root error")
            .context("first")
            .context("second")
            .context("third");
        expect!["first: second: third: root error"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_error_display_not_found() {
        let error = CoursebookError::not_found("course", "6655443322110000aabbccdd");
        expect!["No course record with id 6655443322110000aabbccdd"]
            .assert_eq(&error.to_string());
    }

    #[test]
    fn test_error_display_invalid_identifier() {
        let error = CoursebookError::invalid_identifier("not-a-hex-id");
        expect!["Invalid record id: not-a-hex-id"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_error_display_bad_request() {
        let error = CoursebookError::bad_request("field `date` must be a string");
        expect!["Bad request: field `date` must be a string"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_error_display_response_contract() {
        let error = CoursebookError::response_contract("201 response is missing a body");
        expect!["Response violates interface schema: 201 response is missing a body"]
            .assert_eq(&error.to_string());
    }

    #[test]
    fn test_error_display_storage_unavailable() {
        let error = CoursebookError::storage_unavailable("connection refused");
        expect!["Document store unavailable: connection refused"].assert_eq(&error.to_string());
    }

    #[test]
    fn test_not_found_is_expected() {
        assert!(CoursebookError::not_found("review", "x").is_expected());
        assert!(!CoursebookError::bad_request("nope").is_expected());
        assert!(!CoursebookError::message("boom").is_expected());
    }

    #[test]
    fn test_result_ext_context_success() {
        let result: CoursebookResult<i32> = Ok(42);
        let final_result = result.context("operation failed");
        assert_eq!(final_result.unwrap(), 42);
    }

    #[test]
    fn test_result_ext_context_error() {
        let result: CoursebookResult<i32> = Err(Box::new(CoursebookError::message("original")));
        let final_result = result.context("operation failed");
        assert!(final_result.is_err());
        let err = final_result.unwrap_err();
        assert_eq!(err.to_string(), "operation failed: original");
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: CoursebookResult<i32> = Err(Box::new(CoursebookError::message("root")));
        let final_result = result
            .context("step 1")
            .context("step 2")
            .with_context(|| "step 3".to_string());
        assert!(final_result.is_err());
        let err = final_result.unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: step 3: root");
    }
}
