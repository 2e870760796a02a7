/* coursebook_base provides the foundational error handling, HTTP types and
server loop used across all crates. Keeping them in one leaf crate prevents
circular dependencies between the engine and the binary. */

pub mod error;
pub mod http;
pub mod server;
pub mod tracing;

// Re-export commonly used types for convenience
pub use error::{CoursebookError, CoursebookResult, ErrorKind, ResultExt};
