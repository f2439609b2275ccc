//! Common infrastructure shared across the analysis passes

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter, FileId};
pub use span::Span;
