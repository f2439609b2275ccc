//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream};
use std::io;
use thiserror::Error;
use super::Span;

/// Identifier of a source file registered with the [`DiagnosticReporter`]
pub type FileId = usize;

/// Fatal compile error with source location
///
/// Every variant aborts the compilation run; nothing is recovered locally.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lookup error at {span}: {message}")]
    Lookup { message: String, span: Span, file: FileId },

    #[error("Structural error at {span}: {message}")]
    Structural { message: String, span: Span, file: FileId },

    #[error("Conformance error at {span}: {message}")]
    Conformance { message: String, span: Span, file: FileId },

    #[error("Literal error at {span}: {message}")]
    Literal { message: String, span: Span, file: FileId },

    #[error("Type error at {span}: {message}")]
    Type { message: String, span: Span, file: FileId },

    #[error("Parser error at {span}: {message}")]
    Parse { message: String, span: Span, file: FileId },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        /// Position of the import that requested the file, if any
        origin: Option<(FileId, Span)>,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    pub fn lookup(message: impl Into<String>, span: Span, file: FileId) -> Self {
        Self::Lookup {
            message: message.into(),
            span,
            file,
        }
    }

    pub fn structural(message: impl Into<String>, span: Span, file: FileId) -> Self {
        Self::Structural {
            message: message.into(),
            span,
            file,
        }
    }

    pub fn conformance(message: impl Into<String>, span: Span, file: FileId) -> Self {
        Self::Conformance {
            message: message.into(),
            span,
            file,
        }
    }

    pub fn literal(message: impl Into<String>, span: Span, file: FileId) -> Self {
        Self::Literal {
            message: message.into(),
            span,
            file,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span, file: FileId) -> Self {
        Self::Type {
            message: message.into(),
            span,
            file,
        }
    }

    pub fn parse(message: impl Into<String>, span: Span, file: FileId) -> Self {
        Self::Parse {
            message: message.into(),
            span,
            file,
        }
    }

    pub fn io(path: impl Into<String>, origin: Option<(FileId, Span)>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            origin,
            source,
        }
    }

    /// File and span the error points at
    pub fn location(&self) -> Option<(FileId, Span)> {
        match self {
            Self::Lookup { span, file, .. }
            | Self::Structural { span, file, .. }
            | Self::Conformance { span, file, .. }
            | Self::Literal { span, file, .. }
            | Self::Type { span, file, .. }
            | Self::Parse { span, file, .. } => Some((*file, *span)),
            Self::Io { origin, .. } => *origin,
        }
    }

    /// Human-readable message without the position prefix
    pub fn message(&self) -> String {
        match self {
            Self::Lookup { message, .. }
            | Self::Structural { message, .. }
            | Self::Conformance { message, .. }
            | Self::Literal { message, .. }
            | Self::Type { message, .. }
            | Self::Parse { message, .. } => message.clone(),
            Self::Io { path, source, .. } => format!("cannot read {path}: {source}"),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Lookup { .. } => "Unresolved name",
            Self::Structural { .. } => "Invalid declaration",
            Self::Conformance { .. } => "Interface not satisfied",
            Self::Literal { .. } => "Invalid literal",
            Self::Type { .. } => "Type error",
            Self::Parse { .. } => "Syntax error",
            Self::Io { .. } => "IO error",
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
///
/// Also acts as the source map: every loaded module registers its text here
/// and receives the [`FileId`] its errors refer to.
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> FileId {
        self.files.add(name.into(), source.into())
    }

    pub fn file_name(&self, file_id: FileId) -> Option<&str> {
        self.files.get(file_id).ok().map(|f| f.name().as_str())
    }

    /// 1-based line and column of a byte offset
    pub fn line_column(&self, file_id: FileId, offset: usize) -> Option<(usize, usize)> {
        self.files
            .location(file_id, offset)
            .ok()
            .map(|loc| (loc.line_number, loc.column_number))
    }

    pub fn to_diagnostic(&self, error: &CompileError) -> Diagnostic<FileId> {
        let diagnostic = Diagnostic::error().with_message(error.title());
        match error.location() {
            Some((file_id, span)) => diagnostic.with_labels(vec![
                Label::primary(file_id, span.start..span.end).with_message(error.message()),
            ]),
            None => diagnostic.with_notes(vec![error.message()]),
        }
    }

    pub fn report_error(&self, error: &CompileError) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let diagnostic = self.to_diagnostic(error);
        let _ = term::emit(&mut writer.lock(), &self.config, &self.files, &diagnostic);
    }

    /// Render without colors, for logs and tests
    pub fn render(&self, error: &CompileError) -> String {
        let mut buffer = Buffer::no_color();
        let diagnostic = self.to_diagnostic(error);
        if term::emit(&mut buffer, &self.config, &self.files, &diagnostic).is_err() {
            return error.to_string();
        }
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
