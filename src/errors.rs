//! Sable error handling.
//!
//! A single error type covers the whole front end. Every error carries the
//! source it was raised against plus a primary span, so callers can render
//! rich diagnostics; duplicate-definition errors additionally carry the span
//! of the first definition.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

use crate::ast::Span;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Source context for error reporting: the logical path label of the input
/// plus its full text.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real source content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable (e.g. the file
    /// could not be read in the first place).
    pub fn fallback(context: &str) -> Self {
        Self {
            name: context.to_string(),
            content: String::new(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting.
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// ERROR TYPE
// ============================================================================

/// The single error type - kind, location, and diagnostic enhancement.
#[derive(Debug)]
pub struct SableError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where it happened.
    pub source_info: SourceInfo,
    /// How to help.
    pub diagnostic_info: DiagnosticInfo,
}

/// All error kinds. Display text is the user-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("syntax error: unexpected {found}, expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("syntax error: {message}")]
    Malformed { message: String },

    #[error("syntax error: operator `{operator}` is not associative")]
    NonAssociative { operator: String },

    #[error("syntax error: unterminated {delimiter}")]
    Unterminated { delimiter: String },

    #[error("syntax error: invalid integer literal '{value}'")]
    InvalidInteger { value: String },

    #[error("duplicate attribute '{name}'")]
    DuplicateAttribute { name: String, original: SourceSpan },

    #[error("duplicate formal argument '{name}'")]
    DuplicateFormal { name: String, original: SourceSpan },

    #[error("too many levels of symbolic links while resolving '{path}'")]
    SymlinkLoop { path: String },

    #[error("cannot {operation} '{path}': {message}")]
    Filesystem {
        operation: String,
        path: String,
        message: String,
    },
}

/// Source information attached to an error.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

/// Diagnostic enhancement data.
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Io,
}

impl ErrorKind {
    /// Get the error category for test assertions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnexpectedToken { .. }
            | Self::Malformed { .. }
            | Self::NonAssociative { .. }
            | Self::Unterminated { .. }
            | Self::InvalidInteger { .. }
            | Self::DuplicateAttribute { .. }
            | Self::DuplicateFormal { .. } => ErrorCategory::Parse,

            Self::SymlinkLoop { .. } | Self::Filesystem { .. } => ErrorCategory::Io,
        }
    }

    /// Get the error code suffix for diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnexpectedToken { .. } => "unexpected_token",
            Self::Malformed { .. } => "malformed",
            Self::NonAssociative { .. } => "non_associative",
            Self::Unterminated { .. } => "unterminated",
            Self::InvalidInteger { .. } => "invalid_integer",
            Self::DuplicateAttribute { .. } => "duplicate_attribute",
            Self::DuplicateFormal { .. } => "duplicate_formal",
            Self::SymlinkLoop { .. } => "symlink_loop",
            Self::Filesystem { .. } => "filesystem",
        }
    }
}

impl SableError {
    /// The logical path label of the source this error was raised against.
    pub fn path(&self) -> &str {
        self.source_info.source.name()
    }

    /// 1-based line of the primary span.
    pub fn line(&self) -> usize {
        self.position().0
    }

    /// 1-based column of the primary span.
    pub fn column(&self) -> usize {
        self.position().1
    }

    fn position(&self) -> (usize, usize) {
        let offset = self.source_info.primary_span.offset();
        offset_to_position(self.source_info.source.inner(), offset)
    }

    /// The span of the earlier conflicting definition, for duplicate errors.
    pub fn original_span(&self) -> Option<SourceSpan> {
        match &self.kind {
            ErrorKind::DuplicateAttribute { original, .. }
            | ErrorKind::DuplicateFormal { original, .. } => Some(*original),
            _ => None,
        }
    }

    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::UnexpectedToken { .. } => "unexpected token".into(),
            ErrorKind::Malformed { .. } => "malformed syntax".into(),
            ErrorKind::NonAssociative { .. } => "operator cannot be chained".into(),
            ErrorKind::Unterminated { .. } => "opened here".into(),
            ErrorKind::InvalidInteger { .. } => "invalid literal".into(),
            ErrorKind::DuplicateAttribute { .. } => "defined again here".into(),
            ErrorKind::DuplicateFormal { .. } => "defined again here".into(),
            ErrorKind::SymlinkLoop { .. } => "symlink loop".into(),
            ErrorKind::Filesystem { .. } => "filesystem failure".into(),
        }
    }
}

/// Computes a 1-based (line, column) pair from a byte offset. Columns count
/// characters, not bytes, so multi-byte UTF-8 does not inflate them.
fn offset_to_position(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

impl std::error::Error for SableError {}

impl fmt::Display for SableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = self.position();
        write!(
            f,
            "{}, at {}:{}:{}",
            self.kind,
            self.path(),
            line,
            column
        )
    }
}

impl Diagnostic for SableError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let mut labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        if let Some(original) = self.original_span() {
            labels.push(LabeledSpan::new_with_span(
                Some("first defined here".into()),
                original,
            ));
        }
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

// ============================================================================
// ERROR CREATION
// ============================================================================

/// Context-aware error creation - each phase knows how to create its errors.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> SableError;

    fn unexpected_token(&self, expected: &str, found: &str, span: SourceSpan) -> SableError {
        self.report(
            ErrorKind::UnexpectedToken {
                expected: expected.into(),
                found: found.into(),
            },
            span,
        )
    }

    fn malformed(&self, message: &str, span: SourceSpan) -> SableError {
        self.report(
            ErrorKind::Malformed {
                message: message.into(),
            },
            span,
        )
    }

    fn unterminated(&self, delimiter: &str, span: SourceSpan) -> SableError {
        self.report(
            ErrorKind::Unterminated {
                delimiter: delimiter.into(),
            },
            span,
        )
    }
}

/// Parse-phase error construction over a [`SourceContext`].
impl ErrorReporting for SourceContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> SableError {
        let error_code = format!("sable::parse::{}", kind.code_suffix());
        let help = match &kind {
            ErrorKind::DuplicateAttribute { name, .. } => Some(format!(
                "an attribute may be defined once per set; remove or rename one `{}`",
                name
            )),
            ErrorKind::DuplicateFormal { name, .. } => Some(format!(
                "a formal argument may be listed once per lambda; remove or rename one `{}`",
                name
            )),
            _ => None,
        };

        SableError {
            kind,
            source_info: SourceInfo {
                source: self.to_named_source(),
                primary_span: span,
            },
            diagnostic_info: DiagnosticInfo { help, error_code },
        }
    }
}

/// Standalone constructor for filesystem errors raised by the entry driver,
/// which has no parsed source to attach spans to.
pub fn io_error(kind: ErrorKind, path_label: &str) -> SableError {
    let error_code = format!("sable::io::{}", kind.code_suffix());
    let source = SourceContext::fallback(path_label).to_named_source();

    SableError {
        kind,
        source_info: SourceInfo {
            source,
            primary_span: (0..0).into(),
        },
        diagnostic_info: DiagnosticInfo {
            help: None,
            error_code,
        },
    }
}

/// Converts an AST byte span to a miette SourceSpan.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

/// Prints a SableError with full miette diagnostics.
///
/// Use this for user-facing error display in CLI contexts.
pub fn print_error(error: SableError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_one_based() {
        let ctx = SourceContext::new("test.sbl", "a\nbc\ndef");
        let err = ctx.malformed("boom", (5..6).into());
        assert_eq!(err.line(), 3);
        assert_eq!(err.column(), 1);
        assert_eq!(err.path(), "test.sbl");
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        // `é` and `λ` are two bytes each; the column must not count them
        // double.
        let ctx = SourceContext::new("test.sbl", "aé\nλλx");
        let err = ctx.malformed("boom", (8..9).into());
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 3);
    }

    #[test]
    fn duplicate_errors_expose_both_spans() {
        let ctx = SourceContext::new("test.sbl", "{ a = 1; a = 2; }");
        let err = ctx.report(
            ErrorKind::DuplicateAttribute {
                name: "a".into(),
                original: (2..3).into(),
            },
            (9..10).into(),
        );
        assert_eq!(err.original_span(), Some((2..3).into()));
        assert_eq!(err.labels().map(|l| l.count()), Some(2));
        assert!(err.help().is_some(), "duplicate errors carry a hint");
    }
}
