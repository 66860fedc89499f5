//! Recursive-descent parsers for the cgram grammar.
//!
//! Four parsers build on the `cgram-scan` primitives, leaves first: types,
//! declarators, expressions/operators, and statements/scopes. Every parse
//! operation returns `Result<Option<T>, SyntaxError>`: `Ok(Some(..))` when
//! the construct was parsed, `Ok(None)` when it was simply absent so the
//! caller may try another grammar rule, and `Err(..)` once a committed
//! interpretation failed at a definite location.
//!
//! Scope parsing is the one place with local recovery: a malformed statement
//! whose boundary can still be established is recorded as a [`Diagnostic`]
//! and parsing resumes at the next statement; boundary-destroying failures
//! surface as a fatal [`ParseError`].
//!
//! ```
//! let (scope, diagnostics) = cgram_parser::parse_source("int x = 5;").unwrap();
//! assert!(diagnostics.is_empty());
//! assert_eq!(scope.to_source(), "int x = 5;\n");
//! ```

use std::ops::Range;

use cgram_ast::Scope;
use cgram_scan::{Span, SyntaxError};
use miette::SourceSpan;
use thiserror::Error;

mod expr;
mod stmt;
mod ty;
mod var;

pub use expr::{
    parse_left_expression, parse_operator, parse_right_expression, parse_type_expression,
};
pub use stmt::parse_scope;
pub use ty::parse_type;
pub use var::parse_variable;

/// A recoverable statement-level failure recorded during scope parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Range<usize>,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn new(at: Span<'_>, message: impl Into<String>) -> Self {
        Self {
            location: at.range(),
            message: message.into(),
        }
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(err: SyntaxError) -> Self {
        Self {
            location: err.location,
            message: err.message,
        }
    }
}

/// A fatal parse failure, carrying the source buffer so reports can label
/// the offending location.
#[derive(Debug, Error, miette::Diagnostic)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    #[source_code]
    pub source_code: String,
    #[label("here")]
    pub span: SourceSpan,
}

impl ParseError {
    fn new(source: &str, err: SyntaxError) -> Self {
        let len = err.location.end.saturating_sub(err.location.start);
        Self {
            message: err.message,
            source_code: source.to_string(),
            span: (err.location.start, len).into(),
        }
    }
}

/// Parse a whole buffer as a translation unit: an ordered statement list
/// plus the diagnostics recovered along the way.
pub fn parse_source(source: &str) -> Result<(Scope, Vec<Diagnostic>), ParseError> {
    let mut diagnostics = Vec::new();
    match stmt::parse_scope(Span::new(source), &mut diagnostics) {
        Ok(scope) => Ok((scope, diagnostics)),
        Err(err) => Err(ParseError::new(source, err)),
    }
}
