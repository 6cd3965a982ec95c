//! Tolerant declaration parser.
//!
//! The parser walks the token stream looking for the declarations the
//! analyzer needs and skips everything else as balanced token runs. Valid but
//! unmodeled syntax (method bodies, properties, generic constraints, ternaries
//! in initializers) never produces diagnostics; only malformed enum, attribute
//! and `const` declarations do.

mod state;
mod state_declarations;
mod state_expressions;

pub use state::{ParseDiagnostic, ParserState};

use crate::ast::SourceFile;

/// Result of parsing one file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub file: SourceFile,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parse `source` in one call.
#[must_use]
pub fn parse_source_file(file_name: impl Into<String>, source: &str) -> ParseResult {
    let mut parser = ParserState::new(file_name.into(), source);
    let file = parser.parse_source_file();
    ParseResult {
        file,
        diagnostics: parser.take_diagnostics(),
    }
}
