//! Declaration scanner, parser and AST types for the enumlint analyzer.
//!
//! This crate is the host side of the analyzer: it turns C-family source text
//! with bracketed attribute lists into a structural view of the declarations
//! the checker cares about:
//! - `SyntaxKind` / `Scanner` - tokenizer
//! - `ParserState` - tolerant declaration parser
//! - `SourceFile`, `EnumDeclaration`, `EnumMember`, `Annotation`, `Expr` - AST
//!
//! Everything that is not an enum, a `const` field, a `using` alias or a
//! namespace/type container is skipped without diagnostics.

pub mod scanner;
pub use scanner::{Scanner, SyntaxKind, Token};

pub mod ast;
pub use ast::*;

pub mod parser;
pub use parser::{ParseDiagnostic, ParseResult, ParserState, parse_source_file};

#[cfg(test)]
#[path = "tests/scanner_tests.rs"]
mod scanner_tests;
#[cfg(test)]
#[path = "tests/expression_tests.rs"]
mod expression_tests;
