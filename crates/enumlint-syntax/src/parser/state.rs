//! Parser state - token cursor, diagnostics and recovery helpers

use enumlint_common::Span;
use enumlint_common::limits::MAX_EXPRESSION_DEPTH;
use rustc_hash::FxHashMap;

use crate::ast::SourceFile;
use crate::scanner::{Scanner, SyntaxKind, Token};

/// A syntax error found while parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub start: u32,
    pub length: u32,
    pub message: String,
}

/// Declaration modifiers that may precede `enum`, `class`, `const`, ...
pub(crate) const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "internal",
    "static",
    "sealed",
    "abstract",
    "partial",
    "readonly",
    "ref",
    "unsafe",
    "new",
    "file",
    "extern",
    "volatile",
    "virtual",
    "override",
];

pub struct ParserState<'a> {
    pub(crate) file_name: String,
    pub(crate) source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
    /// Enclosing namespaces and types of the declaration being parsed.
    pub(crate) container: Vec<String>,
    /// `using` aliases seen so far: alias -> qualified target.
    pub(crate) aliases: FxHashMap<String, Vec<String>>,
    pub(crate) file: SourceFile,
    pub(crate) parse_diagnostics: Vec<ParseDiagnostic>,
    /// Offsets of conditional compilation directives, ascending.
    pub(crate) conditional_directives: Vec<u32>,
}

impl<'a> ParserState<'a> {
    #[must_use]
    pub fn new(file_name: String, source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_all();
        let parse_diagnostics = scanner
            .take_diagnostics()
            .into_iter()
            .map(|diag| ParseDiagnostic {
                start: diag.start,
                length: diag.length,
                message: diag.message.to_string(),
            })
            .collect();
        let conditional_directives = scanner.take_conditional_directives();

        ParserState {
            file: SourceFile {
                file_name: file_name.clone(),
                ..SourceFile::default()
            },
            file_name,
            source,
            tokens,
            pos: 0,
            depth: 0,
            container: Vec::new(),
            aliases: FxHashMap::default(),
            parse_diagnostics,
            conditional_directives,
        }
    }

    /// Whether a `#if`/`#else` style directive sits inside `span`.
    pub(crate) fn has_conditional_directive_in(&self, span: Span) -> bool {
        let first = self
            .conditional_directives
            .partition_point(|&offset| offset < span.start);
        self.conditional_directives
            .get(first)
            .is_some_and(|&offset| offset < span.end)
    }

    /// Parse the whole file.
    pub fn parse_source_file(&mut self) -> SourceFile {
        self.parse_items(false);
        self.parse_diagnostics.sort_by_key(|d| d.start);
        tracing::trace!(
            file = %self.file_name,
            enums = self.file.enums.len(),
            constants = self.file.constants.len(),
            diagnostics = self.parse_diagnostics.len(),
            "parsed source file"
        );
        std::mem::take(&mut self.file)
    }

    pub fn take_diagnostics(&mut self) -> Vec<ParseDiagnostic> {
        std::mem::take(&mut self.parse_diagnostics)
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    pub(crate) fn current(&self) -> Token {
        // The token list always ends with EndOfFileToken and the cursor never
        // moves past it.
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn token(&self) -> SyntaxKind {
        self.current().kind
    }

    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.token() == kind
    }

    pub(crate) fn token_text(&self) -> &'a str {
        let source = self.source;
        self.current().text(source)
    }

    pub(crate) fn is_identifier_text(&self, text: &str) -> bool {
        self.is_token(SyntaxKind::Identifier) && self.token_text() == text
    }

    pub(crate) fn look_ahead(&self, n: usize) -> SyntaxKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx].kind
    }

    pub(crate) fn look_ahead_text(&self, n: usize) -> &'a str {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        let source = self.source;
        self.tokens[idx].text(source)
    }

    pub(crate) fn token_pos(&self) -> u32 {
        self.current().span.start
    }

    /// End offset of the most recently consumed token.
    pub(crate) fn prev_token_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    pub(crate) fn next_token(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Consume the current token when it has the given kind.
    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or record `'<text>' expected.` at the current token.
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind, text: &str) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.error_at_current(format!("'{text}' expected."));
        false
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub(crate) fn error_at(&mut self, span: Span, message: impl Into<String>) {
        // One diagnostic per position keeps recovery from cascading.
        if self
            .parse_diagnostics
            .last()
            .is_some_and(|last| last.start == span.start)
        {
            return;
        }
        self.parse_diagnostics.push(ParseDiagnostic {
            start: span.start,
            length: span.len(),
            message: message.into(),
        });
    }

    pub(crate) fn error_at_current(&mut self, message: impl Into<String>) {
        let span = self.current().span;
        self.error_at(span, message);
    }

    // =========================================================================
    // Recursion guard
    // =========================================================================

    pub(crate) fn enter_recursion(&mut self) -> bool {
        if self.depth >= MAX_EXPRESSION_DEPTH {
            self.error_at_current("Expression is too deeply nested.");
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // =========================================================================
    // Skipping
    // =========================================================================

    /// Skip a balanced `open ... close` run starting at the current `open` token.
    pub(crate) fn skip_balanced(&mut self) {
        let close = match self.token() {
            SyntaxKind::OpenBraceToken => SyntaxKind::CloseBraceToken,
            SyntaxKind::OpenParenToken => SyntaxKind::CloseParenToken,
            SyntaxKind::OpenBracketToken => SyntaxKind::CloseBracketToken,
            _ => {
                self.next_token();
                return;
            }
        };
        self.next_token();
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken => return,
                kind if kind == close => {
                    self.next_token();
                    return;
                }
                SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken => self.skip_balanced(),
                // An unbalanced closer of another kind ends the run.
                SyntaxKind::CloseBraceToken if close != SyntaxKind::CloseBraceToken => return,
                _ => self.next_token(),
            }
        }
    }

    /// Skip tokens until one of `stops` at nesting depth zero, without
    /// consuming it. Closing braces always stop.
    pub(crate) fn skip_until(&mut self, stops: &[SyntaxKind]) {
        loop {
            let kind = self.token();
            if kind == SyntaxKind::EndOfFileToken
                || kind == SyntaxKind::CloseBraceToken
                || stops.contains(&kind)
            {
                return;
            }
            match kind {
                SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken => self.skip_balanced(),
                _ => self.next_token(),
            }
        }
    }
}
