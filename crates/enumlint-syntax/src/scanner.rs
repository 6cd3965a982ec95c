//! Tokenizer for C-family declaration files.
//!
//! The scanner is deliberately forgiving: anything it does not recognize
//! becomes an `Unknown` or `OtherOperator` token so the parser can skip it.
//! Only unterminated literals and comments are reported.

use enumlint_common::Span;

/// Token kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    EndOfFileToken,
    Unknown,

    // Names and literals
    Identifier,
    IntegerLiteral,
    RealLiteral,
    StringLiteral,
    VerbatimStringLiteral,
    RawStringLiteral,
    InterpolatedStringLiteral,
    CharLiteral,

    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    SemicolonToken,
    CommaToken,
    DotToken,
    ColonToken,
    ColonColonToken,
    QuestionToken,

    // Operators that can appear in a constant expression
    EqualsToken,
    PlusToken,
    MinusToken,
    AsteriskToken,
    SlashToken,
    PercentToken,
    LessThanToken,
    GreaterThanToken,
    LessThanLessThanToken,
    GreaterThanGreaterThanToken,
    AmpersandToken,
    BarToken,
    CaretToken,
    TildeToken,
    ExclamationToken,

    /// Compound operators (`==`, `=>`, `+=`, `&&`, `??`, ...).
    OtherOperator,
}

impl SyntaxKind {
    #[must_use]
    pub const fn is_string_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::StringLiteral
                | SyntaxKind::VerbatimStringLiteral
                | SyntaxKind::RawStringLiteral
                | SyntaxKind::InterpolatedStringLiteral
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub fn text(self, source: &str) -> &str {
        self.span.text(source).unwrap_or("")
    }
}

/// A problem found while scanning (unterminated literal or comment).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerDiagnostic {
    pub start: u32,
    pub length: u32,
    pub message: &'static str,
}

pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    at_line_start: bool,
    diagnostics: Vec<ScannerDiagnostic>,
    /// Offsets of `#if`, `#elif`, `#else` and `#endif` lines.
    conditional_directives: Vec<u32>,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            pos: 0,
            at_line_start: true,
            diagnostics: Vec::new(),
            conditional_directives: Vec::new(),
        }
    }

    #[must_use]
    pub fn source_text(&self) -> &'a str {
        self.source
    }

    pub fn take_diagnostics(&mut self) -> Vec<ScannerDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn take_conditional_directives(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.conditional_directives)
    }

    /// Scan every token up to and including `EndOfFileToken`.
    pub fn scan_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan();
            tokens.push(token);
            if token.kind == SyntaxKind::EndOfFileToken {
                return tokens;
            }
        }
    }

    pub fn scan(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return self.token(SyntaxKind::EndOfFileToken, start);
        };
        self.at_line_start = false;

        let kind = match ch {
            '{' => self.punct(1, SyntaxKind::OpenBraceToken),
            '}' => self.punct(1, SyntaxKind::CloseBraceToken),
            '(' => self.punct(1, SyntaxKind::OpenParenToken),
            ')' => self.punct(1, SyntaxKind::CloseParenToken),
            '[' => self.punct(1, SyntaxKind::OpenBracketToken),
            ']' => self.punct(1, SyntaxKind::CloseBracketToken),
            ';' => self.punct(1, SyntaxKind::SemicolonToken),
            ',' => self.punct(1, SyntaxKind::CommaToken),
            '~' => self.punct(1, SyntaxKind::TildeToken),
            '"' => self.scan_string(start),
            '\'' => self.scan_char(start),
            '@' => self.scan_at_sign(start),
            '$' => self.scan_interpolated(start),
            '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            '.' => self.punct(1, SyntaxKind::DotToken),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_identifier_start(c) => {
                self.scan_identifier_rest();
                SyntaxKind::Identifier
            }
            ':' => match self.peek_at(1) {
                Some(':') => self.punct(2, SyntaxKind::ColonColonToken),
                _ => self.punct(1, SyntaxKind::ColonToken),
            },
            '?' => match self.peek_at(1) {
                Some('?') => {
                    let len = if self.peek_at(2) == Some('=') { 3 } else { 2 };
                    self.punct(len, SyntaxKind::OtherOperator)
                }
                Some('.') => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::QuestionToken),
            },
            '=' => match self.peek_at(1) {
                Some('=' | '>') => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::EqualsToken),
            },
            '+' => match self.peek_at(1) {
                Some('+' | '=') => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::PlusToken),
            },
            '-' => match self.peek_at(1) {
                Some('-' | '=' | '>') => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::MinusToken),
            },
            '*' => self.punct_or_assign(SyntaxKind::AsteriskToken),
            '/' => self.punct_or_assign(SyntaxKind::SlashToken),
            '%' => self.punct_or_assign(SyntaxKind::PercentToken),
            '^' => self.punct_or_assign(SyntaxKind::CaretToken),
            '!' => self.punct_or_assign(SyntaxKind::ExclamationToken),
            '&' => match self.peek_at(1) {
                Some('&' | '=') => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::AmpersandToken),
            },
            '|' => match self.peek_at(1) {
                Some('|' | '=') => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::BarToken),
            },
            '<' => match (self.peek_at(1), self.peek_at(2)) {
                (Some('<'), Some('=')) => self.punct(3, SyntaxKind::OtherOperator),
                (Some('<'), _) => self.punct(2, SyntaxKind::LessThanLessThanToken),
                (Some('='), _) => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::LessThanToken),
            },
            '>' => match (self.peek_at(1), self.peek_at(2)) {
                (Some('>'), Some('>' | '=')) => self.punct(3, SyntaxKind::OtherOperator),
                (Some('>'), _) => self.punct(2, SyntaxKind::GreaterThanGreaterThanToken),
                (Some('='), _) => self.punct(2, SyntaxKind::OtherOperator),
                _ => self.punct(1, SyntaxKind::GreaterThanToken),
            },
            other => {
                self.pos += other.len_utf8();
                SyntaxKind::Unknown
            }
        };

        self.token(kind, start)
    }

    // =========================================================================
    // Character helpers
    // =========================================================================

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn token(&self, kind: SyntaxKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start as u32, self.pos as u32),
        }
    }

    fn punct(&mut self, len: usize, kind: SyntaxKind) -> SyntaxKind {
        // Every punctuation character is ASCII.
        self.pos += len;
        kind
    }

    fn punct_or_assign(&mut self, kind: SyntaxKind) -> SyntaxKind {
        if self.peek_at(1) == Some('=') {
            self.punct(2, SyntaxKind::OtherOperator)
        } else {
            self.punct(1, kind)
        }
    }

    fn error(&mut self, start: usize, message: &'static str) {
        self.diagnostics.push(ScannerDiagnostic {
            start: start as u32,
            length: (self.pos - start) as u32,
            message,
        });
    }

    // =========================================================================
    // Trivia
    // =========================================================================

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                '\n' | '\r' => {
                    self.pos += 1;
                    self.at_line_start = true;
                }
                c if c.is_whitespace() => self.pos += c.len_utf8(),
                '/' if self.peek_at(1) == Some('/') => self.skip_line(),
                '/' if self.peek_at(1) == Some('*') => {
                    let start = self.pos;
                    self.pos += 2;
                    match self.source[self.pos..].find("*/") {
                        Some(end) => {
                            let comment = &self.source[self.pos..self.pos + end];
                            if comment.contains(['\n', '\r']) {
                                self.at_line_start = true;
                            }
                            self.pos += end + 2;
                        }
                        None => {
                            self.pos = self.source.len();
                            self.error(start, "Unterminated comment.");
                        }
                    }
                }
                // Preprocessor directives occupy a whole line.
                '#' if self.at_line_start => {
                    if self.is_conditional_directive() {
                        self.conditional_directives.push(self.pos as u32);
                    }
                    self.skip_line();
                }
                _ => return,
            }
        }
    }

    /// At a `#`: whether the directive opens, switches or closes a branch.
    fn is_conditional_directive(&self) -> bool {
        let rest = self.source[self.pos + 1..].trim_start_matches([' ', '\t']);
        let keyword_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        matches!(&rest[..keyword_len], "if" | "elif" | "else" | "endif")
    }

    fn skip_line(&mut self) {
        match self.source[self.pos..].find(['\n', '\r']) {
            Some(end) => self.pos += end,
            None => self.pos = self.source.len(),
        }
    }

    // =========================================================================
    // Literals and identifiers
    // =========================================================================

    fn scan_identifier_rest(&mut self) {
        while let Some(ch) = self.peek() {
            if !is_identifier_part(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn scan_at_sign(&mut self, start: usize) -> SyntaxKind {
        match self.peek_at(1) {
            Some('"') => {
                self.pos += 1;
                self.scan_verbatim_string(start)
            }
            Some('$') if self.peek_at(2) == Some('"') => {
                self.pos += 1;
                self.scan_interpolated(start)
            }
            Some(c) if is_identifier_start(c) => {
                self.pos += 1;
                self.scan_identifier_rest();
                SyntaxKind::Identifier
            }
            _ => {
                self.pos += 1;
                SyntaxKind::Unknown
            }
        }
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let radix_prefix = if self.peek() == Some('0') {
            match self.peek_at(1) {
                Some('x' | 'X') => Some(16),
                Some('b' | 'B') => Some(2),
                _ => None,
            }
        } else {
            None
        };

        if let Some(radix) = radix_prefix {
            self.pos += 2;
            self.eat_digits(radix);
            self.eat_integer_suffix();
            self.scan_identifier_rest();
            return SyntaxKind::IntegerLiteral;
        }

        let mut real = false;
        self.eat_digits(10);
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            real = true;
            self.pos += 1;
            self.eat_digits(10);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                real = true;
                self.pos += digit_at;
                self.eat_digits(10);
            }
        }
        if matches!(self.peek(), Some('f' | 'F' | 'd' | 'D' | 'm' | 'M')) {
            real = true;
            self.pos += 1;
        } else if !real {
            self.eat_integer_suffix();
        }
        // Trailing garbage such as `12abc` stays part of the literal and fails
        // to convert later.
        self.scan_identifier_rest();

        if real {
            SyntaxKind::RealLiteral
        } else {
            SyntaxKind::IntegerLiteral
        }
    }

    fn eat_digits(&mut self, radix: u32) {
        while let Some(ch) = self.peek() {
            if ch == '_' || ch.is_digit(radix) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn eat_integer_suffix(&mut self) {
        for _ in 0..2 {
            if !matches!(self.peek(), Some('u' | 'U' | 'l' | 'L')) {
                break;
            }
            self.pos += 1;
        }
    }

    fn scan_string(&mut self, start: usize) -> SyntaxKind {
        if self.source[self.pos..].starts_with("\"\"\"") {
            return self.scan_raw_string(start);
        }
        self.pos += 1;
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    self.error(start, "Unterminated string literal.");
                    return SyntaxKind::StringLiteral;
                }
                Some('\\') => {
                    self.pos += 1;
                    self.bump();
                }
                Some('"') => {
                    self.pos += 1;
                    return SyntaxKind::StringLiteral;
                }
                Some(c) => self.pos += c.len_utf8(),
            }
        }
    }

    fn scan_verbatim_string(&mut self, start: usize) -> SyntaxKind {
        // Positioned on the opening quote.
        self.pos += 1;
        loop {
            match self.bump() {
                None => {
                    self.error(start, "Unterminated string literal.");
                    return SyntaxKind::VerbatimStringLiteral;
                }
                Some('"') => {
                    if !self.eat('"') {
                        return SyntaxKind::VerbatimStringLiteral;
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn scan_raw_string(&mut self, start: usize) -> SyntaxKind {
        let quotes = self.source[self.pos..]
            .bytes()
            .take_while(|&b| b == b'"')
            .count();
        self.pos += quotes;
        let closing = "\"".repeat(quotes);
        match self.source[self.pos..].find(&closing) {
            Some(end) => self.pos += end + quotes,
            None => {
                self.pos = self.source.len();
                self.error(start, "Unterminated raw string literal.");
            }
        }
        SyntaxKind::RawStringLiteral
    }

    /// `$"..."`, `$@"..."` and `@$"..."`. Holes may contain nested strings.
    fn scan_interpolated(&mut self, start: usize) -> SyntaxKind {
        let mut verbatim = false;
        while let Some(prefix @ ('$' | '@')) = self.peek() {
            verbatim |= prefix == '@';
            self.pos += 1;
        }
        if !self.eat('"') {
            return SyntaxKind::Unknown;
        }
        let mut depth = 0u32;
        loop {
            match self.bump() {
                None => {
                    self.error(start, "Unterminated string literal.");
                    return SyntaxKind::InterpolatedStringLiteral;
                }
                Some('{') if depth == 0 && self.eat('{') => {}
                Some('}') if depth == 0 && self.eat('}') => {}
                Some('{') => depth += 1,
                Some('}') => depth = depth.saturating_sub(1),
                Some('\\') if depth == 0 && !verbatim => {
                    self.bump();
                }
                Some('"') if depth == 0 && verbatim && self.eat('"') => {}
                Some('"') if depth > 0 => {
                    let nested = self.pos - 1;
                    self.pos = nested;
                    self.scan_string(nested);
                }
                Some('"') => return SyntaxKind::InterpolatedStringLiteral,
                Some(_) => {}
            }
        }
    }

    fn scan_char(&mut self, start: usize) -> SyntaxKind {
        self.pos += 1;
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    self.error(start, "Unterminated character literal.");
                    return SyntaxKind::CharLiteral;
                }
                Some('\\') => {
                    self.pos += 1;
                    self.bump();
                }
                Some('\'') => {
                    self.pos += 1;
                    return SyntaxKind::CharLiteral;
                }
                Some(c) => self.pos += c.len_utf8(),
            }
        }
    }
}

#[must_use]
pub fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

#[must_use]
pub fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

// =============================================================================
// Literal values
// =============================================================================

/// Convert an integer literal's text to its value.
///
/// Handles `0x`/`0b` prefixes, `_` separators and `u`/`l` suffixes. Returns
/// `None` when the text is malformed or does not fit in 64 bits.
#[must_use]
pub fn integer_literal_value(text: &str) -> Option<u64> {
    let trimmed = text.trim_end_matches(['u', 'U', 'l', 'L']);
    let (digits, radix) = match trimmed.get(..2) {
        Some("0x" | "0X") => (&trimmed[2..], 16),
        Some("0b" | "0B") => (&trimmed[2..], 2),
        _ => (trimmed, 10),
    };
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() || digits.starts_with('_') && radix == 10 {
        return None;
    }
    u64::from_str_radix(&cleaned, radix).ok()
}

/// Decode the value of a string literal token. Interpolated strings only
/// have a value when they contain no holes.
#[must_use]
pub fn string_literal_value(kind: SyntaxKind, text: &str) -> Option<String> {
    match kind {
        SyntaxKind::StringLiteral => {
            let inner = text.strip_prefix('"')?.strip_suffix('"')?;
            unescape(inner)
        }
        SyntaxKind::VerbatimStringLiteral => {
            let inner = text.strip_prefix("@\"")?.strip_suffix('"')?;
            Some(inner.replace("\"\"", "\""))
        }
        SyntaxKind::RawStringLiteral => {
            let quotes = text.bytes().take_while(|&b| b == b'"').count();
            let inner = text.get(quotes..text.len().checked_sub(quotes)?)?;
            if inner.contains(['\n', '\r']) {
                // Multi-line raw strings drop the opening and closing lines.
                let lines: Vec<&str> = inner.lines().collect();
                let body = lines.get(1..lines.len().saturating_sub(1))?;
                let indent = lines.last().map_or(0, |l| l.len());
                Some(
                    body.iter()
                        .map(|line| line.get(indent..).unwrap_or(line.trim_start()))
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
            } else {
                Some(inner.to_string())
            }
        }
        SyntaxKind::InterpolatedStringLiteral => {
            let prefix_len = text.find('"')?;
            let verbatim = text[..prefix_len].contains('@');
            let inner = text.get(prefix_len + 1..text.len() - 1)?;
            let without_escapes = inner.replace("{{", "").replace("}}", "");
            if without_escapes.contains(['{', '}']) {
                return None;
            }
            let inner = inner.replace("{{", "{").replace("}}", "}");
            if verbatim {
                Some(inner.replace("\"\"", "\""))
            } else {
                unescape(&inner)
            }
        }
        _ => None,
    }
}

/// Decode the value of a character literal token.
#[must_use]
pub fn char_literal_value(text: &str) -> Option<char> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let decoded = unescape(inner)?;
    let mut chars = decoded.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch)
}

fn unescape(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = match chars.next()? {
            '\'' => '\'',
            '"' => '"',
            '\\' => '\\',
            '0' => '\0',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            'u' => hex_escape(&mut chars, 4, 4)?,
            'U' => hex_escape(&mut chars, 8, 8)?,
            'x' => hex_escape(&mut chars, 1, 4)?,
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, min: usize, max: usize) -> Option<char> {
    let mut value = 0u32;
    let mut count = 0;
    while count < max {
        let mut lookahead = chars.clone();
        let Some(digit) = lookahead.next().and_then(|c| c.to_digit(16)) else {
            break;
        };
        *chars = lookahead;
        value = value * 16 + digit;
        count += 1;
    }
    if count < min {
        return None;
    }
    char::from_u32(value)
}
