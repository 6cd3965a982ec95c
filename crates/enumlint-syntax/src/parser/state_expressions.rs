//! Parser state - constant expression parsing methods

use enumlint_common::Span;

use super::state::ParserState;
use crate::ast::{BinaryOp, Expr, ExprKind, INTEGRAL_TYPE_KEYWORDS, UnaryOp};
use crate::scanner::{
    SyntaxKind, char_literal_value, integer_literal_value, string_literal_value,
};

impl<'a> ParserState<'a> {
    // =========================================================================
    // Binary expressions
    // =========================================================================

    /// Parse a constant expression. Stops before the first token that cannot
    /// continue it; the caller decides whether that token is acceptable.
    pub(crate) fn parse_expression(&mut self) -> Expr {
        self.parse_binary_expression(0)
    }

    /// Precedence climbing over the left-associative integer operators.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Expr {
        let mut left = self.parse_unary_expression();

        while !left.is_error() {
            let Some(op) = self.binary_operator() else {
                break;
            };
            let precedence = op.precedence();
            if precedence <= min_precedence {
                break;
            }
            self.next_token();
            let right = self.parse_binary_expression(precedence);
            let span = left.span.to(right.span);
            let is_error = right.is_error();
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
            if is_error {
                return Expr::new(ExprKind::Error, span);
            }
        }

        left
    }

    fn binary_operator(&self) -> Option<BinaryOp> {
        let op = match self.token() {
            SyntaxKind::AsteriskToken => BinaryOp::Multiply,
            SyntaxKind::SlashToken => BinaryOp::Divide,
            SyntaxKind::PercentToken => BinaryOp::Remainder,
            SyntaxKind::PlusToken => BinaryOp::Add,
            SyntaxKind::MinusToken => BinaryOp::Subtract,
            SyntaxKind::LessThanLessThanToken => BinaryOp::ShiftLeft,
            SyntaxKind::GreaterThanGreaterThanToken => BinaryOp::ShiftRight,
            SyntaxKind::AmpersandToken => BinaryOp::BitAnd,
            SyntaxKind::CaretToken => BinaryOp::BitXor,
            SyntaxKind::BarToken => BinaryOp::BitOr,
            _ => return None,
        };
        Some(op)
    }

    // =========================================================================
    // Unary expressions
    // =========================================================================

    fn parse_unary_expression(&mut self) -> Expr {
        if !self.enter_recursion() {
            let span = self.current().span;
            self.skip_until(&[
                SyntaxKind::CommaToken,
                SyntaxKind::SemicolonToken,
                SyntaxKind::CloseParenToken,
                SyntaxKind::CloseBracketToken,
            ]);
            return Expr::new(ExprKind::Error, span);
        }
        let expr = self.parse_unary_expression_worker();
        self.leave_recursion();
        expr
    }

    fn parse_unary_expression_worker(&mut self) -> Expr {
        let start = self.token_pos();
        let op = match self.token() {
            SyntaxKind::PlusToken => Some(UnaryOp::Plus),
            SyntaxKind::MinusToken => Some(UnaryOp::Negate),
            SyntaxKind::TildeToken => Some(UnaryOp::BitNot),
            SyntaxKind::ExclamationToken => Some(UnaryOp::LogicalNot),
            _ => None,
        };

        if let Some(op) = op {
            self.next_token();
            let operand = self.parse_unary_expression();
            let span = Span::new(start, operand.span.end);
            if operand.is_error() {
                return Expr::new(ExprKind::Error, span);
            }
            return Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            );
        }

        if self.is_token(SyntaxKind::OpenParenToken)
            && let Some(cast) = self.try_parse_cast_expression()
        {
            return cast;
        }

        self.parse_primary_expression()
    }

    /// `(int)x`, `(long)-1`, `(Alias.Type)Name`.
    ///
    /// A parenthesized integral keyword is always a cast. Any other
    /// parenthesized name is a cast only when an operand follows directly,
    /// so `(A) - 1` stays a subtraction.
    fn try_parse_cast_expression(&mut self) -> Option<Expr> {
        if self.look_ahead(1) != SyntaxKind::Identifier {
            return None;
        }

        let mut close = 2;
        while matches!(
            self.look_ahead(close),
            SyntaxKind::DotToken | SyntaxKind::ColonColonToken
        ) && self.look_ahead(close + 1) == SyntaxKind::Identifier
        {
            close += 2;
        }
        if self.look_ahead(close) != SyntaxKind::CloseParenToken {
            return None;
        }

        let is_keyword = close == 2 && INTEGRAL_TYPE_KEYWORDS.contains(&self.look_ahead_text(1));
        if !is_keyword && !starts_cast_operand(self.look_ahead(close + 1)) {
            return None;
        }

        let start = self.token_pos();
        self.next_token(); // (
        let type_name = self.parse_qualified_name()?.dotted();
        self.next_token(); // )

        let operand = self.parse_unary_expression();
        let span = Span::new(start, operand.span.end);
        if operand.is_error() {
            return Some(Expr::new(ExprKind::Error, span));
        }
        Some(Expr::new(
            ExprKind::Cast {
                type_name,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    // =========================================================================
    // Primary expressions
    // =========================================================================

    fn parse_primary_expression(&mut self) -> Expr {
        let token = self.current();
        let text = self.token_text();

        let kind = match token.kind {
            SyntaxKind::IntegerLiteral => ExprKind::Integer(integer_literal_value(text)),
            SyntaxKind::RealLiteral => ExprKind::Real,
            SyntaxKind::CharLiteral => ExprKind::Char(char_literal_value(text)),
            kind if kind.is_string_literal() => {
                ExprKind::String(string_literal_value(kind, text))
            }
            SyntaxKind::OpenParenToken => return self.parse_parenthesized_expression(),
            SyntaxKind::Identifier => return self.parse_name_expression(),
            _ => {
                self.error_at_current("Expression expected.");
                return Expr::new(ExprKind::Error, Span::at(token.span.start));
            }
        };

        self.next_token();
        Expr::new(kind, token.span)
    }

    fn parse_parenthesized_expression(&mut self) -> Expr {
        let start = self.token_pos();
        self.next_token(); // (
        let inner = self.parse_expression();
        if inner.is_error() {
            return inner;
        }
        if !self.parse_expected(SyntaxKind::CloseParenToken, ")") {
            return Expr::new(ExprKind::Error, Span::new(start, self.prev_token_end()));
        }
        Expr::new(
            ExprKind::Paren(Box::new(inner)),
            Span::new(start, self.prev_token_end()),
        )
    }

    /// Names, `checked(...)` / `unchecked(...)`, and calls. Calls (including
    /// `typeof`, `sizeof` and `nameof`) are not constant-evaluated and become
    /// `Unsupported`.
    fn parse_name_expression(&mut self) -> Expr {
        let start = self.token_pos();
        let text = self.token_text();

        if matches!(text, "checked" | "unchecked")
            && self.look_ahead(1) == SyntaxKind::OpenParenToken
        {
            let checked = text == "checked";
            self.next_token();
            self.next_token(); // (
            let operand = self.parse_expression();
            if operand.is_error() {
                return operand;
            }
            if !self.parse_expected(SyntaxKind::CloseParenToken, ")") {
                return Expr::new(ExprKind::Error, Span::new(start, self.prev_token_end()));
            }
            return Expr::new(
                ExprKind::CheckedContext {
                    checked,
                    operand: Box::new(operand),
                },
                Span::new(start, self.prev_token_end()),
            );
        }

        let Some(name) = self.parse_qualified_name() else {
            return Expr::new(ExprKind::Error, Span::at(start));
        };

        if self.is_token(SyntaxKind::OpenParenToken) {
            self.skip_balanced();
            return Expr::new(
                ExprKind::Unsupported,
                Span::new(start, self.prev_token_end()),
            );
        }

        let span = name.span();
        Expr::new(ExprKind::Name(name), Span::new(start, span.end))
    }
}

/// Tokens that can begin the operand of a cast whose type is not a keyword.
fn starts_cast_operand(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::IntegerLiteral
            | SyntaxKind::RealLiteral
            | SyntaxKind::CharLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::VerbatimStringLiteral
            | SyntaxKind::RawStringLiteral
            | SyntaxKind::InterpolatedStringLiteral
            | SyntaxKind::OpenParenToken
            | SyntaxKind::TildeToken
            | SyntaxKind::ExclamationToken
    )
}
