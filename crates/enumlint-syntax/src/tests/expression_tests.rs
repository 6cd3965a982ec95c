//! Tests for constant expression parsing (parser/state_expressions.rs)

use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::parser::parse_source_file;

/// Parse `enum E { M = <source> }` and return the initializer.
fn parse_initializer(source: &str) -> (Expr, usize) {
    let text = format!("enum E {{ M = {source} }}");
    let result = parse_source_file("test.cs", &text);
    let member = &result.file.enums[0].members[0];
    let expr = member
        .value()
        .cloned()
        .expect("member should have an initializer");
    (expr, result.diagnostics.len())
}

fn render(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Integer(Some(v)) => v.to_string(),
        ExprKind::Integer(None) => "<overflow>".to_string(),
        ExprKind::Real => "<real>".to_string(),
        ExprKind::String(value) => format!("{value:?}"),
        ExprKind::Char(value) => format!("{value:?}"),
        ExprKind::Name(name) => {
            let prefix = if name.global { "global::" } else { "" };
            format!("{prefix}{}", name.dotted())
        }
        ExprKind::Paren(inner) => format!("({})", render(inner)),
        ExprKind::Cast { type_name, operand } => format!("(cast {type_name} {})", render(operand)),
        ExprKind::Unary { op, operand } => {
            let op = match op {
                UnaryOp::Plus => "+",
                UnaryOp::Negate => "-",
                UnaryOp::BitNot => "~",
                UnaryOp::LogicalNot => "!",
            };
            format!("{op}{}", render(operand))
        }
        ExprKind::Binary { op, left, right } => {
            format!("[{} {} {}]", render(left), op.as_str(), render(right))
        }
        ExprKind::CheckedContext { checked, operand } => {
            let keyword = if *checked { "checked" } else { "unchecked" };
            format!("{keyword}({})", render(operand))
        }
        ExprKind::Unsupported => "<unsupported>".to_string(),
        ExprKind::Error => "<error>".to_string(),
    }
}

fn rendered(source: &str) -> String {
    let (expr, diagnostics) = parse_initializer(source);
    assert_eq!(diagnostics, 0, "unexpected parse diagnostics for {source:?}");
    render(&expr)
}

#[test]
fn test_binary_precedence() {
    assert_eq!(rendered("1 + 2 * 3"), "[1 + [2 * 3]]");
    assert_eq!(rendered("1 << 2 + 3"), "[1 << [2 + 3]]");
    assert_eq!(rendered("A | B & C"), "[A | [B & C]]");
    assert_eq!(rendered("A ^ B | C"), "[[A ^ B] | C]");
    assert_eq!(rendered("A & B ^ C"), "[[A & B] ^ C]");
}

#[test]
fn test_binary_operators_are_left_associative() {
    assert_eq!(rendered("10 - 3 - 2"), "[[10 - 3] - 2]");
    assert_eq!(rendered("64 / 4 / 2"), "[[64 / 4] / 2]");
    assert_eq!(rendered("1 << 2 >> 1"), "[[1 << 2] >> 1]");
}

#[test]
fn test_unary_operators() {
    assert_eq!(rendered("-1"), "-1");
    assert_eq!(rendered("~0 & 0xFF"), "[~0 & 255]");
    assert_eq!(rendered("-(-A)"), "-(-A)");
    assert_eq!(rendered("+A - -B"), "[+A - -B]");
}

#[test]
fn test_parenthesized_expression() {
    assert_eq!(rendered("(1 + 2) * 3"), "[([1 + 2]) * 3]");
}

#[test]
fn test_keyword_cast() {
    assert_eq!(rendered("(int)-1"), "(cast int -1)");
    assert_eq!(rendered("(byte)(A + 1)"), "(cast byte ([A + 1]))");
    assert_eq!(rendered("(long)A << 2"), "[(cast long A) << 2]");
}

#[test]
fn test_name_cast_requires_operand() {
    assert_eq!(rendered("(Other)A"), "(cast Other A)");
    assert_eq!(rendered("(Ns.Other)2"), "(cast Ns.Other 2)");
    // Without a directly following operand this is a parenthesized name.
    assert_eq!(rendered("(A) - 1"), "[(A) - 1]");
    assert_eq!(rendered("(A)"), "(A)");
}

#[test]
fn test_qualified_names() {
    assert_eq!(rendered("Other.Value"), "Other.Value");
    assert_eq!(rendered("global::Ns.Consts.X"), "global::Ns.Consts.X");
    assert_eq!(rendered("@class"), "class");
}

#[test]
fn test_literals() {
    assert_eq!(rendered("0x10"), "16");
    assert_eq!(rendered("'a'"), "Some('a')");
    assert_eq!(rendered("1.5"), "<real>");
    assert_eq!(rendered("\"text\""), "Some(\"text\")");
    assert_eq!(rendered("99999999999999999999"), "<overflow>");
}

#[test]
fn test_checked_contexts() {
    assert_eq!(rendered("checked(A + 1)"), "checked([A + 1])");
    assert_eq!(rendered("unchecked((int)0xFFFFFFFF)"), "unchecked((cast int 4294967295))");
}

#[test]
fn test_calls_are_unsupported() {
    assert_eq!(rendered("Compute(1, 2)"), "<unsupported>");
    assert_eq!(rendered("sizeof(int)"), "<unsupported>");
    assert_eq!(rendered("nameof(A) + 1"), "[<unsupported> + 1]");
}

#[test]
fn test_unmodeled_trailing_syntax_is_unsupported_without_diagnostics() {
    assert_eq!(rendered("A == B ? 1 : 2"), "<unsupported>");
    assert_eq!(rendered("new int[] { 1 }.Length"), "<unsupported>");
    assert_eq!(rendered("A < B"), "<unsupported>");
}

#[test]
fn test_missing_expression_reports_diagnostic() {
    let text = "enum E { M = , N }";
    let result = parse_source_file("test.cs", text);
    let members = &result.file.enums[0].members;
    assert_eq!(members.len(), 2);
    assert!(members[0].value().is_some_and(Expr::is_error));
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].message, "Expression expected.");
    assert_eq!(result.diagnostics[0].start, text.find(',').unwrap() as u32);
}

#[test]
fn test_dangling_operator_reports_diagnostic() {
    let (expr, diagnostics) = parse_initializer("1 +");
    assert!(expr.is_error());
    assert_eq!(diagnostics, 1);
}

#[test]
fn test_unclosed_paren_reports_diagnostic() {
    let (expr, diagnostics) = parse_initializer("(1 + 2");
    assert!(expr.is_error());
    assert_eq!(diagnostics, 1);
}

#[test]
fn test_deep_nesting_is_bounded() {
    let depth = enumlint_common::limits::MAX_EXPRESSION_DEPTH as usize + 10;
    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    let (expr, diagnostics) = parse_initializer(&source);
    assert!(expr.is_error());
    assert!(diagnostics >= 1);
}

#[test]
fn test_expression_spans_cover_source_text() {
    let text = "enum E { M = (int)A + 1 }";
    let result = parse_source_file("test.cs", text);
    let expr = result.file.enums[0].members[0]
        .value()
        .expect("initializer");
    assert_eq!(expr.span.text(text), Some("(int)A + 1"));
    match &expr.kind {
        ExprKind::Binary {
            op: BinaryOp::Add,
            left,
            ..
        } => assert_eq!(left.span.text(text), Some("(int)A")),
        other => panic!("expected an addition, got {other:?}"),
    }
}
