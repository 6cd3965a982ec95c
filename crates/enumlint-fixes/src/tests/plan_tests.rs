//! Tests for plan.rs

use crate::error::FixError;
use crate::plan::{FixKind, plan_fix};
use enumlint_syntax::{SourceFile, parse_source_file};

fn parse(source: &str) -> SourceFile {
    let result = parse_source_file("test.cs", source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    result.file
}

#[test]
fn test_explicit_initializer_is_replaced() {
    let source = "enum E { A = 0, B = 1, C = 1 }";
    let file = parse(source);
    let member = &file.enums[0].members[2];

    let plan = plan_fix(member, 1).expect("plan");
    assert_eq!(plan.kind, FixKind::Replace);
    assert_eq!(plan.new_value, 2);
    assert_eq!(plan.new_text, "2");
    assert_eq!(plan.span.text(source), Some("1"));
    assert_eq!(
        plan.apply(source).expect("apply"),
        "enum E { A = 0, B = 1, C = 2 }"
    );
}

#[test]
fn test_whole_initializer_expression_is_replaced() {
    let source = "enum E { A = 4, B = 1 << 2 }";
    let file = parse(source);
    let plan = plan_fix(&file.enums[0].members[1], 4).expect("plan");
    assert_eq!(plan.span.text(source), Some("1 << 2"));
    assert_eq!(plan.apply(source).expect("apply"), "enum E { A = 4, B = 5 }");
}

#[test]
fn test_implicit_member_gets_an_initializer() {
    let source = "enum E { A = 1, B = 0, C }";
    let file = parse(source);
    let plan = plan_fix(&file.enums[0].members[2], 1).expect("plan");

    assert_eq!(plan.kind, FixKind::Insert);
    assert!(plan.span.is_empty());
    assert_eq!(plan.new_text, " = 2");
    assert_eq!(
        plan.apply(source).expect("apply"),
        "enum E { A = 1, B = 0, C = 2 }"
    );
}

#[test]
fn test_member_attributes_are_left_alone() {
    let source = "enum E { A, [Obsolete] B }";
    let file = parse(source);
    let plan = plan_fix(&file.enums[0].members[1], 0).expect("plan");
    assert_eq!(
        plan.apply(source).expect("apply"),
        "enum E { A, [Obsolete] B = 1 }"
    );
}

#[test]
fn test_negative_max_still_adds_one() {
    let file = parse("enum E { A = -1 }");
    let plan = plan_fix(&file.enums[0].members[0], -5).expect("plan");
    assert_eq!(plan.new_text, "-4");
}

#[test]
fn test_max_at_limit_overflows() {
    let file = parse("enum E { A }");
    assert_eq!(
        plan_fix(&file.enums[0].members[0], i64::MAX),
        Err(FixError::ValueOverflow { max_value: i64::MAX })
    );
}

#[test]
fn test_apply_rejects_out_of_bounds_span() {
    let file = parse("enum E { A = 1 }");
    let plan = plan_fix(&file.enums[0].members[0], 1).expect("plan");
    assert_eq!(plan.apply("short"), Err(FixError::InvalidEdit));
}
