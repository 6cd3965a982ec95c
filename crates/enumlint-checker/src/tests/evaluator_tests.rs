//! Tests for evaluator.rs

use crate::evaluator::{ConstantEvaluator, EvalError, ProjectIndex, SemanticModel};
use enumlint_syntax::{EnumId, SourceFile, parse_source_file};

fn parse(source: &str) -> SourceFile {
    let result = parse_source_file("test.cs", source);
    assert!(
        result.diagnostics.is_empty(),
        "unexpected parse diagnostics: {:?}",
        result.diagnostics
    );
    result.file
}

/// Values of every member of the enum named `enum_name`.
fn values(source: &str, enum_name: &str) -> Vec<Result<i64, EvalError>> {
    let file = parse(source);
    let model = SemanticModel::new(&file);
    let decl = file
        .enums
        .iter()
        .find(|e| e.name.text == enum_name)
        .expect("enum exists");
    (0..decl.members.len())
        .map(|i| model.member_value(decl.id, i))
        .collect()
}

fn value_of(initializer: &str) -> Result<i64, EvalError> {
    let source = format!("enum E {{ M = {initializer} }}");
    let file = parse(&source);
    let model = SemanticModel::new(&file);
    let decl = &file.enums[0];
    let expr = decl.members[0].value().expect("initializer");
    model.evaluate(decl, expr)
}

#[test]
fn test_literals_and_arithmetic() {
    assert_eq!(value_of("42"), Ok(42));
    assert_eq!(value_of("0x10 | 0b1"), Ok(17));
    assert_eq!(value_of("1 + 2 * 3"), Ok(7));
    assert_eq!(value_of("(1 + 2) * 3"), Ok(9));
    assert_eq!(value_of("-7 / 2"), Ok(-3));
    assert_eq!(value_of("-7 % 2"), Ok(-1));
    assert_eq!(value_of("~0"), Ok(-1));
    assert_eq!(value_of("6 & 3 ^ 1"), Ok(3));
    assert_eq!(value_of("'A'"), Ok(65));
}

#[test]
fn test_shifts_mask_the_count() {
    assert_eq!(value_of("1 << 4"), Ok(16));
    assert_eq!(value_of("1 << 64"), Ok(1));
    assert_eq!(value_of("-16 >> 2"), Ok(-4));
}

#[test]
fn test_overflow_and_division_errors() {
    assert_eq!(value_of("9223372036854775807 + 1"), Err(EvalError::Overflow));
    assert_eq!(value_of("18446744073709551615"), Err(EvalError::Overflow));
    assert_eq!(value_of("-9223372036854775808"), Ok(i64::MIN));
    assert_eq!(value_of("1 / 0"), Err(EvalError::DivisionByZero));
    assert_eq!(value_of("1 % (2 - 2)"), Err(EvalError::DivisionByZero));
}

#[test]
fn test_non_integer_initializers_are_errors() {
    assert!(matches!(value_of("1.5"), Err(EvalError::NotAnInteger(_))));
    assert!(matches!(value_of("\"x\""), Err(EvalError::NotAnInteger(_))));
    assert!(matches!(value_of("!A"), Err(EvalError::NotAnInteger(_))));
    assert_eq!(value_of("Compute()"), Err(EvalError::Unsupported));
    assert_eq!(
        value_of("Missing"),
        Err(EvalError::UnknownName("Missing".to_string()))
    );
}

#[test]
fn test_integral_casts_are_range_checked() {
    assert_eq!(value_of("(byte)255"), Ok(255));
    assert_eq!(
        value_of("(byte)256"),
        Err(EvalError::OutOfRange {
            value: 256,
            type_name: "byte".to_string()
        })
    );
    assert_eq!(value_of("(System.Int16)(-5)"), Ok(-5));
    assert!(matches!(value_of("(uint)-1"), Err(EvalError::OutOfRange { .. })));
}

#[test]
fn test_unchecked_context_truncates() {
    assert_eq!(value_of("unchecked((byte)256)"), Ok(0));
    assert_eq!(value_of("unchecked((sbyte)200)"), Ok(-56));
    assert_eq!(value_of("unchecked((int)0xFFFFFFFF)"), Ok(-1));
    assert_eq!(
        value_of("unchecked(9223372036854775807 + 1)"),
        Ok(i64::MIN)
    );
    assert_eq!(
        value_of("checked(9223372036854775807 + 1)"),
        Err(EvalError::Overflow)
    );
}

#[test]
fn test_non_integral_casts_keep_the_value() {
    assert_eq!(value_of("(Other)3"), Ok(3));
}

#[test]
fn test_implicit_members_count_from_previous() {
    let source = "enum E { A, B, C = 10, D, E2 }";
    assert_eq!(values(source, "E"), vec![Ok(0), Ok(1), Ok(10), Ok(11), Ok(12)]);
}

#[test]
fn test_same_enum_member_references() {
    let source = "enum E { A = 4, B, C = B * 2, D = E.A + C }";
    assert_eq!(values(source, "E"), vec![Ok(4), Ok(5), Ok(10), Ok(14)]);
}

#[test]
fn test_forward_reference_to_implicit_member() {
    let source = "enum E { A = C, B = 7, C }";
    assert_eq!(values(source, "E"), vec![Ok(8), Ok(7), Ok(8)]);
}

#[test]
fn test_other_enum_and_const_references() {
    let source = r#"
namespace App
{
    static class Limits
    {
        public const int Base = 100;
        public const long Step = Base / 10;
    }

    enum Other { X = 3, Y }

    enum Target
    {
        A = Other.Y,
        B = App.Other.X + Limits.Base,
        C = Limits.Step,
    }
}
"#;
    assert_eq!(values(source, "Target"), vec![Ok(4), Ok(103), Ok(10)]);
}

#[test]
fn test_simple_const_name_visible_from_enclosing_type() {
    let source = r#"
class Holder
{
    const int Offset = 5;
    enum Nested { A = Offset, B = Offset + 1 }
}
"#;
    assert_eq!(values(source, "Nested"), vec![Ok(5), Ok(6)]);
}

#[test]
fn test_enum_member_shadows_const() {
    let source = r#"
class Holder
{
    const int A = 50;
    enum E { A = 1, B = A }
}
"#;
    assert_eq!(values(source, "E"), vec![Ok(1), Ok(1)]);
}

#[test]
fn test_ambiguous_const_is_an_error() {
    let source = r#"
class One { public const int X = 1; }
class Two { public const int X = 2; }
enum E { A = X }
"#;
    assert_eq!(
        values(source, "E"),
        vec![Err(EvalError::AmbiguousName("X".to_string()))]
    );
}

#[test]
fn test_cycles_are_errors() {
    let source = "enum E { A = B, B = A, C = C + 1 }";
    let result = values(source, "E");
    assert!(matches!(result[0], Err(EvalError::Cycle(_))));
    assert!(matches!(result[1], Err(EvalError::Cycle(_))));
    assert!(matches!(result[2], Err(EvalError::Cycle(_))));
}

#[test]
fn test_const_cycle_through_enum() {
    let source = r#"
class C
{
    const int K = (int)E.A;
    enum E { A = K }
}
"#;
    assert!(matches!(values(source, "E")[0], Err(EvalError::Cycle(_))));
}

#[test]
fn test_using_alias_in_member_reference() {
    let source = r#"
using Colors = Palette.Color;
namespace Palette { enum Color { Red = 2 } }
enum E { A = Colors.Red }
"#;
    assert_eq!(values(source, "E"), vec![Ok(2)]);
}

#[test]
fn test_typed_const_is_range_checked() {
    let source = "class C { const byte Big = 300; } enum E { A = C.Big }";
    assert!(matches!(
        values(source, "E")[0],
        Err(EvalError::OutOfRange { .. })
    ));
}

#[test]
fn test_member_value_out_of_bounds_is_malformed() {
    let file = parse("enum E { A }");
    let model = SemanticModel::new(&file);
    assert_eq!(model.member_value(EnumId(0), 5), Err(EvalError::Malformed));
    assert_eq!(model.member_value(EnumId(3), 0), Err(EvalError::Malformed));
}

#[test]
fn test_long_reference_chains_use_the_cache() {
    // Evaluated in declaration order, each link is one cached lookup deep.
    let mut source = String::from("enum E { M0 = 0");
    for i in 1..2_000 {
        source.push_str(&format!(", M{i} = M{} + 1", i - 1));
    }
    source.push_str(" }");
    let file = parse(&source);
    let model = SemanticModel::new(&file);
    let decl = &file.enums[0];
    for (i, member) in decl.members.iter().enumerate() {
        let expr = member.value().expect("initializer");
        assert_eq!(model.evaluate(decl, expr), Ok(i as i64));
    }
}

fn parse_named(file_name: &str, source: &str) -> SourceFile {
    let result = parse_source_file(file_name, source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    result.file
}

#[test]
fn test_project_index_resolves_other_files() {
    let limits = parse_named(
        "Limits.cs",
        "namespace App { static class Limits { public const int Max = 5; } enum Base { First = 40 } }",
    );
    let helpers = parse_named(
        "Helpers.cs",
        "using L = App.Limits; namespace App { static class Derived { public const int Twice = L.Max * 2; } }",
    );
    let status = parse_named(
        "Status.cs",
        "namespace App { enum Status { A = Limits.Max, B = Derived.Twice, C = Base.First + 2 } }",
    );
    let project = ProjectIndex::new([&limits, &helpers, &status]);
    assert_eq!(project.len(), 3);

    let model = SemanticModel::with_project(&status, &project);
    let decl = &status.enums[0];
    let got: Vec<Result<i64, EvalError>> = (0..decl.members.len())
        .map(|i| model.member_value(decl.id, i))
        .collect();
    assert_eq!(got, vec![Ok(5), Ok(10), Ok(42)]);

    // Without the index the other files are invisible.
    let alone = SemanticModel::new(&status);
    assert_eq!(
        alone.member_value(decl.id, 0),
        Err(EvalError::UnknownName("Limits.Max".to_string()))
    );
}

#[test]
fn test_project_index_skips_stale_copy_of_checked_file() {
    let stale = parse_named("Status.cs", "enum Other { X = 1 } enum Status { A = 1 }");
    let current = parse_named("Status.cs", "enum Status { A = Other.X }");
    let project = ProjectIndex::new([&stale]);
    let model = SemanticModel::with_project(&current, &project);
    assert_eq!(
        model.member_value(current.enums[0].id, 0),
        Err(EvalError::UnknownName("Other.X".to_string()))
    );
}

#[test]
fn test_duplicate_declarations_across_files_are_ambiguous() {
    let a = parse_named("A.cs", "namespace N { class K { public const int V = 1; } }");
    let b = parse_named("B.cs", "namespace N { class K { public const int V = 2; } }");
    let user = parse_named("User.cs", "namespace N { enum E { M = K.V } }");
    let project = ProjectIndex::new([&a, &b, &user]);
    let model = SemanticModel::with_project(&user, &project);
    let decl = &user.enums[0];
    let expr = decl.members[0].value().expect("initializer");
    assert_eq!(
        model.evaluate(decl, expr),
        Err(EvalError::AmbiguousName("K.V".to_string()))
    );
}
