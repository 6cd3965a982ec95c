//! Fix-all and text change application.

use enumlint_checker::{Checker, ProjectIndex, RuleDescriptor};
use enumlint_fixes::{
    AppliedFix, CodeFixPosition, CodeFixProvider, CodeFixTextChange, FailedFix, FixError,
    apply_text_changes, fix_all, fix_all_in_project,
};
use enumlint_syntax::parse_source_file;

const MARK: &str = "[Description(\"UniqueEnum\")]";

fn is_clean(source: &str) -> bool {
    let file = parse_source_file("t.cs", source).file;
    Checker::new(&RuleDescriptor::default())
        .check_file(&file)
        .diagnostics
        .is_empty()
}

#[test]
fn test_single_fix_round_trip() {
    let source = format!("{MARK}\nenum E {{ A = 5, B, C = 5 }}");
    let rule = RuleDescriptor::default();
    let file = parse_source_file("t.cs", &source).file;
    let diag = Checker::new(&rule).check_file(&file).diagnostics.remove(0);

    let info = CodeFixProvider::new(&rule)
        .code_fix(&diag, &source)
        .expect("fix");
    let fixed = apply_text_changes(&source, &info.changes[0].text_changes).expect("apply");

    assert_eq!(fixed, format!("{MARK}\nenum E {{ A = 5, B, C = 7 }}"));
    assert!(is_clean(&fixed));
}

#[test]
fn test_fix_all_fixes_every_collision_in_order() {
    let source = format!("{MARK}\nenum E {{ A = 1, B = 1, C = 2, D = 2, E2 = 40 }}");
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());

    assert_eq!(
        result.text,
        format!("{MARK}\nenum E {{ A = 1, B = 41, C = 2, D = 42, E2 = 40 }}")
    );
    assert_eq!(
        result.applied,
        vec![
            AppliedFix {
                enum_name: "E".to_string(),
                member_name: "B".to_string(),
                old_value: 1,
                new_value: 41,
            },
            AppliedFix {
                enum_name: "E".to_string(),
                member_name: "D".to_string(),
                old_value: 2,
                new_value: 42,
            },
        ]
    );
    assert!(is_clean(&result.text));
}

#[test]
fn test_fix_all_sees_implicit_values_shift() {
    // A = 0, B = 1, C = 0, D = 1
    let source = format!("{MARK}\nenum E {{ A, B, C = 0, D }}");
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());

    // C becomes 2, which moves D to 3; nothing else collides.
    assert_eq!(
        result.text,
        format!("{MARK}\nenum E {{ A, B, C = 2, D }}")
    );
    assert_eq!(result.applied.len(), 1);
}

#[test]
fn test_fix_all_covers_several_enums() {
    let source = format!(
        "{MARK} enum First {{ A, B = 0 }}\nenum Skipped {{ A, B = 0 }}\n{MARK} enum Second {{ X = 3, Y = 3 }}"
    );
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());

    assert_eq!(
        result.text,
        format!(
            "{MARK} enum First {{ A, B = 1 }}\nenum Skipped {{ A, B = 0 }}\n{MARK} enum Second {{ X = 3, Y = 4 }}"
        )
    );
    let names: Vec<&str> = result
        .applied
        .iter()
        .map(|fix| fix.enum_name.as_str())
        .collect();
    assert_eq!(names, vec!["First", "Second"]);
}

#[test]
fn test_clean_file_is_unchanged() {
    let source = format!("{MARK}\nenum E {{ A, B, C }}");
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());
    assert!(!result.changed());
    assert_eq!(result.text, source);
}

#[test]
fn test_fix_all_is_idempotent() {
    let source = format!("{MARK}\nenum E {{ A = 3, B = 3, C = 3 }}");
    let rule = RuleDescriptor::default();
    let first = fix_all("t.cs", &source, &rule);
    let second = fix_all("t.cs", &first.text, &rule);

    assert_eq!(first.applied.len(), 2);
    assert!(!second.changed());
    assert_eq!(second.text, first.text);
}

#[test]
fn test_fix_all_gives_up_on_self_chasing_references() {
    // Every fix of C drags A along with it.
    let source = format!("{MARK}\nenum E {{ A = C, B = 1, C = 1 }}");
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());

    assert_eq!(result.text, source);
    assert!(!result.changed());
    assert_eq!(
        result.failed,
        vec![FailedFix {
            enum_name: "E".to_string(),
            member_name: "C".to_string(),
            error: FixError::TooManyPasses(3),
        }]
    );
}

#[test]
fn test_fix_all_keeps_fixing_after_a_non_converging_enum() {
    let source = format!("{MARK} enum Bad {{ A = C, B = 1, C = 1 }} {MARK} enum Good {{ X = 3, Y = 3 }}");
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());

    assert_eq!(
        result.text,
        format!("{MARK} enum Bad {{ A = C, B = 1, C = 1 }} {MARK} enum Good {{ X = 3, Y = 4 }}")
    );
    assert_eq!(
        result.applied,
        vec![AppliedFix {
            enum_name: "Good".to_string(),
            member_name: "Y".to_string(),
            old_value: 3,
            new_value: 4,
        }]
    );
    let failed: Vec<&str> = result.failed.iter().map(|f| f.enum_name.as_str()).collect();
    assert_eq!(failed, vec!["Bad"]);
}

#[test]
fn test_fix_all_keeps_fixing_after_an_overflowing_enum() {
    let source = format!(
        "{MARK} enum Big : long {{ A = 9223372036854775807, B = 9223372036854775807 }}\n{MARK} enum Good {{ X = 3, Y = 3 }}"
    );
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());

    assert!(result.text.contains("enum Good { X = 3, Y = 4 }"));
    assert!(result.text.contains("B = 9223372036854775807 }"));
    assert_eq!(result.applied.len(), 1);
    assert_eq!(
        result.failed,
        vec![FailedFix {
            enum_name: "Big".to_string(),
            member_name: "B".to_string(),
            error: FixError::ValueOverflow {
                max_value: i64::MAX
            },
        }]
    );
}

#[test]
fn test_fix_all_leaves_conditional_enum_alone() {
    let source = format!("{MARK}\nenum E {{\n#if NET8\n  A = 1,\n#else\n  A = 1,\n#endif\n  B = 1 }}");
    let result = fix_all("t.cs", &source, &RuleDescriptor::default());
    assert_eq!(result.text, source);
    assert!(!result.changed());
    assert!(result.failed.is_empty());
}

#[test]
fn test_fix_all_in_project_sees_other_files() {
    let limits = parse_source_file(
        "Limits.cs",
        "static class Limits { public const int Max = 7; }",
    )
    .file;
    let source = format!("{MARK}\nenum E {{ A = Limits.Max, B = 7 }}");
    let stale = parse_source_file("t.cs", &source).file;
    let project = ProjectIndex::new([&limits, &stale]);

    let rule = RuleDescriptor::default();
    let result = fix_all_in_project("t.cs", &source, &rule, &project);
    assert_eq!(result.text, format!("{MARK}\nenum E {{ A = Limits.Max, B = 8 }}"));
    assert!(result.failed.is_empty());

    // Alone, `Limits.Max` is unknown and the enum is not judged.
    assert!(!fix_all("t.cs", &source, &rule).changed());
}

#[test]
fn test_apply_text_changes_back_to_front() {
    let source = "line one\nline two";
    let changes = vec![
        CodeFixTextChange {
            start: CodeFixPosition { line: 1, offset: 1 },
            end: CodeFixPosition { line: 1, offset: 5 },
            new_text: "LINE".to_string(),
        },
        CodeFixTextChange {
            start: CodeFixPosition { line: 2, offset: 6 },
            end: CodeFixPosition { line: 2, offset: 9 },
            new_text: "2".to_string(),
        },
    ];
    assert_eq!(
        apply_text_changes(source, &changes).expect("apply"),
        "LINE one\nline 2"
    );
}

#[test]
fn test_apply_text_changes_rejects_bad_positions() {
    let change = |line, offset| CodeFixTextChange {
        start: CodeFixPosition { line, offset },
        end: CodeFixPosition { line, offset },
        new_text: String::new(),
    };
    assert_eq!(
        apply_text_changes("abc", &[change(0, 1)]),
        Err(FixError::InvalidEdit)
    );
    assert_eq!(
        apply_text_changes("abc", &[change(4, 1)]),
        Err(FixError::InvalidEdit)
    );

    let reversed = CodeFixTextChange {
        start: CodeFixPosition { line: 1, offset: 3 },
        end: CodeFixPosition { line: 1, offset: 1 },
        new_text: String::new(),
    };
    assert_eq!(
        apply_text_changes("abc", &[reversed]),
        Err(FixError::InvalidEdit)
    );
}
