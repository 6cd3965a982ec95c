//! Tests for the opt-in marker in detector.rs

use crate::detector::OptInMarker;
use enumlint_syntax::parse_source_file;

fn opted_in(marker: &OptInMarker, source: &str) -> bool {
    let result = parse_source_file("test.cs", source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    marker.matches(&result.file.enums[0].attributes)
}

#[test]
fn test_default_marker_spellings() {
    let marker = OptInMarker::default();
    for source in [
        r#"[Description("UniqueEnum")] enum E { A }"#,
        r#"[DescriptionAttribute("UniqueEnum")] enum E { A }"#,
        r#"[System.ComponentModel.Description("UniqueEnum")] enum E { A }"#,
        r#"[global::System.ComponentModel.DescriptionAttribute("UniqueEnum")] enum E { A }"#,
        r#"[type: Description("UniqueEnum")] enum E { A }"#,
        r#"[Flags, Description("UniqueEnum")] enum E { A }"#,
        r#"[Flags][Description("UniqueEnum")] enum E { A }"#,
        r#"[Description(description: "UniqueEnum")] enum E { A }"#,
        r#"[Description(@"UniqueEnum")] enum E { A }"#,
        r#"[Description(("UniqueEnum"))] enum E { A }"#,
    ] {
        assert!(opted_in(&marker, source), "should opt in: {source}");
    }
}

#[test]
fn test_using_alias_is_resolved() {
    let marker = OptInMarker::default();
    let source = r#"
using Desc = System.ComponentModel.DescriptionAttribute;
[Desc("UniqueEnum")]
enum E { A }
"#;
    assert!(opted_in(&marker, source));
}

#[test]
fn test_near_misses_do_not_opt_in() {
    let marker = OptInMarker::default();
    for source in [
        "enum E { A }",
        r#"[Description("uniqueenum")] enum E { A }"#,
        r#"[Description("UniqueEnum ")] enum E { A }"#,
        r#"[Description] enum E { A }"#,
        r#"[Description(UniqueEnum)] enum E { A }"#,
        r#"[Display("UniqueEnum")] enum E { A }"#,
        r#"[Other.Namespace.Description("UniqueEnum")] enum E { A }"#,
        r#"[Description($"Unique{Suffix}")] enum E { A }"#,
        r#"[Attribute("UniqueEnum")] enum E { A }"#,
    ] {
        assert!(!opted_in(&marker, source), "should not opt in: {source}");
    }
}

#[test]
fn test_attributes_on_members_do_not_opt_in_the_enum() {
    let marker = OptInMarker::default();
    assert!(!opted_in(
        &marker,
        r#"enum E { [Description("UniqueEnum")] A, B = 0 }"#
    ));
}

#[test]
fn test_custom_annotation_and_token() {
    let marker = OptInMarker::new("Unique", "strict").with_namespace(None);
    assert!(opted_in(&marker, r#"[Unique("strict")] enum E { A }"#));
    assert!(opted_in(&marker, r#"[My.Lib.UniqueAttribute("strict")] enum E { A }"#));
    assert!(!opted_in(&marker, r#"[Description("UniqueEnum")] enum E { A }"#));
}

#[test]
fn test_marker_aliases() {
    let marker = OptInMarker::default().with_aliases(vec!["UniqueValues".to_string()]);
    assert!(opted_in(&marker, r#"[UniqueValues("UniqueEnum")] enum E { A }"#));
    assert!(opted_in(&marker, r#"[Description("UniqueEnum")] enum E { A }"#));
}
