use clap::Parser;

use super::args::{CliArgs, OutputFormat, Severity};

#[test]
fn parses_defaults() {
    let args = CliArgs::try_parse_from(["enumlint"]).expect("default args should parse");

    assert!(args.paths.is_empty());
    assert!(!args.fix);
    assert_eq!(args.format, OutputFormat::Text);
    assert!(args.config.is_none());
    assert!(args.severity.is_none());
    assert!(args.extensions.is_empty());
    assert_eq!(args.pretty(), None);
    assert_eq!(args.threads, None);
}

#[test]
fn parses_common_flags() {
    let args = CliArgs::try_parse_from([
        "enumlint",
        "--fix",
        "--format",
        "json",
        "--config",
        "tools/enumlint.json",
        "--annotation",
        "Unique",
        "--token",
        "strict",
        "--rule-id",
        "DUP1",
        "--severity",
        "WARNING",
        "--extension",
        "cs,csx",
        "--exclude",
        "**/obj/**",
        "--threads",
        "4",
        "src",
        "Models/Status.cs",
    ])
    .expect("flagged args should parse");

    assert!(args.fix);
    assert_eq!(args.format, OutputFormat::Json);
    assert_eq!(
        args.config.as_deref(),
        Some(std::path::Path::new("tools/enumlint.json"))
    );
    assert_eq!(args.annotation.as_deref(), Some("Unique"));
    assert_eq!(args.token.as_deref(), Some("strict"));
    assert_eq!(args.rule_id.as_deref(), Some("DUP1"));
    assert_eq!(args.severity, Some(Severity::Warning));
    assert_eq!(args.extensions, vec!["cs", "csx"]);
    assert_eq!(args.exclude, vec!["**/obj/**"]);
    assert_eq!(args.threads, Some(4));
    assert_eq!(
        args.paths,
        vec![
            std::path::PathBuf::from("src"),
            std::path::PathBuf::from("Models/Status.cs")
        ]
    );
}

#[test]
fn parses_pretty_switches() {
    let args = CliArgs::try_parse_from(["enumlint", "--pretty", "src"]).expect("pretty");
    assert_eq!(args.pretty(), Some(true));
    assert_eq!(args.paths, vec![std::path::PathBuf::from("src")]);

    let args = CliArgs::try_parse_from(["enumlint", "--pretty=false"]).expect("pretty=false");
    assert_eq!(args.pretty(), Some(false));

    let args = CliArgs::try_parse_from(["enumlint", "--no-pretty"]).expect("no-pretty");
    assert_eq!(args.pretty(), Some(false));

    assert!(CliArgs::try_parse_from(["enumlint", "--pretty", "--no-pretty"]).is_err());
}

#[test]
fn rejects_unknown_format() {
    assert!(CliArgs::try_parse_from(["enumlint", "--format", "xml"]).is_err());
}
