use clap::{Parser, ValueEnum};
use enumlint_common::DiagnosticCategory;
use std::path::PathBuf;

/// CLI arguments for the enumlint binary.
#[derive(Parser, Debug)]
#[command(
    name = "enumlint",
    version,
    about = "Report duplicate values in enums marked as unique"
)]
pub struct CliArgs {
    /// Files or directories to check. Defaults to the config's `include`, then the current directory.
    pub paths: Vec<PathBuf>,

    /// Rewrite each flagged member to a fresh value and save the files.
    #[arg(long)]
    pub fix: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Path to an enumlint.json file. Searched upwards from the current directory when omitted.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Name of the annotation that opts an enum in (without the `Attribute` suffix).
    #[arg(long)]
    pub annotation: Option<String>,

    /// String argument the annotation must carry.
    #[arg(long)]
    pub token: Option<String>,

    /// Diagnostic code to report.
    #[arg(long = "rule-id")]
    pub rule_id: Option<String>,

    /// Severity of reported diagnostics.
    #[arg(long, value_enum, ignore_case = true)]
    pub severity: Option<Severity>,

    /// File extensions to check (repeatable or comma separated).
    #[arg(long = "extension", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Glob patterns of paths to skip (repeatable).
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Enable color and source snippets in text output.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub pretty: Option<bool>,

    /// Disable color and source snippets in text output.
    #[arg(long = "no-pretty", conflicts_with = "pretty")]
    pub no_pretty: bool,

    /// Number of worker threads used to check files.
    #[arg(long)]
    pub threads: Option<usize>,
}

impl CliArgs {
    /// Explicit pretty setting, if any flag asked for one.
    #[must_use]
    pub fn pretty(&self) -> Option<bool> {
        if self.no_pretty {
            Some(false)
        } else {
            self.pretty
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Severity {
    Error,
    Warning,
    Suggestion,
    Message,
}

impl From<Severity> for DiagnosticCategory {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => DiagnosticCategory::Error,
            Severity::Warning => DiagnosticCategory::Warning,
            Severity::Suggestion => DiagnosticCategory::Suggestion,
            Severity::Message => DiagnosticCategory::Message,
        }
    }
}
