use colored::Colorize;
use enumlint_checker::RuleDescriptor;
use enumlint_common::{Diagnostic, DiagnosticCategory, LineMap};
use enumlint_fixes::{AppliedFix, CodeFixInfo};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::driver::RunResult;

/// Renders diagnostics the way tsc does: `file:line:col - error CODE: message`
/// followed by the offending line and a tilde underline.
pub struct Reporter {
    color: bool,
    sources: FxHashMap<String, String>,
    line_maps: FxHashMap<String, LineMap>,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            sources: FxHashMap::default(),
            line_maps: FxHashMap::default(),
        }
    }

    /// Register the text diagnostics for `file` refer to.
    pub fn add_source(&mut self, file: impl Into<String>, source: impl Into<String>) {
        let file = file.into();
        let source = source.into();
        self.line_maps.insert(file.clone(), LineMap::build(&source));
        self.sources.insert(file, source);
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for (index, diagnostic) in diagnostics.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = match self.position_for(&diagnostic.file, diagnostic.start) {
            Some((line, column)) => self.paint_location(&format!(
                "{}:{}:{}",
                diagnostic.file, line, column
            )),
            None if !diagnostic.file.is_empty() => diagnostic.file.clone(),
            None => "<unknown>".to_string(),
        };

        output.push_str(" - ");
        output.push_str(&self.format_category(diagnostic.category));
        if !diagnostic.code.is_empty() {
            output.push(' ');
            output.push_str(&self.format_code(&diagnostic.code));
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if self.color
            && let Some(snippet) =
                self.format_snippet(&diagnostic.file, diagnostic.start, diagnostic.length)
        {
            output.push_str(&snippet);
        }

        output
    }

    /// Source line with the span underlined. Spans running past the end of
    /// the line are cut at the line end.
    fn format_snippet(&self, file: &str, start: u32, length: u32) -> Option<String> {
        if length == 0 {
            return None;
        }
        let source = self.sources.get(file)?;
        let line_map = self.line_maps.get(file)?;

        let position = line_map.offset_to_position(start, source);
        let line_start = line_map.line_start(position.line as usize)? as usize;
        let line_end = line_map
            .line_start(position.line as usize + 1)
            .map_or(source.len(), |next| next as usize);
        let line_text = source
            .get(line_start..line_end)?
            .trim_end_matches(['\r', '\n']);

        let span_start = (start as usize).saturating_sub(line_start);
        let span_end = (start as usize + length as usize).saturating_sub(line_start);

        let mut underline = String::new();
        for (offset, ch) in line_text.char_indices() {
            if offset >= span_end {
                break;
            }
            let width = if ch == '\t' { 4 } else { 1 };
            let mark = if offset < span_start { ' ' } else { '~' };
            for _ in 0..width {
                underline.push(mark);
            }
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let display_line = line_text.replace('\t', "    ");
        Some(format!(
            "\n  {:>3}   {}\n        {}",
            position.line + 1,
            display_line,
            underline.red()
        ))
    }

    fn position_for(&self, file: &str, offset: u32) -> Option<(u32, u32)> {
        let source = self.sources.get(file)?;
        let line_map = self.line_maps.get(file)?;
        let position = line_map.offset_to_position(offset, source);
        Some((position.line + 1, position.character + 1))
    }

    fn paint_location(&self, location: &str) -> String {
        if self.color {
            location.cyan().to_string()
        } else {
            location.to_string()
        }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.as_str();
        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: &str) -> String {
        if self.color {
            code.bright_blue().to_string()
        } else {
            code.to_string()
        }
    }

    /// Trailing summary, e.g. `Found 2 errors in 1 file.`
    #[must_use]
    pub fn summary(&self, result: &RunResult) -> String {
        let count = result.diagnostic_count();
        let files = result
            .files
            .iter()
            .filter(|file| !file.diagnostics.is_empty())
            .count();
        let mut out = String::new();

        let fixed = result.applied_count();
        if fixed > 0 {
            out.push_str(&format!(
                "Fixed {} {}.\n",
                fixed,
                plural(fixed, "enum member", "enum members")
            ));
        }
        if count > 0 {
            out.push_str(&format!(
                "Found {} {} in {} {}.\n",
                count,
                plural(count, "problem", "problems"),
                files,
                plural(files, "file", "files")
            ));
        }
        out
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

/// `--format json` payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    pub rule: JsonRule<'a>,
    pub diagnostics: Vec<JsonDiagnostic<'a>>,
    pub fixes_applied: Vec<JsonAppliedFix<'a>>,
    pub errors: Vec<JsonError>,
}

/// Metadata of the rule that produced the diagnostics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRule<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub severity: DiagnosticCategory,
}

impl<'a> From<&'a RuleDescriptor> for JsonRule<'a> {
    fn from(rule: &'a RuleDescriptor) -> Self {
        JsonRule {
            id: &rule.id,
            title: &rule.title,
            description: &rule.description,
            category: &rule.category,
            severity: rule.severity,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonDiagnostic<'a> {
    #[serde(flatten)]
    pub diagnostic: &'a Diagnostic,
    /// 1-based.
    pub line: u32,
    /// 1-based, UTF-16 columns.
    pub column: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<&'a CodeFixInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonAppliedFix<'a> {
    pub file: String,
    #[serde(flatten)]
    pub fix: &'a AppliedFix,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonError {
    pub file: String,
    pub message: String,
}

impl<'a> JsonReport<'a> {
    #[must_use]
    pub fn from_run(result: &'a RunResult, rule: &'a RuleDescriptor) -> Self {
        let mut diagnostics = Vec::new();
        let mut fixes_applied = Vec::new();

        for file in &result.files {
            let line_map = LineMap::build(&file.source);
            for (index, diagnostic) in file.diagnostics.iter().enumerate() {
                let position = line_map.offset_to_position(diagnostic.start, &file.source);
                diagnostics.push(JsonDiagnostic {
                    diagnostic,
                    line: position.line + 1,
                    column: position.character + 1,
                    fixes: file
                        .fixes
                        .get(index)
                        .and_then(Option::as_ref)
                        .into_iter()
                        .collect(),
                });
            }
            for fix in &file.applied {
                fixes_applied.push(JsonAppliedFix {
                    file: file.path.display().to_string(),
                    fix,
                });
            }
        }

        let errors = result
            .errors
            .iter()
            .map(|err| JsonError {
                file: err.path.display().to_string(),
                message: err.message.clone(),
            })
            .chain(result.files.iter().flat_map(|file| {
                file.fix_errors.iter().map(|message| JsonError {
                    file: file.path.display().to_string(),
                    message: message.clone(),
                })
            }))
            .collect();

        JsonReport {
            rule: JsonRule::from(rule),
            diagnostics,
            fixes_applied,
            errors,
        }
    }
}
