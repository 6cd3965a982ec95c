use anyhow::{Context, Result, anyhow, bail};
use enumlint_checker::{OptInMarker, RuleDescriptor};
use enumlint_common::DiagnosticCategory;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::args::CliArgs;

pub const CONFIG_FILE_NAME: &str = "enumlint.json";
pub const DEFAULT_EXTENSIONS: &[&str] = &["cs"];

/// On-disk `enumlint.json`. Comments and trailing commas are accepted.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnumlintConfig {
    /// Files or directories to check, relative to the config file.
    #[serde(default)]
    pub include: Option<Vec<String>>,
    /// Glob patterns of paths to skip.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub rule: Option<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub annotation: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Namespace a qualified annotation name must live in. Empty accepts any.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
}

/// What the driver walks and how it treats the files it finds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOptions {
    pub roots: Vec<PathBuf>,
    /// Extensions without the leading dot.
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub fix: bool,
    pub threads: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub rule: RuleDescriptor,
    pub driver: DriverOptions,
    /// The config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
}

pub fn parse_config(source: &str) -> Result<EnumlintConfig> {
    let normalized = strip_jsonc(source);
    let config = serde_json::from_str(&normalized).context("failed to parse enumlint JSON")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<EnumlintConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse_config(&source).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// Nearest `enumlint.json` in `start` or one of its ancestors.
#[must_use]
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Merge the config file (explicit or discovered) with command-line flags.
/// Flags win over file values; excludes from both are combined.
pub fn resolve_options(args: &CliArgs, cwd: &Path) -> Result<ResolvedOptions> {
    let config_path = match &args.config {
        Some(path) => {
            let path = cwd.join(path);
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            Some(path)
        }
        None => find_config(cwd),
    };

    let config = match &config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(path)?
        }
        None => EnumlintConfig::default(),
    };
    let base_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(cwd);

    let rule = resolve_rule(config.rule.as_ref(), args)?;

    let roots = if !args.paths.is_empty() {
        args.paths.iter().map(|p| cwd.join(p)).collect()
    } else if let Some(include) = config.include.as_ref().filter(|i| !i.is_empty()) {
        include.iter().map(|p| base_dir.join(p)).collect()
    } else {
        vec![cwd.to_path_buf()]
    };

    let extensions = if !args.extensions.is_empty() {
        normalize_extensions(&args.extensions)
    } else if let Some(extensions) = &config.extensions {
        normalize_extensions(extensions)
    } else {
        DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
    };
    if extensions.is_empty() {
        bail!("no file extensions to check");
    }

    let mut exclude = config.exclude.unwrap_or_default();
    exclude.extend(args.exclude.iter().cloned());

    if args.threads == Some(0) {
        bail!("--threads must be at least 1");
    }

    Ok(ResolvedOptions {
        rule,
        driver: DriverOptions {
            roots,
            extensions,
            exclude,
            fix: args.fix,
            threads: args.threads,
        },
        config_path,
    })
}

fn resolve_rule(config: Option<&RuleConfig>, args: &CliArgs) -> Result<RuleDescriptor> {
    let mut rule = RuleDescriptor::default();
    let mut marker = OptInMarker::default();

    if let Some(config) = config {
        if let Some(id) = &config.id {
            rule = rule.with_id(id.clone());
        }
        if let Some(severity) = &config.severity {
            let severity = severity
                .parse::<DiagnosticCategory>()
                .map_err(|err| anyhow!(err))
                .context("invalid rule.severity")?;
            rule = rule.with_severity(severity);
        }
        if let Some(message) = &config.message {
            rule = rule.with_message_template(message.clone());
        }
        if let Some(annotation) = &config.annotation {
            marker.annotation = annotation.clone();
        }
        if let Some(token) = &config.token {
            marker.token = token.clone();
        }
        if let Some(namespace) = &config.namespace {
            marker.namespace = Some(namespace.clone()).filter(|ns| !ns.is_empty());
        }
        if let Some(aliases) = &config.aliases {
            marker.aliases = aliases.clone();
        }
    }

    if let Some(id) = &args.rule_id {
        rule = rule.with_id(id.clone());
    }
    if let Some(severity) = args.severity {
        rule = rule.with_severity(severity.into());
    }
    if let Some(annotation) = &args.annotation {
        marker.annotation = annotation.clone();
    }
    if let Some(token) = &args.token {
        marker.token = token.clone();
    }

    if rule.id.trim().is_empty() {
        bail!("rule id must not be empty");
    }
    if marker.annotation.trim().is_empty() {
        bail!("annotation name must not be empty");
    }

    Ok(rule.with_marker(marker))
}

fn normalize_extensions(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = values
        .iter()
        .map(|value| value.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Drop `//` and `/* */` comments and trailing commas so the text parses as
/// plain JSON. String contents are left untouched.
fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;
    // Index in `out` of a comma that may turn out to be trailing.
    let mut pending_comma: Option<usize> = None;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            '}' | ']' => {
                if let Some(index) = pending_comma.take() {
                    out.replace_range(index..=index, " ");
                }
                out.push(ch);
            }
            ',' => {
                pending_comma = Some(out.len());
                out.push(ch);
            }
            _ => {
                if !ch.is_whitespace() {
                    pending_comma = None;
                }
                if ch == '"' {
                    in_string = true;
                }
                out.push(ch);
            }
        }
    }

    out
}
