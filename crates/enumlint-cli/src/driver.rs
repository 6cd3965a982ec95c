use anyhow::{Context, Result, bail};
use enumlint_checker::{Checker, ProjectIndex, RuleDescriptor};
use enumlint_common::{Diagnostic, limits::MAX_SOURCE_FILE_BYTES};
use enumlint_fixes::{AppliedFix, CodeFixInfo, CodeFixProvider, fix_all_in_project};
use enumlint_syntax::{SourceFile, parse_source_file};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::DriverOptions;

/// Outcome of checking (and possibly fixing) one file.
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    /// The text diagnostics refer to: the fixed text after `--fix`.
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Code fixes offered for `diagnostics`, index-aligned.
    pub fixes: Vec<Option<CodeFixInfo>>,
    pub applied: Vec<AppliedFix>,
    /// One entry per enum `--fix` had to leave alone; its diagnostics still report.
    pub fix_errors: Vec<String>,
}

/// A file that could not be read or written.
#[derive(Debug, Clone)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub files: Vec<FileReport>,
    pub errors: Vec<FileError>,
}

impl RunResult {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|file| file.diagnostics.iter())
    }

    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.files.iter().map(|file| file.diagnostics.len()).sum()
    }

    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.files.iter().map(|file| file.applied.len()).sum()
    }
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build exclude patterns")
}

fn is_excluded(excludes: &GlobSet, root: &Path, path: &Path) -> bool {
    if excludes.is_empty() {
        return false;
    }
    excludes.is_match(path) || path.strip_prefix(root).is_ok_and(|rel| excludes.is_match(rel))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Collect the files to check, sorted and without duplicates.
///
/// Explicitly named files are taken regardless of extension; directories are
/// walked and filtered by extension. Excludes apply to both.
pub fn discover_files(options: &DriverOptions) -> Result<Vec<PathBuf>> {
    let excludes = build_exclude_set(&options.exclude)?;
    let mut files = Vec::new();

    for root in &options.roots {
        if root.is_file() {
            if !is_excluded(&excludes, root, root) {
                files.push(root.clone());
            }
            continue;
        }
        if !root.is_dir() {
            bail!("path does not exist: {}", root.display());
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_excluded(&excludes, root, entry.path()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && has_extension(entry.path(), &options.extensions) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(count = files.len(), "discovered files");
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn read_source(path: &Path) -> Result<String> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
    if metadata.len() > MAX_SOURCE_FILE_BYTES {
        bail!("file too large: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// A file read and parsed ahead of checking.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub text: String,
    pub file: SourceFile,
}

pub fn load_file(path: &Path) -> Result<LoadedFile> {
    let text = read_source(path)?;
    let parsed = parse_source_file(&display_name(path), &text);
    if !parsed.diagnostics.is_empty() {
        tracing::debug!(
            file = %path.display(),
            count = parsed.diagnostics.len(),
            "parse diagnostics"
        );
    }
    Ok(LoadedFile {
        path: path.to_path_buf(),
        text,
        file: parsed.file,
    })
}

/// Check one loaded file, running fix-all first when `fix` is set.
///
/// Initializers may reference declarations of any file in `project`.
pub fn process_file(
    input: &LoadedFile,
    rule: &RuleDescriptor,
    fix: bool,
    project: &ProjectIndex<'_>,
) -> Result<FileReport> {
    let file_name = input.file.file_name.as_str();
    let mut source = input.text.clone();
    let mut applied = Vec::new();
    let mut fix_errors = Vec::new();
    let mut reparsed = None;

    if fix {
        let result = fix_all_in_project(file_name, &source, rule, project);
        fix_errors = result
            .failed
            .iter()
            .map(|failed| format!("enum '{}': {}", failed.enum_name, failed.error))
            .collect();
        if result.changed() {
            std::fs::write(&input.path, &result.text)
                .with_context(|| format!("failed to write {}", input.path.display()))?;
            tracing::info!(file = %file_name, fixes = result.applied.len(), "wrote fixes");
            reparsed = Some(parse_source_file(file_name, &result.text).file);
            source = result.text;
            applied = result.applied;
        }
    }

    let file = reparsed.as_ref().unwrap_or(&input.file);
    let check = Checker::new(rule).check_file_in_project(file, project);

    let provider = CodeFixProvider::new(rule);
    let fixes = check
        .diagnostics
        .iter()
        .map(|diag| match provider.code_fix(diag, &source) {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::debug!(file = %file_name, error = %err, "no code fix");
                None
            }
        })
        .collect();

    Ok(FileReport {
        path: input.path.clone(),
        source,
        diagnostics: check.diagnostics,
        fixes,
        applied,
        fix_errors,
    })
}

/// Discover, load and check every file. Per-file I/O failures are collected
/// in `errors` rather than stopping the run.
///
/// All files are parsed before any is checked so that enum initializers can
/// reference constants declared elsewhere in the project.
pub fn run(rule: &RuleDescriptor, options: &DriverOptions) -> Result<RunResult> {
    let files = discover_files(options)?;

    let check_all = || -> Vec<(PathBuf, Result<FileReport>)> {
        let loads: Vec<Result<LoadedFile>> = files.par_iter().map(|path| load_file(path)).collect();
        let mut loaded = Vec::with_capacity(files.len());
        let mut outcomes = Vec::new();
        for (path, load) in files.iter().zip(loads) {
            match load {
                Ok(input) => loaded.push(input),
                Err(err) => outcomes.push((path.clone(), Err(err))),
            }
        }

        let project = ProjectIndex::new(loaded.iter().map(|input| &input.file));
        outcomes.par_extend(loaded.par_iter().map(|input| {
            (
                input.path.clone(),
                process_file(input, rule, options.fix, &project),
            )
        }));
        outcomes
    };

    let outcomes = match options.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("failed to start worker threads")?
            .install(check_all),
        None => check_all(),
    };

    let mut result = RunResult::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(report) => result.files.push(report),
            Err(err) => result.errors.push(FileError {
                path,
                message: format!("{err:#}"),
            }),
        }
    }
    result.files.sort_by(|a, b| a.path.cmp(&b.path));
    result.errors.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(result)
}
