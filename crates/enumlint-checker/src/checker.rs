//! File-level driver: runs the detector over every enum of a parsed file and
//! turns findings into diagnostics.

use enumlint_common::{CancellationToken, Diagnostic, format_message};
use enumlint_syntax::SourceFile;

use crate::detector::{DuplicateFinding, find_duplicate};
use crate::evaluator::{ConstantEvaluator, ProjectIndex, SemanticModel};
use crate::rule::{MAX_VALUE_PROPERTY, MEMBER_NAME_PROPERTY, RuleDescriptor};

/// Result of checking one file.
#[derive(Clone, Debug, Default)]
pub struct FileCheck {
    pub findings: Vec<DuplicateFinding>,
    pub diagnostics: Vec<Diagnostic>,
    /// Set when cancellation stopped the walk before the last declaration.
    pub cancelled: bool,
}

pub struct Checker<'r> {
    rule: &'r RuleDescriptor,
    cancellation: Option<CancellationToken>,
}

impl<'r> Checker<'r> {
    #[must_use]
    pub fn new(rule: &'r RuleDescriptor) -> Self {
        Checker {
            rule,
            cancellation: None,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    #[must_use]
    pub fn rule(&self) -> &'r RuleDescriptor {
        self.rule
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Check every enum in `file` with a fresh `SemanticModel`.
    #[must_use]
    pub fn check_file(&self, file: &SourceFile) -> FileCheck {
        let model = SemanticModel::new(file);
        self.check_file_with(file, &model)
    }

    /// Check every enum in `file`, resolving references into `project`.
    #[must_use]
    pub fn check_file_in_project(
        &self,
        file: &SourceFile,
        project: &ProjectIndex<'_>,
    ) -> FileCheck {
        let model = SemanticModel::with_project(file, project);
        self.check_file_with(file, &model)
    }

    /// Check every enum in `file` with a caller-provided evaluator.
    pub fn check_file_with<E>(&self, file: &SourceFile, evaluator: &E) -> FileCheck
    where
        E: ConstantEvaluator + ?Sized,
    {
        let mut result = FileCheck::default();

        for decl in &file.enums {
            // Cancellation is honored between declarations only.
            if self.is_cancelled() {
                tracing::debug!(file = %file.file_name, "check cancelled");
                result.cancelled = true;
                break;
            }

            if let Some(finding) = find_duplicate(decl, evaluator, &self.rule.marker) {
                tracing::debug!(
                    file = %file.file_name,
                    enum_name = %finding.enum_name,
                    member = %finding.member_name,
                    value = finding.value,
                    max_value = finding.max_value,
                    "duplicate enum value"
                );
                result
                    .diagnostics
                    .push(self.diagnostic_for(&file.file_name, &finding));
                result.findings.push(finding);
            }
        }

        result
    }

    /// Serialize a finding at the diagnostic boundary.
    #[must_use]
    pub fn diagnostic_for(&self, file_name: &str, finding: &DuplicateFinding) -> Diagnostic {
        let message = format_message(&self.rule.message_template, &[&finding.member_name]);
        Diagnostic::new(
            self.rule.severity,
            file_name,
            finding.member_span.start,
            finding.member_span.len(),
            message,
            self.rule.id.clone(),
        )
        .with_property(MAX_VALUE_PROPERTY, finding.max_value.to_string())
        .with_property(MEMBER_NAME_PROPERTY, finding.member_name.clone())
    }
}
