//! Applying code fix changes and the fix-all loop.

use enumlint_checker::{Checker, ProjectIndex, RuleDescriptor};
use enumlint_common::{LineMap, limits::MAX_FIX_ALL_PASSES};
use enumlint_syntax::{EnumId, parse_source_file};
use serde::Serialize;

use crate::code_fix::{CodeFixPosition, CodeFixTextChange};
use crate::error::FixError;
use crate::plan::plan_for_finding;

/// Apply text changes computed against `source`.
///
/// Changes are applied back to front so earlier offsets stay valid.
pub fn apply_text_changes(source: &str, changes: &[CodeFixTextChange]) -> Result<String, FixError> {
    let line_map = LineMap::build(source);
    let to_offset = |pos: CodeFixPosition| {
        pos.to_position()
            .and_then(|p| line_map.position_to_offset(p, source))
            .map(|o| o as usize)
            .ok_or(FixError::InvalidEdit)
    };

    let mut with_offsets = Vec::with_capacity(changes.len());
    for change in changes {
        let start = to_offset(change.start)?;
        let end = to_offset(change.end)?;
        if start > end || end > source.len() {
            return Err(FixError::InvalidEdit);
        }
        with_offsets.push((start, end, change));
    }

    with_offsets.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    let mut result = source.to_string();
    for (start, end, change) in with_offsets {
        result.replace_range(start..end, &change.new_text);
    }
    Ok(result)
}

/// One fix applied by `fix_all`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFix {
    pub enum_name: String,
    pub member_name: String,
    pub old_value: i64,
    pub new_value: i64,
}

/// An enum `fix_all` gave up on. Its text is left as it was before the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedFix {
    pub enum_name: String,
    /// The flagged member the failing pass was working on.
    pub member_name: String,
    pub error: FixError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixAllResult {
    pub text: String,
    pub applied: Vec<AppliedFix>,
    pub failed: Vec<FailedFix>,
}

impl FixAllResult {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Fixes made to one enum since work on it started, for rolling back.
struct EnumAttempt {
    enum_id: EnumId,
    enum_name: String,
    /// The member the latest pass worked on.
    member_name: String,
    snapshot: String,
    applied_len: usize,
    passes: u32,
    /// A converging enum needs at most one pass per member.
    budget: u32,
}

/// Fix every flagged member of every opted-in enum in `source`.
///
/// Each pass re-parses, re-detects and fixes a single member, so later
/// members are judged against values the earlier fixes produced. An enum
/// whose fix fails or does not converge within its pass budget is restored
/// and skipped; the other enums are still fixed.
#[must_use]
pub fn fix_all(file_name: &str, source: &str, rule: &RuleDescriptor) -> FixAllResult {
    fix_all_with(file_name, source, rule, None)
}

/// `fix_all` with references resolved against the declarations of `project`.
#[must_use]
pub fn fix_all_in_project(
    file_name: &str,
    source: &str,
    rule: &RuleDescriptor,
    project: &ProjectIndex<'_>,
) -> FixAllResult {
    fix_all_with(file_name, source, rule, Some(project))
}

fn fix_all_with(
    file_name: &str,
    source: &str,
    rule: &RuleDescriptor,
    project: Option<&ProjectIndex<'_>>,
) -> FixAllResult {
    let checker = Checker::new(rule);
    let mut result = FixAllResult {
        text: source.to_string(),
        ..FixAllResult::default()
    };
    let mut skipped: Vec<EnumId> = Vec::new();
    let mut attempt: Option<EnumAttempt> = None;

    for pass in 0..MAX_FIX_ALL_PASSES {
        let parsed = parse_source_file(file_name, &result.text);
        let check = match project {
            Some(project) => checker.check_file_in_project(&parsed.file, project),
            None => checker.check_file(&parsed.file),
        };
        let Some(finding) = check
            .findings
            .into_iter()
            .find(|finding| !skipped.contains(&finding.enum_id))
        else {
            tracing::debug!(
                file = file_name,
                passes = pass,
                failed = result.failed.len(),
                "fix-all converged"
            );
            return result;
        };

        // Enum ids stay stable: edits never add or remove enums.
        let decl = parsed.file.enum_decl(finding.enum_id);
        let mut current = match attempt.take() {
            Some(current) if current.enum_id == finding.enum_id => current,
            _ => EnumAttempt {
                enum_id: finding.enum_id,
                enum_name: finding.enum_name.clone(),
                member_name: String::new(),
                snapshot: result.text.clone(),
                applied_len: result.applied.len(),
                passes: 0,
                budget: decl.map_or(1, |decl| decl.members.len().max(1) as u32),
            },
        };

        current.member_name.clone_from(&finding.member_name);
        let outcome = if current.passes >= current.budget {
            Err(FixError::TooManyPasses(current.passes))
        } else {
            decl.ok_or_else(|| FixError::StaleTarget {
                member: finding.member_name.clone(),
                offset: finding.member_span.start,
            })
            .and_then(|decl| plan_for_finding(decl, &finding))
            .and_then(|plan| plan.apply(&result.text).map(|text| (plan, text)))
        };

        match outcome {
            Ok((plan, text)) => {
                tracing::trace!(
                    file = file_name,
                    pass,
                    enum_name = %finding.enum_name,
                    member = %plan.member_name,
                    new_value = plan.new_value,
                    "fix-all pass"
                );
                result.text = text;
                result.applied.push(AppliedFix {
                    enum_name: finding.enum_name,
                    member_name: plan.member_name,
                    old_value: finding.value,
                    new_value: plan.new_value,
                });
                attempt = Some(EnumAttempt {
                    passes: current.passes + 1,
                    ..current
                });
            }
            Err(error) => {
                tracing::warn!(
                    file = file_name,
                    enum_name = %finding.enum_name,
                    member = %finding.member_name,
                    %error,
                    "cannot fix enum; leaving it unchanged"
                );
                give_up(&mut result, current, error);
                skipped.push(finding.enum_id);
            }
        }
    }

    // Out of passes: keep the finished enums, restore the one in progress.
    if let Some(current) = attempt {
        tracing::warn!(
            file = file_name,
            enum_name = %current.enum_name,
            passes = MAX_FIX_ALL_PASSES,
            "fix-all ran out of passes"
        );
        give_up(&mut result, current, FixError::TooManyPasses(MAX_FIX_ALL_PASSES));
    }
    result
}

fn give_up(result: &mut FixAllResult, attempt: EnumAttempt, error: FixError) {
    result.text = attempt.snapshot;
    result.applied.truncate(attempt.applied_len);
    result.failed.push(FailedFix {
        enum_name: attempt.enum_name,
        member_name: attempt.member_name,
        error,
    });
}
