//! Planning the single edit that makes a flagged member unique.
//!
//! The new value is always `max + 1`, where `max` is the largest value the
//! detector saw in the enum. An explicit initializer has its expression
//! replaced; an implicit member gets `= N` inserted after its name. Nothing
//! else in the declaration is touched.

use enumlint_checker::DuplicateFinding;
use enumlint_common::Span;
use enumlint_syntax::{EnumDeclaration, EnumMember};

use crate::error::FixError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixKind {
    /// Replace the existing initializer expression.
    Replace,
    /// Insert an initializer after the member name.
    Insert,
}

/// One planned edit against the text the member was parsed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixPlan {
    pub member_name: String,
    pub kind: FixKind,
    /// Empty for insertions.
    pub span: Span,
    pub new_text: String,
    pub new_value: i64,
}

impl FixPlan {
    /// Apply the plan to the text it was computed from.
    pub fn apply(&self, source: &str) -> Result<String, FixError> {
        let start = self.span.start as usize;
        let end = self.span.end as usize;
        if start > end || !source.is_char_boundary(start) || !source.is_char_boundary(end) {
            return Err(FixError::InvalidEdit);
        }
        let mut result = source.to_string();
        result.replace_range(start..end, &self.new_text);
        Ok(result)
    }
}

/// Plan the edit giving `member` the value `max_value + 1`.
pub fn plan_fix(member: &EnumMember, max_value: i64) -> Result<FixPlan, FixError> {
    let new_value = max_value
        .checked_add(1)
        .ok_or(FixError::ValueOverflow { max_value })?;

    let (kind, span, new_text) = match member.value() {
        Some(expr) => (FixKind::Replace, expr.span, new_value.to_string()),
        None => (
            FixKind::Insert,
            Span::at(member.name.span.end),
            format!(" = {new_value}"),
        ),
    };

    Ok(FixPlan {
        member_name: member.name.text.clone(),
        kind,
        span,
        new_text,
        new_value,
    })
}

/// Plan the fix for a finding produced from `decl`.
///
/// The finding's member index must still name the same member.
pub fn plan_for_finding(
    decl: &EnumDeclaration,
    finding: &DuplicateFinding,
) -> Result<FixPlan, FixError> {
    let member = decl
        .members
        .get(finding.member_index)
        .filter(|m| m.name.text == finding.member_name)
        .ok_or_else(|| FixError::StaleTarget {
            member: finding.member_name.clone(),
            offset: finding.member_span.start,
        })?;
    plan_fix(member, finding.max_value)
}
