//! Code fix surface: diagnostic in, text changes out.
//!
//! Changes are expressed in the editor protocol's 1-based line/offset form
//! so a host can apply them without knowing about byte offsets.

use enumlint_checker::{MAX_VALUE_PROPERTY, MEMBER_NAME_PROPERTY, RuleDescriptor};
use enumlint_common::{Diagnostic, LineMap, Position};
use enumlint_syntax::parse_source_file;
use serde::Serialize;

use crate::error::FixError;
use crate::plan::{FixPlan, plan_fix};

pub const FIX_NAME: &str = "makeEnumMemberUnique";
pub const FIX_ID: &str = "fixMakeEnumMemberUnique";
/// Title shown for the fix. Doubles as the equivalence key for batch fixing.
pub const FIX_DESCRIPTION: &str = "Make enum member unique";
pub const FIX_ALL_DESCRIPTION: &str = "Make all enum members unique";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixInfo {
    pub fix_name: String,
    pub description: String,
    pub changes: Vec<CodeFixFileChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_all_description: Option<String>,
}

/// A file change in a code fix.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixFileChange {
    pub file_name: String,
    pub text_changes: Vec<CodeFixTextChange>,
}

/// A text change within a file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixTextChange {
    pub start: CodeFixPosition,
    pub end: CodeFixPosition,
    pub new_text: String,
}

/// 1-based line and 1-based UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeFixPosition {
    pub line: u32,
    pub offset: u32,
}

impl CodeFixPosition {
    #[must_use]
    pub fn from_offset(line_map: &LineMap, offset: u32, source: &str) -> Self {
        let pos = line_map.offset_to_position(offset, source);
        CodeFixPosition {
            line: pos.line + 1,
            offset: pos.character + 1,
        }
    }

    /// Back to a 0-based `Position`; `None` for a zero line or column.
    #[must_use]
    pub fn to_position(self) -> Option<Position> {
        Some(Position::new(
            self.line.checked_sub(1)?,
            self.offset.checked_sub(1)?,
        ))
    }
}

/// Offers the "make unique" fix for diagnostics of one rule.
pub struct CodeFixProvider<'r> {
    rule: &'r RuleDescriptor,
}

impl<'r> CodeFixProvider<'r> {
    #[must_use]
    pub fn new(rule: &'r RuleDescriptor) -> Self {
        CodeFixProvider { rule }
    }

    #[must_use]
    pub fn fixable_diagnostic_ids(&self) -> Vec<&'r str> {
        vec![self.rule.id.as_str()]
    }

    #[must_use]
    pub fn can_fix(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.code == self.rule.id
    }

    /// Plan the edit for `diagnostic` against the current `source` of its file.
    ///
    /// The source is re-parsed, so a document edited since the diagnostic was
    /// produced is detected rather than patched at a stale offset.
    pub fn plan(&self, diagnostic: &Diagnostic, source: &str) -> Result<FixPlan, FixError> {
        if !self.can_fix(diagnostic) {
            return Err(FixError::NotFixable {
                code: diagnostic.code.clone(),
            });
        }

        let raw = diagnostic
            .property(MAX_VALUE_PROPERTY)
            .ok_or(FixError::MissingProperty(MAX_VALUE_PROPERTY))?;
        let max_value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| FixError::MalformedProperty {
                name: MAX_VALUE_PROPERTY,
                value: raw.to_string(),
            })?;

        let parsed = parse_source_file(&diagnostic.file, source);
        let expected = diagnostic.property(MEMBER_NAME_PROPERTY);
        let stale = || FixError::StaleTarget {
            member: expected.unwrap_or_default().to_string(),
            offset: diagnostic.start,
        };

        let (_, member) = parsed.file.member_at(diagnostic.start).ok_or_else(stale)?;
        if expected.is_some_and(|name| name != member.name.text) {
            return Err(stale());
        }

        plan_fix(member, max_value)
    }

    /// Build the code fix for `diagnostic`.
    pub fn code_fix(&self, diagnostic: &Diagnostic, source: &str) -> Result<CodeFixInfo, FixError> {
        let plan = self.plan(diagnostic, source)?;
        tracing::debug!(
            file = %diagnostic.file,
            member = %plan.member_name,
            new_value = plan.new_value,
            "planned enum member fix"
        );

        let line_map = LineMap::build(source);
        let change = CodeFixTextChange {
            start: CodeFixPosition::from_offset(&line_map, plan.span.start, source),
            end: CodeFixPosition::from_offset(&line_map, plan.span.end, source),
            new_text: plan.new_text,
        };

        Ok(CodeFixInfo {
            fix_name: FIX_NAME.to_string(),
            description: FIX_DESCRIPTION.to_string(),
            changes: vec![CodeFixFileChange {
                file_name: diagnostic.file.clone(),
                text_changes: vec![change],
            }],
            fix_id: Some(FIX_ID.to_string()),
            fix_all_description: Some(FIX_ALL_DESCRIPTION.to_string()),
        })
    }
}
