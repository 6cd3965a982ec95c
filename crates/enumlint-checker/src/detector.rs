//! Opt-in gate and duplicate value detection for a single enum declaration.

use enumlint_common::Span;
use enumlint_syntax::{Annotation, EnumDeclaration, EnumId};
use rustc_hash::FxHashSet;

use crate::evaluator::{ConstantEvaluator, EvalError};

const ATTRIBUTE_SUFFIX: &str = "Attribute";

/// Predicate deciding whether an enum asked for the uniqueness check.
///
/// Matches an annotation whose resolved name is `annotation` (with or without
/// the `Attribute` suffix, optionally qualified by `namespace`) and which has
/// a string-literal argument equal to `token`, positional or named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptInMarker {
    pub annotation: String,
    pub token: String,
    /// Required namespace for qualified names. `None` accepts any qualifier.
    pub namespace: Option<String>,
    /// Extra annotation names accepted besides `annotation`.
    pub aliases: Vec<String>,
}

impl Default for OptInMarker {
    fn default() -> Self {
        OptInMarker {
            annotation: "Description".to_string(),
            token: "UniqueEnum".to_string(),
            namespace: Some("System.ComponentModel".to_string()),
            aliases: Vec::new(),
        }
    }
}

impl OptInMarker {
    #[must_use]
    pub fn new(annotation: impl Into<String>, token: impl Into<String>) -> Self {
        OptInMarker {
            annotation: annotation.into(),
            token: token.into(),
            ..OptInMarker::default()
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// True when any annotation in `attributes` opts in.
    #[must_use]
    pub fn matches(&self, attributes: &[Annotation]) -> bool {
        attributes.iter().any(|attr| self.matches_annotation(attr))
    }

    #[must_use]
    pub fn matches_annotation(&self, attr: &Annotation) -> bool {
        if attr.target.as_deref().is_some_and(|target| target != "type") {
            return false;
        }
        self.matches_name(&attr.resolved)
            && attr
                .arguments
                .iter()
                .any(|arg| arg.value.string_value() == Some(self.token.as_str()))
    }

    fn matches_name(&self, resolved: &[String]) -> bool {
        let Some((last, qualifier)) = resolved.split_last() else {
            return false;
        };
        let last = strip_attribute_suffix(last);
        let name_matches = std::iter::once(&self.annotation)
            .chain(&self.aliases)
            .any(|name| strip_attribute_suffix(name) == last);
        if !name_matches {
            return false;
        }

        match &self.namespace {
            Some(namespace) if !qualifier.is_empty() => {
                qualifier.iter().map(String::as_str).eq(namespace.split('.'))
            }
            _ => true,
        }
    }
}

fn strip_attribute_suffix(name: &str) -> &str {
    match name.strip_suffix(ATTRIBUTE_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

/// The first member of an opted-in enum whose value repeats an earlier one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateFinding {
    pub enum_id: EnumId,
    pub enum_name: String,
    pub member_index: usize,
    pub member_name: String,
    /// The member declaration, including its attributes and initializer.
    pub member_span: Span,
    pub value: i64,
    /// Maximum value over all members, not only those before the duplicate.
    pub max_value: i64,
}

/// Effective member values in declaration order.
///
/// An explicit member takes its evaluated initializer; an implicit member
/// takes the previous value plus one, or 0 when it is the first member.
pub fn member_values<E>(
    decl: &EnumDeclaration,
    evaluator: &E,
) -> Result<Vec<i64>, (usize, EvalError)>
where
    E: ConstantEvaluator + ?Sized,
{
    let mut values = Vec::with_capacity(decl.members.len());
    let mut previous: Option<i64> = None;

    for (index, member) in decl.members.iter().enumerate() {
        let value = match member.value() {
            Some(expr) => evaluator.evaluate(decl, expr).map_err(|err| (index, err))?,
            None => match previous {
                Some(prev) => prev
                    .checked_add(1)
                    .ok_or((index, EvalError::Overflow))?,
                None => 0,
            },
        };
        previous = Some(value);
        values.push(value);
    }

    Ok(values)
}

/// Find the first duplicate-valued member of `decl`, if it opted in.
///
/// Returns `None` when the enum is not marked, when all values are distinct,
/// when any member value cannot be evaluated, or when conditional compilation
/// directives inside the enum make its member list depend on build symbols.
pub fn find_duplicate<E>(
    decl: &EnumDeclaration,
    evaluator: &E,
    marker: &OptInMarker,
) -> Option<DuplicateFinding>
where
    E: ConstantEvaluator + ?Sized,
{
    if !marker.matches(&decl.attributes) {
        return None;
    }
    if decl.conditional {
        tracing::debug!(
            enum_name = %decl.qualified_name(),
            "skipping enum: members depend on conditional compilation"
        );
        return None;
    }

    let values = match member_values(decl, evaluator) {
        Ok(values) => values,
        Err((index, err)) => {
            tracing::debug!(
                enum_name = %decl.qualified_name(),
                member = %decl.members[index].name.text,
                error = %err,
                "skipping enum: member value is not a constant"
            );
            return None;
        }
    };

    let mut seen: FxHashSet<i64> = FxHashSet::default();
    let mut max_value = 0i64;
    let mut duplicate: Option<usize> = None;

    for (index, &value) in values.iter().enumerate() {
        tracing::trace!(
            enum_name = %decl.name.text,
            member = %decl.members[index].name.text,
            value,
            "enum member value"
        );
        max_value = max_value.max(value);
        // Keep scanning after the first collision so `max_value` covers every member.
        if !seen.insert(value) && duplicate.is_none() {
            duplicate = Some(index);
        }
    }

    let index = duplicate?;
    let member = &decl.members[index];
    Some(DuplicateFinding {
        enum_id: decl.id,
        enum_name: decl.qualified_name(),
        member_index: index,
        member_name: member.name.text.clone(),
        member_span: member.span,
        value: values[index],
        max_value,
    })
}
