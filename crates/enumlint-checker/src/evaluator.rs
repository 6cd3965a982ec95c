//! Constant evaluation of enum member initializers.
//!
//! `SemanticModel` indexes one parsed file, optionally backed by a
//! `ProjectIndex` over the other files of the run, and folds initializer
//! expressions to `i64` values:
//! - integer and char literals, parentheses, unary and binary operators
//! - casts to integral types (range-checked unless inside `unchecked(...)`)
//! - references to members of the same enum, members of other enums (`E.M`)
//!   and `const` fields, in the same file or another indexed one
//!
//! Arithmetic is checked. Anything that is not an integer constant (strings,
//! reals, calls, unknown names, cycles) is an `EvalError`; the detector treats
//! any error as "cannot decide" and skips the enum.

use std::cell::RefCell;

use enumlint_common::limits::MAX_EVALUATION_DEPTH;
use enumlint_syntax::{
    BinaryOp, ConstDeclaration, EnumDeclaration, EnumId, Expr, ExprKind, QualifiedName,
    SourceFile, UnaryOp,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("constant expression overflows a 64-bit integer")]
    Overflow,
    #[error("division by zero in constant expression")]
    DivisionByZero,
    #[error("constant value {value} does not fit in '{type_name}'")]
    OutOfRange { value: i64, type_name: String },
    #[error("cannot find constant '{0}'")]
    UnknownName(String),
    #[error("reference to '{0}' is ambiguous")]
    AmbiguousName(String),
    #[error("{0} is not an integer constant")]
    NotAnInteger(&'static str),
    #[error("the value of '{0}' depends on itself")]
    Cycle(String),
    #[error("constant references are nested too deeply")]
    TooDeep,
    #[error("expression is not a compile-time constant")]
    Unsupported,
    #[error("expression is malformed")]
    Malformed,
}

/// Folds an enum member's initializer to its integer value.
pub trait ConstantEvaluator {
    /// Evaluate `expr`, the initializer of a member of `scope`.
    fn evaluate(&self, scope: &EnumDeclaration, expr: &Expr) -> Result<i64, EvalError>;
}

// =============================================================================
// Project index
// =============================================================================

/// Enum and `const` declarations of a set of parsed files, by simple name.
///
/// Built once per run so initializers can reference declarations in other
/// files of the same project.
#[derive(Default)]
pub struct ProjectIndex<'f> {
    files: Vec<&'f SourceFile>,
    enums_by_name: FxHashMap<&'f str, SmallVec<[(u32, EnumId); 1]>>,
    consts_by_name: FxHashMap<&'f str, SmallVec<[(u32, usize); 1]>>,
}

impl<'f> ProjectIndex<'f> {
    #[must_use]
    pub fn new<I>(files: I) -> Self
    where
        I: IntoIterator<Item = &'f SourceFile>,
    {
        let mut index = ProjectIndex::default();
        for file in files {
            let slot = index.files.len() as u32;
            for decl in &file.enums {
                index
                    .enums_by_name
                    .entry(decl.name.text.as_str())
                    .or_default()
                    .push((slot, decl.id));
            }
            for (i, constant) in file.constants.iter().enumerate() {
                index
                    .consts_by_name
                    .entry(constant.name.text.as_str())
                    .or_default()
                    .push((slot, i));
            }
            index.files.push(file);
        }
        tracing::debug!(
            files = index.files.len(),
            enums = index.enums_by_name.len(),
            constants = index.consts_by_name.len(),
            "built project index"
        );
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn file(&self, slot: u32) -> Option<&'f SourceFile> {
        self.files.get(slot as usize).copied()
    }
}

// =============================================================================
// Semantic model
// =============================================================================

/// The file a declaration lives in: the checked file or a project file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Origin {
    Primary,
    Project(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Target {
    Member(Origin, EnumId, usize),
    Const(Origin, usize),
}

/// Where a name is looked up from.
#[derive(Clone, Copy)]
struct Scope<'s> {
    origin: Origin,
    enum_decl: Option<&'s EnumDeclaration>,
    /// Enclosing namespaces and types; decides which `const` fields are visible.
    container: &'s [String],
}

impl<'s> Scope<'s> {
    fn of_enum(origin: Origin, decl: &'s EnumDeclaration) -> Self {
        Scope {
            origin,
            enum_decl: Some(decl),
            container: &decl.container,
        }
    }
}

struct EvalContext {
    /// Declarations currently being evaluated, for cycle detection.
    resolving: Vec<Target>,
    checked: bool,
}

impl EvalContext {
    fn new() -> Self {
        EvalContext {
            resolving: Vec::new(),
            checked: true,
        }
    }
}

/// Name index and evaluator for one source file, optionally backed by a
/// `ProjectIndex` for declarations in other files.
///
/// Project files whose name equals the checked file's name are ignored, so a
/// stale parse of the file being fixed never shadows the current text. Values
/// of referenced declarations are cached, so a model is meant to be used for
/// one analysis pass over an unchanged file.
pub struct SemanticModel<'f> {
    file: &'f SourceFile,
    enums_by_name: FxHashMap<&'f str, SmallVec<[EnumId; 1]>>,
    consts_by_name: FxHashMap<&'f str, SmallVec<[usize; 1]>>,
    project: Option<&'f ProjectIndex<'f>>,
    cache: RefCell<FxHashMap<Target, i64>>,
}

impl<'f> SemanticModel<'f> {
    #[must_use]
    pub fn new(file: &'f SourceFile) -> Self {
        let mut enums_by_name: FxHashMap<&str, SmallVec<[EnumId; 1]>> = FxHashMap::default();
        for decl in &file.enums {
            enums_by_name
                .entry(decl.name.text.as_str())
                .or_default()
                .push(decl.id);
        }

        let mut consts_by_name: FxHashMap<&str, SmallVec<[usize; 1]>> = FxHashMap::default();
        for (index, constant) in file.constants.iter().enumerate() {
            consts_by_name
                .entry(constant.name.text.as_str())
                .or_default()
                .push(index);
        }

        SemanticModel {
            file,
            enums_by_name,
            consts_by_name,
            project: None,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// A model for `file` that also sees the declarations of `project`.
    #[must_use]
    pub fn with_project(file: &'f SourceFile, project: &'f ProjectIndex<'f>) -> Self {
        SemanticModel {
            project: Some(project),
            ..SemanticModel::new(file)
        }
    }

    #[must_use]
    pub fn file(&self) -> &'f SourceFile {
        self.file
    }

    /// Effective value of member `index` of enum `id`, explicit or implicit.
    pub fn member_value(&self, id: EnumId, index: usize) -> Result<i64, EvalError> {
        let display = self
            .file
            .enum_decl(id)
            .and_then(|decl| decl.members.get(index))
            .map_or_else(String::new, |member| member.name.text.clone());
        self.evaluate_target(
            Target::Member(Origin::Primary, id, index),
            &display,
            &mut EvalContext::new(),
        )
    }

    // =========================================================================
    // Files
    // =========================================================================

    fn source(&self, origin: Origin) -> Option<&'f SourceFile> {
        match origin {
            Origin::Primary => Some(self.file),
            Origin::Project(slot) => self.project.and_then(|project| project.file(slot)),
        }
    }

    /// Project slots that stand for other files than the checked one.
    fn is_visible_slot(&self, slot: u32) -> bool {
        self.project
            .and_then(|project| project.file(slot))
            .is_some_and(|other| other.file_name != self.file.file_name)
    }

    /// The file `decl` was parsed from; the checked file when unknown.
    fn origin_of(&self, decl: &EnumDeclaration) -> Origin {
        let target = std::ptr::from_ref(decl);
        let contains = |file: &SourceFile| file.enums.as_ptr_range().contains(&target);
        if contains(self.file) {
            return Origin::Primary;
        }
        self.project
            .and_then(|project| {
                project
                    .files
                    .iter()
                    .position(|file| contains(*file))
                    .map(|slot| Origin::Project(slot as u32))
            })
            .unwrap_or(Origin::Primary)
    }

    fn enum_candidates(&self, name: &str) -> SmallVec<[(Origin, &'f EnumDeclaration); 2]> {
        let primary = self
            .enums_by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|&id| self.file.enum_decl(id).map(|decl| (Origin::Primary, decl)));
        let project = self
            .project
            .and_then(|project| project.enums_by_name.get(name).map(|ids| (project, ids)))
            .into_iter()
            .flat_map(|(project, ids)| {
                ids.iter().filter_map(move |&(slot, id)| {
                    project
                        .file(slot)
                        .and_then(|file| file.enum_decl(id))
                        .map(|decl| (Origin::Project(slot), decl))
                })
            })
            .filter(|(origin, _)| match origin {
                Origin::Project(slot) => self.is_visible_slot(*slot),
                Origin::Primary => true,
            });
        primary.chain(project).collect()
    }

    /// `const` fields named `name`, each with its evaluation target.
    fn const_candidates(&self, name: &str) -> SmallVec<[(Target, &'f ConstDeclaration); 2]> {
        let primary = self
            .consts_by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|&i| {
                self.file
                    .constants
                    .get(i)
                    .map(|c| (Target::Const(Origin::Primary, i), c))
            });
        let project = self
            .project
            .and_then(|project| project.consts_by_name.get(name).map(|refs| (project, refs)))
            .into_iter()
            .flat_map(|(project, refs)| {
                refs.iter().filter_map(move |&(slot, i)| {
                    project
                        .file(slot)
                        .and_then(|file| file.constants.get(i))
                        .map(|c| (Target::Const(Origin::Project(slot), i), c))
                })
            })
            .filter(|(target, _)| match target {
                Target::Const(Origin::Project(slot), _) => self.is_visible_slot(*slot),
                _ => true,
            });
        primary.chain(project).collect()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn evaluate_target(
        &self,
        target: Target,
        display: &str,
        cx: &mut EvalContext,
    ) -> Result<i64, EvalError> {
        let cached = self.cache.borrow().get(&target).copied();
        if let Some(value) = cached {
            return Ok(value);
        }
        if cx.resolving.contains(&target) {
            return Err(EvalError::Cycle(display.to_string()));
        }
        if cx.resolving.len() >= MAX_EVALUATION_DEPTH as usize {
            return Err(EvalError::TooDeep);
        }

        cx.resolving.push(target);
        // Every declaration's initializer starts in the default (checked) context.
        let outer_checked = std::mem::replace(&mut cx.checked, true);
        let result = match target {
            Target::Member(origin, id, index) => self.evaluate_member(origin, id, index, cx),
            Target::Const(origin, index) => self.evaluate_const(origin, index, cx),
        };
        cx.checked = outer_checked;
        cx.resolving.pop();

        if let Ok(value) = result {
            self.cache.borrow_mut().insert(target, value);
        }
        result
    }

    fn evaluate_member(
        &self,
        origin: Origin,
        id: EnumId,
        index: usize,
        cx: &mut EvalContext,
    ) -> Result<i64, EvalError> {
        let decl = self
            .source(origin)
            .and_then(|file| file.enum_decl(id))
            .ok_or(EvalError::Malformed)?;
        let preceding = decl.members.get(..=index).ok_or(EvalError::Malformed)?;

        // Implicit members count up from the nearest explicit predecessor.
        let explicit = preceding
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, member)| member.value().map(|expr| (i, expr)));

        match explicit {
            Some((i, expr)) if i == index => self.eval(expr, Scope::of_enum(origin, decl), cx),
            Some((i, _)) => {
                let base = self.evaluate_target(
                    Target::Member(origin, id, i),
                    &decl.members[i].name.text,
                    cx,
                )?;
                let distance = i64::try_from(index - i).map_err(|_| EvalError::Overflow)?;
                base.checked_add(distance).ok_or(EvalError::Overflow)
            }
            None => i64::try_from(index).map_err(|_| EvalError::Overflow),
        }
    }

    fn evaluate_const(
        &self,
        origin: Origin,
        index: usize,
        cx: &mut EvalContext,
    ) -> Result<i64, EvalError> {
        let constant = self
            .source(origin)
            .and_then(|file| file.constants.get(index))
            .ok_or(EvalError::Malformed)?;
        let scope = Scope {
            origin,
            enum_decl: None,
            container: &constant.container,
        };
        let value = self.eval(&constant.value, scope, cx)?;
        match integral_type(&constant.type_name) {
            Some(ty) => ty.convert(value, &constant.type_name, true),
            None => Ok(value),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn eval(&self, expr: &Expr, scope: Scope<'_>, cx: &mut EvalContext) -> Result<i64, EvalError> {
        match &expr.kind {
            ExprKind::Integer(Some(value)) => {
                i64::try_from(*value).map_err(|_| EvalError::Overflow)
            }
            ExprKind::Integer(None) => Err(EvalError::Overflow),
            ExprKind::Char(Some(ch)) => Ok(i64::from(u32::from(*ch))),
            ExprKind::Char(None) => Err(EvalError::Malformed),
            ExprKind::Real => Err(EvalError::NotAnInteger("a floating-point literal")),
            ExprKind::String(_) => Err(EvalError::NotAnInteger("a string literal")),
            ExprKind::Name(name) => {
                let target = self.resolve_name(name, scope)?;
                self.evaluate_target(target, &name.dotted(), cx)
            }
            ExprKind::Paren(inner) => self.eval(inner, scope, cx),
            ExprKind::Cast { type_name, operand } => {
                let value = self.eval(operand, scope, cx)?;
                match integral_type(type_name) {
                    Some(ty) => ty.convert(value, type_name, cx.checked),
                    // Enum and other non-integral casts keep the value.
                    None => Ok(value),
                }
            }
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, scope, cx),
            ExprKind::Binary { op, left, right } => {
                let lhs = self.eval(left, scope, cx)?;
                let rhs = self.eval(right, scope, cx)?;
                fold_binary(*op, lhs, rhs, cx.checked)
            }
            ExprKind::CheckedContext { checked, operand } => {
                let outer = std::mem::replace(&mut cx.checked, *checked);
                let result = self.eval(operand, scope, cx);
                cx.checked = outer;
                result
            }
            ExprKind::Unsupported => Err(EvalError::Unsupported),
            ExprKind::Error => Err(EvalError::Malformed),
        }
    }

    fn eval_unary(
        &self,
        op: UnaryOp,
        operand: &Expr,
        scope: Scope<'_>,
        cx: &mut EvalContext,
    ) -> Result<i64, EvalError> {
        match op {
            UnaryOp::Plus => self.eval(operand, scope, cx),
            UnaryOp::Negate => {
                // `-9223372036854775808` is the one literal that only fits negated.
                if let ExprKind::Integer(Some(value)) = operand.kind
                    && value == i64::MIN.unsigned_abs()
                {
                    return Ok(i64::MIN);
                }
                let value = self.eval(operand, scope, cx)?;
                if cx.checked {
                    value.checked_neg().ok_or(EvalError::Overflow)
                } else {
                    Ok(value.wrapping_neg())
                }
            }
            UnaryOp::BitNot => Ok(!self.eval(operand, scope, cx)?),
            UnaryOp::LogicalNot => Err(EvalError::NotAnInteger("a boolean expression")),
        }
    }

    // =========================================================================
    // Name resolution
    // =========================================================================

    fn resolve_name(&self, name: &QualifiedName, scope: Scope<'_>) -> Result<Target, EvalError> {
        let mut segments: Vec<&str> = Vec::with_capacity(name.segments.len());
        let mut texts = name.texts();
        if let Some(first) = texts.next() {
            // `using` aliases apply in the file that declares them.
            let alias = self
                .source(scope.origin)
                .and_then(|file| file.usings.iter().find(|using| using.alias == first));
            match alias {
                Some(using) if !name.global => {
                    segments.extend(using.target.iter().map(String::as_str));
                }
                _ => segments.push(first),
            }
        }
        segments.extend(texts);

        match segments.as_slice() {
            [] => Err(EvalError::Malformed),
            [simple] => self.resolve_simple_name(simple, scope),
            [qualifier @ .., last] => self.resolve_qualified_name(qualifier, last, name),
        }
    }

    /// Members of the enum being evaluated win over `const` fields.
    fn resolve_simple_name(&self, name: &str, scope: Scope<'_>) -> Result<Target, EvalError> {
        if let Some(decl) = scope.enum_decl
            && let Some((index, _)) = decl.member(name)
        {
            return Ok(Target::Member(scope.origin, decl.id, index));
        }

        let candidates = self.const_candidates(name);

        // Prefer the innermost const whose container encloses the scope.
        let visible: SmallVec<[(Target, &ConstDeclaration); 2]> = candidates
            .iter()
            .copied()
            .filter(|(_, c)| scope.container.starts_with(&c.container))
            .collect();
        let innermost = visible.iter().map(|(_, c)| c.container.len()).max();
        let pool: SmallVec<[(Target, &ConstDeclaration); 2]> = match innermost {
            Some(depth) => visible
                .into_iter()
                .filter(|(_, c)| c.container.len() == depth)
                .collect(),
            None => candidates,
        };

        match pool.as_slice() {
            [] => Err(EvalError::UnknownName(name.to_string())),
            [(target, _)] => Ok(*target),
            _ => Err(EvalError::AmbiguousName(name.to_string())),
        }
    }

    /// `E.M`, `Ns.E.M`, `Holder.Const`.
    fn resolve_qualified_name(
        &self,
        qualifier: &[&str],
        last: &str,
        name: &QualifiedName,
    ) -> Result<Target, EvalError> {
        let display = name.dotted();

        let enum_targets: SmallVec<[Target; 1]> = qualifier
            .last()
            .map(|enum_name| self.enum_candidates(enum_name))
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, decl)| {
                let path: Vec<&str> = decl
                    .container
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(decl.name.text.as_str()))
                    .collect();
                path.ends_with(qualifier)
            })
            .filter_map(|(origin, decl)| {
                decl.member(last)
                    .map(|(index, _)| Target::Member(origin, decl.id, index))
            })
            .collect();

        match enum_targets.as_slice() {
            [target] => return Ok(*target),
            [_, _, ..] => return Err(EvalError::AmbiguousName(display)),
            [] => {}
        }

        let const_targets: SmallVec<[Target; 1]> = self
            .const_candidates(last)
            .into_iter()
            .filter(|(_, c)| {
                let path: Vec<&str> = c.qualified_path().collect();
                path.len() > qualifier.len() && path[..path.len() - 1].ends_with(qualifier)
            })
            .map(|(target, _)| target)
            .collect();

        match const_targets.as_slice() {
            [target] => Ok(*target),
            [] => Err(EvalError::UnknownName(display)),
            _ => Err(EvalError::AmbiguousName(display)),
        }
    }
}

impl ConstantEvaluator for SemanticModel<'_> {
    fn evaluate(&self, scope: &EnumDeclaration, expr: &Expr) -> Result<i64, EvalError> {
        let origin = self.origin_of(scope);
        self.eval(expr, Scope::of_enum(origin, scope), &mut EvalContext::new())
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

fn fold_binary(op: BinaryOp, lhs: i64, rhs: i64, checked: bool) -> Result<i64, EvalError> {
    let arith = |result: Option<i64>, wrapped: i64| {
        if checked {
            result.ok_or(EvalError::Overflow)
        } else {
            Ok(wrapped)
        }
    };

    match op {
        BinaryOp::Add => arith(lhs.checked_add(rhs), lhs.wrapping_add(rhs)),
        BinaryOp::Subtract => arith(lhs.checked_sub(rhs), lhs.wrapping_sub(rhs)),
        BinaryOp::Multiply => arith(lhs.checked_mul(rhs), lhs.wrapping_mul(rhs)),
        BinaryOp::Divide => {
            if rhs == 0 {
                return Err(EvalError::DivisionByZero);
            }
            arith(lhs.checked_div(rhs), lhs.wrapping_div(rhs))
        }
        BinaryOp::Remainder => {
            if rhs == 0 {
                return Err(EvalError::DivisionByZero);
            }
            arith(lhs.checked_rem(rhs), lhs.wrapping_rem(rhs))
        }
        // Shift counts are masked to the operand width, never range-checked.
        BinaryOp::ShiftLeft => Ok(lhs.wrapping_shl(shift_count(rhs))),
        BinaryOp::ShiftRight => Ok(lhs.wrapping_shr(shift_count(rhs))),
        BinaryOp::BitAnd => Ok(lhs & rhs),
        BinaryOp::BitXor => Ok(lhs ^ rhs),
        BinaryOp::BitOr => Ok(lhs | rhs),
    }
}

fn shift_count(rhs: i64) -> u32 {
    (rhs & 0x3F) as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct IntegralType {
    bits: u32,
    signed: bool,
}

/// Integral type named by a keyword or its `System` type name.
fn integral_type(type_name: &str) -> Option<IntegralType> {
    let name = type_name.strip_prefix("System.").unwrap_or(type_name);
    let (bits, signed) = match name {
        "sbyte" | "SByte" => (8, true),
        "byte" | "Byte" => (8, false),
        "short" | "Int16" => (16, true),
        "ushort" | "UInt16" | "char" | "Char" => (16, false),
        "int" | "Int32" => (32, true),
        "uint" | "UInt32" => (32, false),
        "long" | "Int64" | "nint" | "IntPtr" => (64, true),
        "ulong" | "UInt64" | "nuint" | "UIntPtr" => (64, false),
        _ => return None,
    };
    Some(IntegralType { bits, signed })
}

impl IntegralType {
    fn range(self) -> (i128, i128) {
        if self.signed {
            (-(1i128 << (self.bits - 1)), (1i128 << (self.bits - 1)) - 1)
        } else {
            (0, (1i128 << self.bits) - 1)
        }
    }

    /// Convert `value` to this type: range-checked when `checked`, truncated
    /// otherwise.
    fn convert(self, value: i64, type_name: &str, checked: bool) -> Result<i64, EvalError> {
        let (min, max) = self.range();
        let wide = i128::from(value);
        if (min..=max).contains(&wide) {
            return Ok(value);
        }
        if checked {
            return Err(EvalError::OutOfRange {
                value,
                type_name: type_name.to_string(),
            });
        }

        let modulus = 1i128 << self.bits;
        let mut truncated = wide.rem_euclid(modulus);
        if self.signed && truncated > max {
            truncated -= modulus;
        }
        i64::try_from(truncated).map_err(|_| EvalError::Overflow)
    }
}
