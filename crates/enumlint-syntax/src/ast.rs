//! AST types produced by the parser.
//!
//! The tree only models what the analyzer consumes: enum declarations with
//! their attributes and member initializers, `const` fields, and the `using`
//! aliases needed to resolve attribute names. Containers (namespaces, types)
//! are flattened into a `container` path on each declaration.

use enumlint_common::Span;
use smallvec::SmallVec;

/// An identifier with its source span. Verbatim identifiers (`@class`) are
/// stored without the `@`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

/// A dotted name such as `System.ComponentModel.Description`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedName {
    pub segments: SmallVec<[Name; 2]>,
    /// Written with a `global::` prefix.
    pub global: bool,
}

impl QualifiedName {
    #[must_use]
    pub fn last(&self) -> Option<&Name> {
        self.segments.last()
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => Span::default(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.text.as_str())
    }

    #[must_use]
    pub fn dotted(&self) -> String {
        self.texts().collect::<Vec<_>>().join(".")
    }
}

/// Index of an enum declaration within its `SourceFile`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub u32);

/// A parsed source file.
#[derive(Clone, Debug, Default)]
pub struct SourceFile {
    pub file_name: String,
    pub usings: Vec<UsingAlias>,
    /// All enum declarations in source order, including nested ones.
    pub enums: Vec<EnumDeclaration>,
    pub constants: Vec<ConstDeclaration>,
}

impl SourceFile {
    #[must_use]
    pub fn enum_decl(&self, id: EnumId) -> Option<&EnumDeclaration> {
        self.enums.get(id.0 as usize)
    }

    /// Find the enum member whose name starts at `offset`.
    #[must_use]
    pub fn member_at(&self, offset: u32) -> Option<(&EnumDeclaration, &EnumMember)> {
        self.enums.iter().find_map(|decl| {
            decl.members
                .iter()
                .find(|m| m.span.start == offset || m.name.span.start == offset)
                .map(|m| (decl, m))
        })
    }
}

/// `using Alias = Some.Qualified.Name;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsingAlias {
    pub alias: String,
    pub target: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct EnumDeclaration {
    pub id: EnumId,
    pub name: Name,
    /// Enclosing namespaces and types, outermost first.
    pub container: Vec<String>,
    pub attributes: Vec<Annotation>,
    pub base_type: Option<String>,
    pub members: Vec<EnumMember>,
    /// A `#if`/`#elif`/`#else`/`#endif` line appears inside the declaration.
    pub conditional: bool,
    /// From the `[` of the first attribute list (or the `enum` keyword) to the closing brace.
    pub span: Span,
}

impl EnumDeclaration {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.container.is_empty() {
            self.name.text.clone()
        } else {
            format!("{}.{}", self.container.join("."), self.name.text)
        }
    }

    #[must_use]
    pub fn member(&self, name: &str) -> Option<(usize, &EnumMember)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, m)| m.name.text == name)
    }
}

#[derive(Clone, Debug)]
pub struct EnumMember {
    pub name: Name,
    pub attributes: Vec<Annotation>,
    pub initializer: Option<Initializer>,
    /// From the `[` of the member's first attribute list (or its name) to the end of its initializer.
    pub span: Span,
}

impl EnumMember {
    #[must_use]
    pub fn value(&self) -> Option<&Expr> {
        self.initializer.as_ref().map(|init| &init.value)
    }
}

/// The `= expr` clause of an enum member.
#[derive(Clone, Debug)]
pub struct Initializer {
    pub equals_span: Span,
    pub value: Expr,
}

/// One attribute, e.g. `Description("UniqueEnum")`.
#[derive(Clone, Debug)]
pub struct Annotation {
    /// The name exactly as written.
    pub name: QualifiedName,
    /// The name after `using` alias substitution; equal to `name` when no alias applies.
    pub resolved: Vec<String>,
    /// Attribute target such as `return` in `[return: X]`.
    pub target: Option<String>,
    pub arguments: Vec<AnnotationArgument>,
    /// Offset of the `[` that opens the enclosing attribute list.
    pub list_start: u32,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct AnnotationArgument {
    /// Set for `Name = value` and `name: value` arguments.
    pub name: Option<Name>,
    pub value: Expr,
}

/// `const T Name = value;`
#[derive(Clone, Debug)]
pub struct ConstDeclaration {
    pub name: Name,
    pub container: Vec<String>,
    pub type_name: String,
    pub value: Expr,
    pub span: Span,
}

impl ConstDeclaration {
    pub fn qualified_path(&self) -> impl Iterator<Item = &str> {
        self.container
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.text.as_str()))
    }
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::String(Some(value)) => Some(value),
            ExprKind::Paren(inner) => inner.string_value(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, ExprKind::Error)
    }
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    /// Integer literal; `None` when it does not fit in 64 bits.
    Integer(Option<u64>),
    Real,
    /// String literal; `None` for interpolated strings with holes.
    String(Option<String>),
    Char(Option<char>),
    Name(QualifiedName),
    Paren(Box<Expr>),
    Cast {
        type_name: String,
        operand: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `checked(expr)` or `unchecked(expr)`.
    CheckedContext {
        checked: bool,
        operand: Box<Expr>,
    },
    /// Any construct the parser does not model (calls, `typeof`, lambdas, ...).
    Unsupported,
    /// A missing or malformed expression; a parse diagnostic was recorded.
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negate,
    BitNot,
    LogicalNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Remainder,
    Add,
    Subtract,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitXor,
    BitOr,
}

impl BinaryOp {
    /// Binding power; larger binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Remainder => 6,
            BinaryOp::Add | BinaryOp::Subtract => 5,
            BinaryOp::ShiftLeft | BinaryOp::ShiftRight => 4,
            BinaryOp::BitAnd => 3,
            BinaryOp::BitXor => 2,
            BinaryOp::BitOr => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
        }
    }
}

/// Integral type keywords accepted as cast targets and enum base types.
pub const INTEGRAL_TYPE_KEYWORDS: &[&str] = &[
    "sbyte", "byte", "short", "ushort", "int", "uint", "long", "ulong", "nint", "nuint", "char",
];
