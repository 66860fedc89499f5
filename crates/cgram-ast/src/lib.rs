//! cgram abstract syntax tree.
//!
//! Every node is a closed sum type with exclusively-owned children: the
//! grammar never produces cycles or shared subtrees, so child links are
//! plain `Box`/`Vec` fields. Nodes are built once by the parsers and are
//! immutable afterwards; the canonical printers only read them (see the
//! `Display` impls in this crate).

// Re-export the owned-string type used for every materialized name.
pub use smol_str::SmolStr;

mod ops;
mod print;

pub use ops::{OperatorKind, OperatorSpec, ParseForm, Slot, OPERATORS};

// ============================================================================
// Types
// ============================================================================

/// Built-in arithmetic and void types. `signed` spellings normalize to the
/// plain forms at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Void,
    Char,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
}

impl Primitive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Char => "char",
            Primitive::UnsignedChar => "unsigned char",
            Primitive::Short => "short",
            Primitive::UnsignedShort => "unsigned short",
            Primitive::Int => "int",
            Primitive::UnsignedInt => "unsigned int",
            Primitive::Long => "long",
            Primitive::UnsignedLong => "unsigned long",
            Primitive::LongLong => "long long",
            Primitive::UnsignedLongLong => "unsigned long long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

/// `const` / `volatile` qualification on a terminal type or pointer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Const,
    Volatile,
}

impl Qualifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Qualifier::Const => "const",
            Qualifier::Volatile => "volatile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    Struct,
    Union,
}

impl CompoundKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CompoundKind::Struct => "struct",
            CompoundKind::Union => "union",
        }
    }
}

/// A `struct`/`union` type: optional tag name, optional brace-enclosed
/// member list. `members: Some(..)` marks a definition (possibly empty);
/// `None` marks a bare reference. A compound with neither a name nor a
/// definition is invalid and never constructed by the parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound {
    pub kind: CompoundKind,
    pub name: Option<SmolStr>,
    pub members: Option<Vec<Variable>>,
}

impl Compound {
    pub fn is_definition(&self) -> bool {
        self.members.is_some()
    }
}

/// One `name = value` member of an enum definition. Implicit values were
/// already resolved at parse time: predecessor + 1, starting at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: SmolStr,
    pub value: i64,
}

/// An `enum` type: optional tag name, optional member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: Option<SmolStr>,
    pub members: Option<Vec<EnumMember>>,
}

impl EnumType {
    pub fn is_definition(&self) -> bool {
        self.members.is_some()
    }
}

/// A terminal type: primitive keyword sequence, compound introduction, or
/// bare named-type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(Primitive),
    Named(SmolStr),
    Compound(Compound),
    Enum(EnumType),
}

// ============================================================================
// Derived types and variables
// ============================================================================

/// One derivation layer wrapped around an inner type. The chain is a
/// singly-rooted tree read outermost-first: `var.ty` is the last wrapper the
/// declarator applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedType {
    Terminal {
        qualifier: Option<Qualifier>,
        ty: Type,
    },
    Pointer {
        qualifier: Option<Qualifier>,
        inner: Box<DerivedType>,
    },
    /// `size: None` is an unsized `[]`. A size that scanned entirely as one
    /// integer literal was normalized to decimal; anything else is the
    /// unevaluated bracket text, verbatim.
    Array {
        size: Option<SmolStr>,
        inner: Box<DerivedType>,
    },
    Function {
        params: Vec<Variable>,
        ret: Box<DerivedType>,
    },
}

impl DerivedType {
    pub fn is_function(&self) -> bool {
        matches!(self, DerivedType::Function { .. })
    }

    /// The terminal type at the bottom of the derivation chain.
    pub fn terminal(&self) -> &Type {
        let mut der = self;
        loop {
            der = match der {
                DerivedType::Terminal { ty, .. } => return ty,
                DerivedType::Pointer { inner, .. } => inner,
                DerivedType::Array { inner, .. } => inner,
                DerivedType::Function { ret, .. } => ret,
            };
        }
    }
}

/// A declarator: optional name plus its derivation chain. A "type-only"
/// expression (cast operand, `sizeof` operand) is a `Variable` with no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: Option<SmolStr>,
    pub ty: DerivedType,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Operator(Box<Operator>),
    Identifier(SmolStr),
    /// A bare terminal type in expression position (cast/`sizeof` operand).
    Type(Type),
    /// A declarator in expression position: an assignment target that
    /// declares (`int x = 5`), or a derived cast operand (`(char *)p`).
    Declaration(Variable),
    /// String literal body, quotes removed, escapes kept verbatim.
    StringLit(SmolStr),
    /// Character literal body: one character or one `\`-escape.
    CharLit(SmolStr),
    UintLit(u64),
    /// Absent operand slot, e.g. an empty call argument list. Prints as
    /// nothing.
    Void,
}

/// An operator application: table row plus 1-3 owned operands in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub kind: OperatorKind,
    pub operands: Vec<Expression>,
}

impl Operator {
    pub fn new(kind: OperatorKind, operands: Vec<Expression>) -> Self {
        debug_assert_eq!(operands.len() as u32, kind.spec().arity());
        Self { kind, operands }
    }

    pub fn precedence(&self) -> u32 {
        self.kind.precedence()
    }
}

// ============================================================================
// Statements
// ============================================================================

/// An ordered statement list; order is program order and semantically
/// significant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scope {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Scope(Scope),
    Control(Control),
    Operator(Operator),
    Declaration(Variable),
    Typedef(Variable),
    Function(FunctionDef),
}

/// Control constructs. Bodies are single statements; a braced body is a
/// `Statement::Scope`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    If {
        condition: Expression,
        body: Box<Statement>,
        otherwise: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Do {
        body: Box<Statement>,
        condition: Expression,
    },
    /// A missing condition was resolved to the literal `1` at parse time.
    For {
        init: Option<Expression>,
        condition: Expression,
        increment: Option<Expression>,
        body: Box<Statement>,
    },
    Break,
    Continue,
    Return(Option<Expression>),
}

/// A function definition: a signature whose derivation chain is
/// function-derived, plus a braced body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub signature: Variable,
    pub body: Scope,
}
