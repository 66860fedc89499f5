//! The operator table.
//!
//! A single immutable table drives both operator parsing and printing: each
//! row carries the token pattern (or none, for structurally recognized
//! operators), the numeric precedence (lower binds tighter), the expression
//! flavor each operand slot admits, and the structural form used to parse
//! and print the row. The printers re-derive precedence from the same table
//! to decide parenthesization.

/// Operator kinds, in table order. The discriminant indexes [`OPERATORS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Comma,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    Conditional,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Plus,
    Minus,
    LogicalNot,
    BitNot,
    Cast,
    Deref,
    AddressOf,
    Sizeof,
    Call,
    Subscript,
    MemberAccess,
    PointerAccess,
}

impl OperatorKind {
    pub fn spec(&self) -> &'static OperatorSpec {
        let spec = &OPERATORS[*self as usize];
        debug_assert_eq!(spec.kind, *self);
        spec
    }

    pub fn precedence(&self) -> u32 {
        self.spec().precedence
    }
}

/// Which expression flavor an operand slot admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    None,
    Left,
    Right,
    Type,
}

/// Structural recognizer shared by a family of table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseForm {
    /// Split on the first top-level occurrence of the token.
    Binary,
    /// Token prefix followed by a right-expression.
    UnaryPrefix,
    /// `pred ? t : f` via the first top-level `?` and last top-level `:`.
    Conditional,
    /// Leading parenthesized type-expression applied to a right-expression.
    Cast,
    /// `sizeof(...)` over a right- or type-expression.
    Sizeof,
    /// Trailing balanced `()`/`[]` applied to a left operand.
    PostfixClosure,
}

pub struct OperatorSpec {
    pub kind: OperatorKind,
    /// Lower binds tighter; postfix forms are 0, comma is 15.
    pub precedence: u32,
    /// Token pattern searched for while parsing; `None` for rows recognized
    /// purely structurally. Postfix rows store their delimiter pair here.
    pub token: Option<&'static str>,
    /// Text inserted between operands when printing (delimiter pair for
    /// postfix rows).
    pub render: &'static str,
    pub form: ParseForm,
    /// Expression-kind constraint per operand slot.
    pub slots: [Slot; 3],
}

impl OperatorSpec {
    pub fn arity(&self) -> u32 {
        self.slots.iter().filter(|s| **s != Slot::None).count() as u32
    }
}

const NONE: Slot = Slot::None;
const LEFT: Slot = Slot::Left;
const RIGHT: Slot = Slot::Right;
const TYPE: Slot = Slot::Type;

macro_rules! op {
    ($kind:ident, $prec:expr, $token:expr, $render:expr, $form:ident, [$($slot:expr),*]) => {
        OperatorSpec {
            kind: OperatorKind::$kind,
            precedence: $prec,
            token: $token,
            render: $render,
            form: ParseForm::$form,
            slots: [$($slot),*],
        }
    };
}

/// The table. Rows are tried in order while parsing, so longer tokens that
/// share a prefix with shorter ones come first (`<<=` before `<<` before
/// `<`), and binary rows come before the unary rows spelled with the same
/// token (`a - b` before `-a`).
pub static OPERATORS: &[OperatorSpec] = &[
    op!(Comma, 15, Some(","), ", ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Assign, 14, Some("="), " = ", Binary, [LEFT, RIGHT, NONE]),
    op!(AddAssign, 14, Some("+="), " += ", Binary, [RIGHT, RIGHT, NONE]),
    op!(SubAssign, 14, Some("-="), " -= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(MulAssign, 14, Some("*="), " *= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(DivAssign, 14, Some("/="), " /= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(ModAssign, 14, Some("%="), " %= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(ShlAssign, 14, Some("<<="), " <<= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(ShrAssign, 14, Some(">>="), " >>= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(AndAssign, 14, Some("&="), " &= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(XorAssign, 14, Some("^="), " ^= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(OrAssign, 14, Some("|="), " |= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Conditional, 13, None, "", Conditional, [RIGHT, RIGHT, RIGHT]),
    op!(LogicalOr, 12, Some("||"), " || ", Binary, [RIGHT, RIGHT, NONE]),
    op!(LogicalAnd, 11, Some("&&"), " && ", Binary, [RIGHT, RIGHT, NONE]),
    op!(BitOr, 10, Some("|"), " | ", Binary, [RIGHT, RIGHT, NONE]),
    op!(BitXor, 9, Some("^"), " ^ ", Binary, [RIGHT, RIGHT, NONE]),
    op!(BitAnd, 8, Some("&"), " & ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Eq, 7, Some("=="), " == ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Ne, 7, Some("!="), " != ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Gt, 6, Some(">"), " > ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Lt, 6, Some("<"), " < ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Ge, 6, Some(">="), " >= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Le, 6, Some("<="), " <= ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Shl, 5, Some("<<"), " << ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Shr, 5, Some(">>"), " >> ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Add, 4, Some("+"), " + ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Sub, 4, Some("-"), " - ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Mul, 3, Some("*"), " * ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Div, 3, Some("/"), " / ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Mod, 3, Some("%"), " % ", Binary, [RIGHT, RIGHT, NONE]),
    op!(Plus, 2, Some("+"), "+", UnaryPrefix, [RIGHT, NONE, NONE]),
    op!(Minus, 2, Some("-"), "-", UnaryPrefix, [RIGHT, NONE, NONE]),
    op!(LogicalNot, 2, Some("!"), "!", UnaryPrefix, [RIGHT, NONE, NONE]),
    op!(BitNot, 2, Some("~"), "~", UnaryPrefix, [RIGHT, NONE, NONE]),
    op!(Cast, 2, None, "", Cast, [TYPE, RIGHT, NONE]),
    op!(Deref, 1, Some("*"), "*", UnaryPrefix, [RIGHT, NONE, NONE]),
    op!(AddressOf, 1, Some("&"), "&", UnaryPrefix, [RIGHT, NONE, NONE]),
    op!(Sizeof, 1, None, "", Sizeof, [RIGHT, NONE, NONE]),
    op!(Call, 0, Some("()"), "()", PostfixClosure, [RIGHT, RIGHT, NONE]),
    op!(Subscript, 0, Some("[]"), "[]", PostfixClosure, [RIGHT, RIGHT, NONE]),
    op!(MemberAccess, 0, Some("."), ".", Binary, [RIGHT, RIGHT, NONE]),
    op!(PointerAccess, 0, Some("->"), "->", Binary, [RIGHT, RIGHT, NONE]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_kind_discriminants() {
        for (i, spec) in OPERATORS.iter().enumerate() {
            assert_eq!(spec.kind as usize, i);
        }
    }

    #[test]
    fn precedence_lookup() {
        assert_eq!(OperatorKind::Comma.precedence(), 15);
        assert_eq!(OperatorKind::Mul.precedence(), 3);
        assert_eq!(OperatorKind::Add.precedence(), 4);
        assert_eq!(OperatorKind::Call.precedence(), 0);
    }

    #[test]
    fn arities() {
        assert_eq!(OperatorKind::Conditional.spec().arity(), 3);
        assert_eq!(OperatorKind::Assign.spec().arity(), 2);
        assert_eq!(OperatorKind::Sizeof.spec().arity(), 1);
    }
}
