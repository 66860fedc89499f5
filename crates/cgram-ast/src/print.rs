//! Canonical printers.
//!
//! Each AST node renders to exactly one canonical spelling; parsing that
//! spelling reproduces the node, which is the round-trip fixed point the
//! tests lean on. Printing is total: it cannot fail on a well-formed tree.

use std::fmt::{self, Write};

use crate::{
    Control, DerivedType, Expression, FunctionDef, Operator, ParseForm, Scope, Statement, Type,
    Variable,
};

const INDENT: &str = "    ";

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn is_bare_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b == b'_' || b.is_ascii_alphabetic() => {}
        _ => return false,
    }
    bytes.all(|b| b == b'_' || b.is_ascii_alphanumeric())
}

// ============================================================================
// Types and declarators
// ============================================================================

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.keyword()),
            Type::Named(name) => f.write_str(name),
            Type::Compound(c) => {
                f.write_str(c.kind.keyword())?;
                if let Some(name) = &c.name {
                    write!(f, " {name}")?;
                }
                if let Some(members) = &c.members {
                    f.write_str(" { ")?;
                    for member in members {
                        write!(f, "{member}; ")?;
                    }
                    f.write_str("}")?;
                }
                Ok(())
            }
            Type::Enum(e) => {
                f.write_str("enum")?;
                if let Some(name) = &e.name {
                    write!(f, " {name}")?;
                }
                if let Some(members) = &e.members {
                    if members.is_empty() {
                        f.write_str(" { }")?;
                    } else {
                        f.write_str(" { ")?;
                        for (i, member) in members.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{} = {}", member.name, member.value)?;
                        }
                        f.write_str(" }")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Variable {
    /// Unwinds the declarator spiral: start from the name and wrap one
    /// derivation layer at a time, outermost first. A pointer layer
    /// parenthesizes its accumulate when its child is an array layer; a
    /// function layer parenthesizes unless the accumulate is a bare
    /// identifier.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut acc = match &self.name {
            Some(name) => name.to_string(),
            None => String::new(),
        };
        let mut der = &self.ty;
        loop {
            match der {
                DerivedType::Terminal { qualifier, ty } => {
                    let mut out = String::new();
                    if let Some(q) = qualifier {
                        out.push_str(q.keyword());
                        out.push(' ');
                    }
                    write!(out, "{ty}")?;
                    if !acc.is_empty() {
                        out.push(' ');
                        out.push_str(&acc);
                    }
                    acc = out;
                    break;
                }
                DerivedType::Pointer { qualifier, inner } => {
                    let mut out = String::from("*");
                    if let Some(q) = qualifier {
                        out.push_str(q.keyword());
                        out.push(' ');
                    }
                    out.push_str(&acc);
                    acc = if matches!(**inner, DerivedType::Array { .. }) {
                        format!("({out})")
                    } else {
                        out
                    };
                    der = inner;
                }
                DerivedType::Array { size, inner } => {
                    acc.push('[');
                    if let Some(size) = size {
                        acc.push_str(size);
                    }
                    acc.push(']');
                    der = inner;
                }
                DerivedType::Function { params, ret } => {
                    let mut out = if is_bare_identifier(&acc) {
                        format!("{acc}(")
                    } else {
                        format!("({acc})(")
                    };
                    for (i, param) in params.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        write!(out, "{param}")?;
                    }
                    out.push(')');
                    acc = out;
                    der = ret;
                }
            }
        }
        f.write_str(acc.trim_end())
    }
}

// ============================================================================
// Expressions
// ============================================================================

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Operator(op) => op.fmt(f),
            Expression::Identifier(name) => f.write_str(name),
            Expression::Type(ty) => ty.fmt(f),
            Expression::Declaration(var) => var.fmt(f),
            Expression::StringLit(body) => write!(f, "\"{body}\""),
            Expression::CharLit(body) => write!(f, "'{body}'"),
            Expression::UintLit(value) => write!(f, "{value}"),
            Expression::Void => Ok(()),
        }
    }
}

/// Print an operand, parenthesizing a child operator expression only when it
/// binds looser than its parent (a numerically greater precedence).
fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expression, parent: u32) -> fmt::Result {
    match operand {
        Expression::Operator(op) if op.precedence() > parent => write!(f, "({op})"),
        _ => write!(f, "{operand}"),
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = self.kind.spec();
        match spec.form {
            ParseForm::Binary => {
                write_operand(f, &self.operands[0], spec.precedence)?;
                f.write_str(spec.render)?;
                write_operand(f, &self.operands[1], spec.precedence)
            }
            ParseForm::UnaryPrefix => {
                f.write_str(spec.render)?;
                write_operand(f, &self.operands[0], spec.precedence)
            }
            ParseForm::Conditional => {
                write_operand(f, &self.operands[0], spec.precedence)?;
                f.write_str(" ? ")?;
                write_operand(f, &self.operands[1], spec.precedence)?;
                f.write_str(" : ")?;
                write_operand(f, &self.operands[2], spec.precedence)
            }
            ParseForm::Cast => {
                write!(f, "({})", self.operands[0])?;
                write_operand(f, &self.operands[1], spec.precedence)
            }
            // the explicit parentheses already delimit the operand
            ParseForm::Sizeof => write!(f, "sizeof({})", self.operands[0]),
            ParseForm::PostfixClosure => {
                let pair = spec.render.as_bytes();
                write_operand(f, &self.operands[0], spec.precedence)?;
                write!(
                    f,
                    "{}{}{}",
                    pair[0] as char, self.operands[1], pair[1] as char
                )
            }
        }
    }
}

// ============================================================================
// Statements and scopes
// ============================================================================

impl Scope {
    /// Render as a braced block at the given depth, `{ }` when empty. No
    /// trailing newline.
    fn write_block(&self, out: &mut String, depth: usize) {
        if self.statements.is_empty() {
            out.push_str("{ }");
            return;
        }
        out.push_str("{\n");
        for statement in &self.statements {
            statement.write_indented(out, depth + 1);
        }
        push_indent(out, depth);
        out.push('}');
    }

    /// Render as a translation unit: statements at depth zero, no enclosing
    /// braces.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            statement.write_indented(&mut out, 0);
        }
        out
    }
}

impl Statement {
    /// Append this statement as full indented lines, each ending in `\n`.
    pub fn write_indented(&self, out: &mut String, depth: usize) {
        match self {
            Statement::Operator(op) => {
                push_indent(out, depth);
                let _ = write!(out, "{op};\n");
            }
            Statement::Declaration(var) => {
                push_indent(out, depth);
                let _ = write!(out, "{var};\n");
            }
            Statement::Typedef(var) => {
                push_indent(out, depth);
                let _ = write!(out, "typedef {var};\n");
            }
            Statement::Scope(scope) => {
                push_indent(out, depth);
                scope.write_block(out, depth);
                out.push('\n');
            }
            Statement::Function(def) => def.write_indented(out, depth),
            Statement::Control(control) => control.write_indented(out, depth),
        }
    }
}

impl FunctionDef {
    fn write_indented(&self, out: &mut String, depth: usize) {
        push_indent(out, depth);
        let _ = write!(out, "{} ", self.signature);
        self.body.write_block(out, depth);
        out.push('\n');
    }
}

/// Append a control body after its header. A braced body opens on the same
/// line; any other single statement goes on the next line one level deeper.
/// Returns whether the body ended with a closing brace on the current line.
fn write_body(out: &mut String, depth: usize, body: &Statement) -> bool {
    if let Statement::Scope(scope) = body {
        out.push(' ');
        scope.write_block(out, depth);
        true
    } else {
        out.push('\n');
        body.write_indented(out, depth + 1);
        false
    }
}

impl Control {
    fn write_indented(&self, out: &mut String, depth: usize) {
        push_indent(out, depth);
        match self {
            Control::Break => out.push_str("break;\n"),
            Control::Continue => out.push_str("continue;\n"),
            Control::Return(None) => out.push_str("return;\n"),
            Control::Return(Some(value)) => {
                let _ = write!(out, "return {value};\n");
            }
            Control::If { .. } => self.write_if(out, depth),
            Control::While { condition, body } => {
                let _ = write!(out, "while ({condition})");
                if write_body(out, depth, body) {
                    out.push('\n');
                }
            }
            Control::Do { body, condition } => {
                out.push_str("do");
                if write_body(out, depth, body) {
                    let _ = write!(out, " while ({condition});\n");
                } else {
                    push_indent(out, depth);
                    let _ = write!(out, "while ({condition});\n");
                }
            }
            Control::For {
                init,
                condition,
                increment,
                body,
            } => {
                out.push_str("for (");
                if let Some(init) = init {
                    let _ = write!(out, "{init}");
                }
                let _ = write!(out, "; {condition};");
                if let Some(increment) = increment {
                    let _ = write!(out, " {increment}");
                }
                out.push(')');
                if write_body(out, depth, body) {
                    out.push('\n');
                }
            }
        }
    }

    /// `if` chains continue on the closing brace's line: `} else if (...) {`.
    fn write_if(&self, out: &mut String, depth: usize) {
        let Control::If {
            condition,
            body,
            otherwise,
        } = self
        else {
            unreachable!("write_if on a non-if control");
        };
        let _ = write!(out, "if ({condition})");
        let braced = write_body(out, depth, body);
        let Some(otherwise) = otherwise else {
            if braced {
                out.push('\n');
            }
            return;
        };
        if braced {
            out.push_str(" else");
        } else {
            push_indent(out, depth);
            out.push_str("else");
        }
        match &**otherwise {
            Statement::Control(chained @ Control::If { .. }) => {
                out.push(' ');
                chained.write_if(out, depth);
            }
            Statement::Scope(scope) => {
                out.push(' ');
                scope.write_block(out, depth);
                out.push('\n');
            }
            other => {
                out.push('\n');
                other.write_indented(out, depth + 1);
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_indented(&mut out, 0);
        f.write_str(out.trim_end_matches('\n'))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_block(&mut out, 0);
        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use pretty_assertions::assert_eq;

    fn named(name: &str) -> DerivedType {
        DerivedType::Terminal {
            qualifier: None,
            ty: Type::Named(SmolStr::new(name)),
        }
    }

    fn int() -> DerivedType {
        DerivedType::Terminal {
            qualifier: None,
            ty: Type::Primitive(Primitive::Int),
        }
    }

    #[test]
    fn variable_spiral() {
        // char *(*str)[]
        let var = Variable {
            name: Some(SmolStr::new("str")),
            ty: DerivedType::Pointer {
                qualifier: None,
                inner: Box::new(DerivedType::Array {
                    size: None,
                    inner: Box::new(DerivedType::Pointer {
                        qualifier: None,
                        inner: Box::new(DerivedType::Terminal {
                            qualifier: None,
                            ty: Type::Primitive(Primitive::Char),
                        }),
                    }),
                }),
            },
        };
        assert_eq!(var.to_string(), "char *(*str)[]");
    }

    #[test]
    fn function_parenthesizes_non_identifier_accumulate() {
        // void (*func)()
        let var = Variable {
            name: Some(SmolStr::new("func")),
            ty: DerivedType::Pointer {
                qualifier: None,
                inner: Box::new(DerivedType::Function {
                    params: vec![],
                    ret: Box::new(DerivedType::Terminal {
                        qualifier: None,
                        ty: Type::Primitive(Primitive::Void),
                    }),
                }),
            },
        };
        assert_eq!(var.to_string(), "void (*func)()");
    }

    #[test]
    fn enum_members_print_resolved_values() {
        let ty = Type::Enum(EnumType {
            name: None,
            members: Some(vec![
                EnumMember {
                    name: SmolStr::new("RED"),
                    value: 5,
                },
                EnumMember {
                    name: SmolStr::new("YELLOW"),
                    value: 6,
                },
            ]),
        });
        assert_eq!(ty.to_string(), "enum { RED = 5, YELLOW = 6 }");
    }

    #[test]
    fn precedence_parenthesization() {
        // (x + y) * z
        let add = Operator::new(
            OperatorKind::Add,
            vec![
                Expression::Identifier(SmolStr::new("x")),
                Expression::Identifier(SmolStr::new("y")),
            ],
        );
        let mul = Operator::new(
            OperatorKind::Mul,
            vec![
                Expression::Operator(Box::new(add)),
                Expression::Identifier(SmolStr::new("z")),
            ],
        );
        assert_eq!(mul.to_string(), "(x + y) * z");

        // x + y * z needs no parentheses
        let mul = Operator::new(
            OperatorKind::Mul,
            vec![
                Expression::Identifier(SmolStr::new("y")),
                Expression::Identifier(SmolStr::new("z")),
            ],
        );
        let add = Operator::new(
            OperatorKind::Add,
            vec![
                Expression::Identifier(SmolStr::new("x")),
                Expression::Operator(Box::new(mul)),
            ],
        );
        assert_eq!(add.to_string(), "x + y * z");
    }

    #[test]
    fn call_and_void_argument() {
        let call = Operator::new(
            OperatorKind::Call,
            vec![Expression::Identifier(SmolStr::new("f")), Expression::Void],
        );
        assert_eq!(call.to_string(), "f()");
    }

    #[test]
    fn statement_lines() {
        let assign = Operator::new(
            OperatorKind::Assign,
            vec![
                Expression::Declaration(Variable {
                    name: Some(SmolStr::new("x")),
                    ty: int(),
                }),
                Expression::UintLit(5),
            ],
        );
        let scope = Scope {
            statements: vec![
                Statement::Operator(assign),
                Statement::Declaration(Variable {
                    name: Some(SmolStr::new("y")),
                    ty: named("Thing_t"),
                }),
            ],
        };
        assert_eq!(scope.to_string(), "{\n    int x = 5;\n    Thing_t y;\n}");
        assert_eq!(scope.to_source(), "int x = 5;\nThing_t y;\n");
        assert_eq!(Scope::default().to_string(), "{ }");
    }

    #[test]
    fn if_else_chain() {
        let cond = |name: &str| Expression::Identifier(SmolStr::new(name));
        let body = |n: u64| {
            Box::new(Statement::Scope(Scope {
                statements: vec![Statement::Control(Control::Return(Some(
                    Expression::UintLit(n),
                )))],
            }))
        };
        let chain = Statement::Control(Control::If {
            condition: cond("a"),
            body: body(1),
            otherwise: Some(Box::new(Statement::Control(Control::If {
                condition: cond("b"),
                body: body(2),
                otherwise: Some(body(3)),
            }))),
        });
        assert_eq!(
            chain.to_string(),
            "if (a) {\n    return 1;\n} else if (b) {\n    return 2;\n} else {\n    return 3;\n}"
        );
    }
}
