//! Expression and operator parsing.
//!
//! Operator dispatch is table-driven: rows of [`OPERATORS`] are tried in
//! order and the first whose structural pattern matches wins. The three
//! expression entry points differ only in which leaf forms they admit —
//! left-expressions (assignment targets) take identifiers and declarations,
//! right-expressions take literals and nested operators, type-expressions
//! take a nameless declarator for casts and `sizeof`.

use cgram_ast::{
    DerivedType, Expression, Operator, OperatorSpec, ParseForm, Slot, SmolStr, Variable, OPERATORS,
};
use cgram_scan::{
    find_closing, find_identifier, find_integer, find_keyword,
    find_last_closure_nesting_sensitive, find_last_string_nesting_sensitive, find_string,
    find_string_lit, find_string_nesting_sensitive, strip_whitespace, Span, SyntaxError,
};

use crate::var::parse_variable;

/// Try every operator table row against the span, in table order.
pub fn parse_operator(s: Span<'_>) -> Result<Option<Operator>, SyntaxError> {
    let working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }
    for spec in OPERATORS {
        let operands = match spec.form {
            ParseForm::Binary => parse_binary(working, spec),
            ParseForm::UnaryPrefix => parse_unary_prefix(working, spec)?,
            ParseForm::Conditional => parse_conditional(working),
            ParseForm::Cast => parse_cast(working),
            ParseForm::Sizeof => parse_sizeof(working),
            ParseForm::PostfixClosure => parse_postfix_closure(working, spec),
        };
        if let Some(operands) = operands {
            return Ok(Some(Operator::new(spec.kind, operands)));
        }
    }
    Ok(None)
}

fn parse_slot(s: Span<'_>, slot: Slot) -> Result<Option<Expression>, SyntaxError> {
    match slot {
        Slot::Left => parse_left_expression(s),
        Slot::Right => parse_right_expression(s),
        Slot::Type => parse_type_expression(s),
        Slot::None => Ok(None),
    }
}

/// Split on the first top-level occurrence of the row's token. A side that
/// fails to parse just means this row does not apply.
fn parse_binary(s: Span<'_>, spec: &OperatorSpec) -> Option<Vec<Expression>> {
    let token = spec.token?;
    let split = find_string_nesting_sensitive(s, token).ok()??;
    let left = parse_slot(s.before(split), spec.slots[0]).ok()??;
    let right = parse_slot(s.after(split), spec.slots[1]).ok()??;
    Some(vec![left, right])
}

/// Token prefix applied to a right-expression. A malformed operand is a
/// definite error here: nothing else can explain the prefix.
fn parse_unary_prefix(
    s: Span<'_>,
    spec: &OperatorSpec,
) -> Result<Option<Vec<Expression>>, SyntaxError> {
    let Some(token) = spec.token else {
        return Ok(None);
    };
    let Some(prefix) = find_string(s, token) else {
        return Ok(None);
    };
    match parse_right_expression(s.strip(prefix))? {
        Some(operand) => Ok(Some(vec![operand])),
        None => Ok(None),
    }
}

/// First top-level `?`, last top-level `:` — so a conditional nested in the
/// true branch is not mistaken for the outer colon.
fn parse_conditional(s: Span<'_>) -> Option<Vec<Expression>> {
    let question = find_string_nesting_sensitive(s, "?").ok()??;
    let tail = s.after(question);
    let colon = find_last_string_nesting_sensitive(tail, ":").ok()??;
    let predicate = parse_right_expression(s.before(question)).ok()??;
    let on_true = parse_right_expression(tail.before(colon)).ok()??;
    let on_false = parse_right_expression(tail.after(colon)).ok()??;
    Some(vec![predicate, on_true, on_false])
}

/// A leading parenthesized region that parses as a type-only declarator,
/// applied to the rest of the span. Grouping parentheses fail the type
/// parse and fall through to later rows.
fn parse_cast(s: Span<'_>) -> Option<Vec<Expression>> {
    let parens = find_closing(s, b'(', b')').ok()??;
    let ty = parse_type_expression(parens.interior()).ok()??;
    let operand = parse_right_expression(s.after(parens)).ok()??;
    Some(vec![ty, operand])
}

/// `sizeof(...)` over a value expression, else a type expression.
fn parse_sizeof(s: Span<'_>) -> Option<Vec<Expression>> {
    let keyword = find_keyword(s, "sizeof")?;
    let rest = strip_whitespace(s.strip(keyword));
    let parens = find_closing(rest, b'(', b')').ok()??;
    if !strip_whitespace(rest.after(parens)).is_empty() {
        return None;
    }
    let interior = parens.interior();
    let operand = match parse_right_expression(interior) {
        Ok(Some(expr)) => expr,
        _ => parse_type_expression(interior).ok()??,
    };
    Some(vec![operand])
}

/// A trailing balanced `()`/`[]` region applied to a left operand: call and
/// subscript. An empty interior is the Void argument.
fn parse_postfix_closure(s: Span<'_>, spec: &OperatorSpec) -> Option<Vec<Expression>> {
    let pair = spec.token?.as_bytes();
    let closure = find_last_closure_nesting_sensitive(s, pair[0], pair[1]).ok()??;
    if !strip_whitespace(s.after(closure)).is_empty() {
        return None;
    }
    let callee = parse_right_expression(s.before(closure)).ok()??;
    let argument = match parse_right_expression(closure.interior()) {
        Ok(Some(expr)) => expr,
        Ok(None) => Expression::Void,
        Err(_) => return None,
    };
    Some(vec![callee, argument])
}

/// An assignment target: an operator, a declaration, or an identifier.
pub fn parse_left_expression(s: Span<'_>) -> Result<Option<Expression>, SyntaxError> {
    let working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }
    if let Ok(Some(op)) = parse_operator(working) {
        return Ok(Some(Expression::Operator(Box::new(op))));
    }
    match parse_variable(working) {
        Ok(Some(var)) => Ok(Some(Expression::Declaration(var))),
        Ok(None) => Ok(None),
        Err(declaration_error) => {
            if let Some(id) = find_identifier(working) {
                if strip_whitespace(working.strip(id)).is_empty() {
                    return Ok(Some(Expression::Identifier(SmolStr::new(id.as_str()))));
                }
            }
            Err(declaration_error)
        }
    }
}

/// A value expression: an operator, a literal, an identifier, or a
/// parenthesized grouping.
pub fn parse_right_expression(s: Span<'_>) -> Result<Option<Expression>, SyntaxError> {
    let working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }
    if let Ok(Some(op)) = parse_operator(working) {
        return Ok(Some(Expression::Operator(Box::new(op))));
    }
    if let Some(literal) = find_integer(working) {
        let rest = strip_whitespace(working.strip(literal.text));
        if !rest.is_empty() {
            return Err(SyntaxError::new(rest, "Unexpected characters"));
        }
        return Ok(Some(Expression::UintLit(literal.value)));
    }
    if let Some(literal) = find_string_lit(working, b'"', b'\\')? {
        let rest = strip_whitespace(working.strip(literal));
        if !rest.is_empty() {
            return Err(SyntaxError::new(rest, "Unexpected characters"));
        }
        let body = literal.interior();
        return Ok(Some(Expression::StringLit(SmolStr::new(body.as_str()))));
    }
    if let Some(literal) = find_string_lit(working, b'\'', b'\\')? {
        let rest = strip_whitespace(working.strip(literal));
        if !rest.is_empty() {
            return Err(SyntaxError::new(rest, "Unexpected characters"));
        }
        let body = literal.interior();
        let bytes = body.as_str().as_bytes();
        let single = (bytes.len() == 1 && bytes[0] != b'\\')
            || (bytes.len() == 2 && bytes[0] == b'\\');
        if !single {
            return Err(SyntaxError::new(
                body,
                "Character literal must contain 1 character",
            ));
        }
        return Ok(Some(Expression::CharLit(SmolStr::new(body.as_str()))));
    }
    if let Some(id) = find_identifier(working) {
        let rest = strip_whitespace(working.strip(id));
        if !rest.is_empty() {
            return Err(SyntaxError::new(rest, "Unexpected characters"));
        }
        return Ok(Some(Expression::Identifier(SmolStr::new(id.as_str()))));
    }
    // grouping: a span that is entirely one balanced parenthesis region
    if let Some(parens) = find_closing(working, b'(', b')')? {
        if strip_whitespace(working.after(parens)).is_empty()
            && !strip_whitespace(parens.interior()).is_empty()
        {
            return parse_right_expression(parens.interior());
        }
    }
    Ok(None)
}

/// A type-only declarator, as found inside casts and `sizeof`. A bare
/// unqualified terminal surfaces as the type leaf; any derived chain keeps
/// the declarator form.
pub fn parse_type_expression(s: Span<'_>) -> Result<Option<Expression>, SyntaxError> {
    let working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }
    match parse_variable(working)? {
        Some(Variable {
            name: None,
            ty: DerivedType::Terminal {
                qualifier: None,
                ty,
            },
        }) => Ok(Some(Expression::Type(ty))),
        Some(var @ Variable { name: None, .. }) => Ok(Some(Expression::Declaration(var))),
        Some(_) => Ok(None),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(input: &str) -> Result<Option<String>, SyntaxError> {
        Ok(parse_operator(Span::new(input))?.map(|op| op.to_string()))
    }

    #[test]
    fn accepted_operators_print_canonically() {
        // (input, canonical form; None means unchanged)
        let cases: &[(&str, Option<&str>)] = &[
            ("x = 1", None),
            ("int x = 5", None),
            ("const char *str = \"hello\"", None),
            ("str = \"hello\"", None),
            ("str = \"\\n\"", None),
            ("my_char = 'c'", None),
            ("my_char = '\\''", None),
            ("int other = this", None),
            ("other = this", None),
            ("x=1", Some("x = 1")),
            ("a + b * c", None),
            ("(a + b) * c", None),
            ("a + b + c", None),
            ("x = y = z", None),
            ("a, b", None),
            ("x += 1", None),
            ("x <<= 2", None),
            ("a << 2", None),
            ("a <= b", None),
            ("a == b || c != d", None),
            ("a & b | c ^ d", None),
            ("!done", None),
            ("-x", None),
            ("~mask", None),
            ("*ptr = 5", None),
            ("&value", None),
            ("x = *p", None),
            ("f()", None),
            ("f(a, b)", None),
            ("arr[i]", None),
            ("arr[i + 1]", None),
            ("s.field", None),
            ("p->field", None),
            ("p->next->value", None),
            ("f(a)[i]", None),
            ("x = a ? b : c", None),
            ("a ? b ? c : d : e", None),
            ("x = (int)y", None),
            ("p = (char *)buf", None),
            ("n = sizeof(int)", None),
            ("n = sizeof(x)", None),
            ("n = sizeof(struct Thing_t)", None),
            ("size = my_size * sizeof(int)", None),
            ("x = 0x10", Some("x = 16")),
        ];
        for &(input, expected) in cases {
            match roundtrip(input) {
                Ok(Some(printed)) => {
                    assert_eq!(printed, expected.unwrap_or(input), "input: {input:?}")
                }
                other => panic!("expected success for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejected_expressions() {
        for input in ["5 = 6", "other = int x", "(int x", "x = ", "= 5"] {
            let operator = roundtrip(input);
            assert!(
                !matches!(operator, Ok(Some(_))),
                "expected rejection for {input:?}, got {operator:?}"
            );
        }
    }

    #[test]
    fn grouping_parens_are_regenerated_from_precedence() {
        // parentheses that matter survive the round trip...
        assert_eq!(roundtrip("(x + y) * z").unwrap().unwrap(), "(x + y) * z");
        // ...and redundant ones do not
        assert_eq!(roundtrip("(x * y) + z").unwrap().unwrap(), "x * y + z");
        assert_eq!(
            parse_right_expression(Span::new("((x))")).unwrap().unwrap(),
            Expression::Identifier(SmolStr::new("x"))
        );
    }

    #[test]
    fn cast_disambiguates_from_grouping() {
        // a parenthesized type is a cast
        let op = parse_operator(Span::new("(int)x")).unwrap().unwrap();
        assert_eq!(op.to_string(), "(int)x");
        // a parenthesized value is not
        assert_eq!(
            parse_right_expression(Span::new("(x)")).unwrap().unwrap(),
            Expression::Identifier(SmolStr::new("x"))
        );
        // casts nest through grouping recursively
        let op = parse_operator(Span::new("y = ((int)x + 1) * 2")).unwrap().unwrap();
        assert_eq!(op.to_string(), "y = ((int)x + 1) * 2");
    }

    #[test]
    fn call_with_empty_arguments_holds_void() {
        let op = parse_operator(Span::new("f()")).unwrap().unwrap();
        assert_eq!(op.operands[1], Expression::Void);
    }

    #[test]
    fn character_literals_hold_exactly_one_character() {
        assert!(parse_right_expression(Span::new("'ab'")).is_err());
        assert!(parse_right_expression(Span::new("''")).is_err());
        assert_eq!(
            parse_right_expression(Span::new("'\\n'")).unwrap().unwrap(),
            Expression::CharLit(SmolStr::new("\\n"))
        );
    }

    #[test]
    fn unterminated_string_is_malformed() {
        assert!(parse_right_expression(Span::new("\"open")).is_err());
    }

    #[test]
    fn type_expression_flavors() {
        // bare terminal surfaces as the type leaf
        assert!(matches!(
            parse_type_expression(Span::new("int")).unwrap().unwrap(),
            Expression::Type(_)
        ));
        // a derived chain keeps the declarator form
        assert!(matches!(
            parse_type_expression(Span::new("char *")).unwrap().unwrap(),
            Expression::Declaration(_)
        ));
        // named declarators are not types
        assert_eq!(parse_type_expression(Span::new("int x")).unwrap(), None);
    }
}
