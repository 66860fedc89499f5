//! The declarator parser.
//!
//! C declarator syntax is a spiral: a terminal type plus derivation layers
//! read by repeatedly testing the *tail* of the remaining span — a leading
//! `*` is a pointer, a last top-level `[...]` an array, a last top-level
//! `(...)` either grouping (at the very start) or a parameter list. After
//! the wrappers are exhausted, a trailing identifier with nothing left is
//! the variable's name, and any other residue is a definite error.

use cgram_ast::{DerivedType, Qualifier, SmolStr, Variable};
use cgram_scan::{
    find_identifier, find_keyword, find_last_closure_nesting_sensitive, find_string,
    find_string_nesting_sensitive, find_integer, strip_whitespace, Span, SyntaxError,
};

use crate::ty::parse_type;

/// A `const`/`volatile` keyword that does not run on into an identifier, so
/// `conststr` stays a type name.
fn find_qualifier(s: Span<'_>) -> Option<(Qualifier, Span<'_>)> {
    for qualifier in [Qualifier::Const, Qualifier::Volatile] {
        if let Some(matched) = find_keyword(s, qualifier.keyword()) {
            return Some((qualifier, s.strip(matched)));
        }
    }
    None
}

/// Bracket contents: empty is unsized; text that scans entirely as one
/// integer literal normalizes to decimal; anything else is retained
/// verbatim as an unevaluated size expression.
fn array_size(interior: Span<'_>) -> Option<SmolStr> {
    let trimmed = strip_whitespace(interior);
    if trimmed.is_empty() {
        return None;
    }
    if let Some(literal) = find_integer(trimmed) {
        if strip_whitespace(trimmed.strip(literal.text)).is_empty() {
            return Some(SmolStr::new(literal.value.to_string()));
        }
    }
    Some(SmolStr::new(interior.as_str()))
}

/// Top-level-comma-separated parameter declarations.
fn parse_parameter_list(interior: Span<'_>) -> Result<Vec<Variable>, SyntaxError> {
    let mut params = Vec::new();
    let mut contents = interior;
    while !strip_whitespace(contents).is_empty() {
        let (param, rest) = match find_string_nesting_sensitive(contents, ",")? {
            Some(comma) => (contents.before(comma), contents.after(comma)),
            None => (contents, contents.sub(contents.len()..contents.len())),
        };
        match parse_variable(param)? {
            Some(var) => params.push(var),
            None => {
                return Err(SyntaxError::new(param, "Expected a parameter declaration"));
            }
        }
        contents = rest;
    }
    Ok(params)
}

/// Parse a whole span as one declarator: optional qualifier, terminal type,
/// derivation wrappers, optional trailing name.
pub fn parse_variable(s: Span<'_>) -> Result<Option<Variable>, SyntaxError> {
    let mut working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }

    let mut qualifier = None;
    if let Some((q, rest)) = find_qualifier(working) {
        qualifier = Some(q);
        working = strip_whitespace(rest);
    }
    let Some((ty, rest)) = parse_type(working)? else {
        return Err(SyntaxError::new(working, "No type found"));
    };
    working = rest;

    let mut head = DerivedType::Terminal { qualifier, ty };
    let mut name = None;
    loop {
        working = strip_whitespace(working);

        // pointer layer, with an optional trailing qualifier
        if let Some(star) = find_string(working, "*") {
            working = strip_whitespace(working.strip(star));
            let mut qualifier = None;
            if let Some((q, rest)) = find_qualifier(working) {
                qualifier = Some(q);
                working = rest;
            }
            head = DerivedType::Pointer {
                qualifier,
                inner: Box::new(head),
            };
            continue;
        }

        // array layer: peel the last top-level bracket group off the tail
        if let Some(brackets) = find_last_closure_nesting_sensitive(working, b'[', b']')? {
            let residue = strip_whitespace(working.after(brackets));
            if !residue.is_empty() {
                return Err(SyntaxError::new(residue, "Unexpected characters"));
            }
            let size = array_size(brackets.interior());
            working = working.before(brackets);
            head = DerivedType::Array {
                size,
                inner: Box::new(head),
            };
            continue;
        }

        // parenthesis layer: grouping at the very start, else a parameter list
        if let Some(parens) = find_last_closure_nesting_sensitive(working, b'(', b')')? {
            let residue = strip_whitespace(working.after(parens));
            if !residue.is_empty() {
                return Err(SyntaxError::new(residue, "Unexpected characters"));
            }
            let interior = parens.interior();
            if parens.start() == working.start() {
                if strip_whitespace(interior).is_empty() {
                    return Err(SyntaxError::new(parens, "Declaration cannot start with ()"));
                }
                working = interior;
                continue;
            }
            let params = parse_parameter_list(interior)?;
            working = working.before(parens);
            head = DerivedType::Function {
                params,
                ret: Box::new(head),
            };
            continue;
        }

        // a trailing identifier with nothing left is the variable's name
        if let Some(id) = find_identifier(working) {
            let rest = strip_whitespace(working.strip(id));
            if rest.is_empty() {
                name = Some(SmolStr::new(id.as_str()));
                working = rest;
            }
        }
        break;
    }

    let residue = strip_whitespace(working);
    if !residue.is_empty() {
        return Err(SyntaxError::new(residue, "Unexpected characters"));
    }
    Ok(Some(Variable { name, ty: head }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roundtrip(input: &str) -> Result<Option<String>, SyntaxError> {
        Ok(parse_variable(Span::new(input))?.map(|var| var.to_string()))
    }

    #[test]
    fn accepted_declarators_print_canonically() {
        // (input, canonical form; None means unchanged)
        let cases: &[(&str, Option<&str>)] = &[
            ("int x", None),
            ("unsigned int x", None),
            ("unsigned long long x", None),
            ("Thing_t x", None),
            ("const int x", None),
            ("volatile long x", None),
            ("const unsigned long long x", None),
            ("conststr str", None),
            ("volatileint int", None),
            ("const conststr str", None),
            ("int", None),
            ("    int", Some("int")),
            ("int    ", Some("int")),
            ("int x  ", Some("int x")),
            ("int (x)", Some("int x")),
            ("void *x", None),
            ("void* x", Some("void *x")),
            ("void *  x", Some("void *x")),
            ("void*x", Some("void *x")),
            ("void*", Some("void *")),
            ("const char *const x", None),
            ("const short *volatile x", None),
            ("int * const x", Some("int *const x")),
            ("void ******x", None),
            ("void **const **const *const weirdo", None),
            ("void func()", None),
            ("void func(int x)", None),
            ("void func(int x, int y)", None),
            ("void func(const char **str)", None),
            ("void *func()", None),
            ("void (*func)()", None),
            ("void *(*func)()", None),
            ("void *(*const func)()", None),
            ("void *const (*const func)()", None),
            ("void (*func)(void (*callback)(int x), void *args)", None),
            ("void (*func)(void (*callback)(int x, int y), void *args)", None),
            ("void (*)()", None),
            ("void(*)()", Some("void (*)()")),
            ("char str[]", None),
            ("char str[][]", None),
            ("char []", None),
            ("char str[6]", None),
            ("char str[218]", None),
            ("char str[0xda]", Some("char str[218]")),
            ("char str[my_size * sizeof(int)]", None),
            ("char str[sizes[inner[2]]]", None),
            ("char str[4][3][2][1]", None),
            ("char **str[]", None),
            ("char *(*str)[]", None),
            ("char *(*str[6])[]", None),
            ("void *(*(*func)[])()", None),
            ("struct { }", None),
            ("struct{}", Some("struct { }")),
            ("struct Thing_t", None),
            ("struct Thing_t { }", None),
            ("struct Thing_t data", None),
            ("struct Thing_t { } data", None),
            ("struct { } data", None),
            ("struct{int x;}data", Some("struct { int x; } data")),
            ("const struct { const char *begin; const char *end; }", None),
            ("double print(struct Pizza_t *pizza)", None),
            ("double print(struct Pizza { double radius; } *pizza)", None),
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
    fn rejected_declarators() {
        let cases = [
            "",
            " ",
            "(int x)",
            "const (int x)",
            "64int thing",
            "int 64thing",
            "int$ wrong",
            "int wrong#",
            "int int thing",
            "struct",
            "struct {",
            "void *()",
            "void ()",
            "void func(",
            "void func()(",
            "void func())",
            "void func)(",
            "void func[)",
            "void func(]",
            "func(int x)",
        ];
        for input in cases {
            assert!(
                !matches!(roundtrip(input), Ok(Some(_))),
                "expected rejection for {input:?}"
            );
        }
    }

    #[test]
    fn comments_are_whitespace() {
        for input in ["int x", "int    x", "int/*c*/x", "int // c\nx"] {
            assert_eq!(roundtrip(input).unwrap().unwrap(), "int x", "input: {input:?}");
        }
    }

    #[test]
    fn array_sizes_normalize_integers_and_keep_expressions() {
        assert_eq!(roundtrip("char str[ 6 ]").unwrap().unwrap(), "char str[6]");
        assert_eq!(roundtrip("char str[0xda]").unwrap().unwrap(), "char str[218]");
        assert_eq!(
            roundtrip("char str[my_size * sizeof(int)]").unwrap().unwrap(),
            "char str[my_size * sizeof(int)]"
        );
    }

    #[test]
    fn function_chain_shapes() {
        let var = parse_variable(Span::new("void (*func)()")).unwrap().unwrap();
        assert_eq!(var.name.as_deref(), Some("func"));
        // pointer to function returning void
        let DerivedType::Pointer { inner, .. } = &var.ty else {
            panic!("expected a pointer at the root, got {:?}", var.ty);
        };
        assert!(inner.is_function());

        let var = parse_variable(Span::new("void *func()")).unwrap().unwrap();
        // function returning pointer to void
        assert!(var.ty.is_function());
    }
}
