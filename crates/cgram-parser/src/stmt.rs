//! Statement and scope parsing.
//!
//! A scope is an ordered statement sequence. Statement alternatives are
//! tried in a fixed order chosen so earlier forms are structurally
//! distinguishable by keyword or bracket shape: braced block, then
//! `break`/`continue`/`return`, then `if`/`while`/`for`/`do`, then a
//! function definition, then `typedef`, then an operator-expression
//! statement, then a bare declaration.
//!
//! Recovery is statement-granular: when a statement's content is malformed
//! but its boundary (the terminating `;` or a balanced body) can still be
//! established, the failure is recorded as a [`Diagnostic`] and parsing
//! resumes past the boundary. Failures that destroy the boundary itself —
//! unmatched delimiters, a missing required `;`, a malformed control header
//! — propagate fatally.

use cgram_ast::{Control, Expression, FunctionDef, Scope, Statement};
use cgram_scan::{
    find_closing, find_identifier, find_keyword, find_string, find_string_nesting_sensitive,
    strip_whitespace, Span, SyntaxError,
};

use crate::expr::{parse_operator, parse_right_expression};
use crate::var::parse_variable;
use crate::Diagnostic;

/// One parsed statement (or a recovered hole) and the remainder past it.
type StatementOutcome<'s> = Option<(Option<Statement>, Span<'s>)>;

/// Parse a statement sequence, accumulating recoverable failures into
/// `diagnostics`.
pub fn parse_scope(s: Span<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<Scope, SyntaxError> {
    let mut statements = Vec::new();
    let mut working = strip_whitespace(s);
    while !working.is_empty() {
        match parse_statement(working, diagnostics)? {
            Some((statement, rest)) => {
                statements.extend(statement);
                working = strip_whitespace(rest);
            }
            None => break,
        }
    }
    Ok(Scope { statements })
}

fn parse_statement<'s>(
    s: Span<'s>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<StatementOutcome<'s>, SyntaxError> {
    let working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }

    // (1) braced block
    if let Some(block) = find_closing(working, b'{', b'}')? {
        let inner = parse_scope(block.interior(), diagnostics)?;
        return Ok(Some((
            Some(Statement::Scope(inner)),
            working.strip(block),
        )));
    }

    // (2) break / continue / return
    if let Some(keyword) = find_keyword(working, "break") {
        let (statement, rest) = terminated(working.strip(keyword), Control::Break)?;
        return Ok(Some((Some(statement), rest)));
    }
    if let Some(keyword) = find_keyword(working, "continue") {
        let (statement, rest) = terminated(working.strip(keyword), Control::Continue)?;
        return Ok(Some((Some(statement), rest)));
    }
    if let Some(keyword) = find_keyword(working, "return") {
        let rest = working.strip(keyword);
        let Some(semicolon) = find_string_nesting_sensitive(rest, ";")? else {
            return Err(SyntaxError::new(rest, "Expected a semicolon"));
        };
        let value = parse_right_expression(rest.before(semicolon))?;
        let statement = Statement::Control(Control::Return(value));
        return Ok(Some((Some(statement), rest.after(semicolon))));
    }

    // (3) control constructs
    if let Some(keyword) = find_keyword(working, "if") {
        let (statement, rest) = parse_if(working.strip(keyword), diagnostics)?;
        return Ok(Some((Some(statement), rest)));
    }
    if let Some(keyword) = find_keyword(working, "while") {
        let (condition, rest) = parse_condition(working.strip(keyword))?;
        let (body, rest) = parse_body(rest, diagnostics)?;
        let statement = Statement::Control(Control::While {
            condition,
            body: Box::new(body),
        });
        return Ok(Some((Some(statement), rest)));
    }
    if let Some(keyword) = find_keyword(working, "for") {
        let (statement, rest) = parse_for(working.strip(keyword), diagnostics)?;
        return Ok(Some((Some(statement), rest)));
    }
    if let Some(keyword) = find_keyword(working, "do") {
        let (statement, rest) = parse_do(working.strip(keyword), diagnostics)?;
        return Ok(Some((Some(statement), rest)));
    }

    // (4) function definition: an identifier-leading span whose first
    // top-level brace comes before any top-level semicolon, with a
    // parameter list directly before the body
    let semicolon = find_string_nesting_sensitive(working, ";")?;
    if let Some(brace) = find_string_nesting_sensitive(working, "{")? {
        let before_semicolon = semicolon.map_or(true, |semi| brace.start() < semi.start());
        let signature = working.before(brace);
        if before_semicolon
            && find_identifier(working).is_some()
            && signature.as_str().trim_end().ends_with(')')
        {
            let Some(body_region) = find_closing(working.from_start_of(brace), b'{', b'}')? else {
                return Err(SyntaxError::new(brace, "No closing character"));
            };
            let rest = working.after(body_region);
            match parse_variable(signature) {
                Ok(Some(var)) if var.ty.is_function() && var.name.is_some() => {
                    let body = parse_scope(body_region.interior(), diagnostics)?;
                    let statement = Statement::Function(FunctionDef {
                        signature: var,
                        body,
                    });
                    return Ok(Some((Some(statement), rest)));
                }
                Ok(_) => {
                    diagnostics.push(Diagnostic::new(signature, "Expected a function signature"));
                    return Ok(Some((None, rest)));
                }
                Err(err) => {
                    diagnostics.push(err.into());
                    return Ok(Some((None, rest)));
                }
            }
        }
    }

    // (5) typedef
    if let Some(keyword) = find_keyword(working, "typedef") {
        let rest = working.strip(keyword);
        let Some(semicolon) = find_string_nesting_sensitive(rest, ";")? else {
            return Err(SyntaxError::new(rest, "Expected a semicolon"));
        };
        let declarator = rest.before(semicolon);
        let after = rest.after(semicolon);
        match parse_variable(declarator) {
            Ok(Some(var)) if var.name.is_some() => {
                return Ok(Some((Some(Statement::Typedef(var)), after)));
            }
            Ok(_) => diagnostics.push(Diagnostic::new(declarator, "typedef needs a name")),
            Err(err) => diagnostics.push(err.into()),
        }
        return Ok(Some((None, after)));
    }

    // (6) operator-expression statement, else (7) a bare declaration
    let Some(semicolon) = semicolon else {
        return Err(SyntaxError::new(working, "Expected a semicolon"));
    };
    let body = working.before(semicolon);
    let after = working.after(semicolon);
    if strip_whitespace(body).is_empty() {
        return Ok(Some((None, after)));
    }
    if let Ok(Some(op)) = parse_operator(body) {
        return Ok(Some((Some(Statement::Operator(op)), after)));
    }
    match parse_variable(body) {
        Ok(Some(var)) => Ok(Some((Some(Statement::Declaration(var)), after))),
        Ok(None) => Ok(Some((None, after))),
        Err(err) => {
            diagnostics.push(err.into());
            Ok(Some((None, after)))
        }
    }
}

/// `break;` / `continue;` — anything before the semicolon is malformed.
fn terminated<'s>(rest: Span<'s>, control: Control) -> Result<(Statement, Span<'s>), SyntaxError> {
    let rest = strip_whitespace(rest);
    let Some(semicolon) = find_string(rest, ";") else {
        return Err(SyntaxError::new(rest, "Expected a semicolon"));
    };
    Ok((Statement::Control(control), rest.strip(semicolon)))
}

/// A required parenthesized, non-empty condition.
fn parse_condition(s: Span<'_>) -> Result<(Expression, Span<'_>), SyntaxError> {
    let working = strip_whitespace(s);
    let Some(parens) = find_closing(working, b'(', b')')? else {
        return Err(SyntaxError::new(
            working,
            "Expected a parenthesized condition",
        ));
    };
    let Some(condition) = parse_right_expression(parens.interior())? else {
        return Err(SyntaxError::new(parens, "Expected a condition"));
    };
    Ok((condition, working.strip(parens)))
}

/// A control body: exactly one statement, braces optional.
fn parse_body<'s>(
    s: Span<'s>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Statement, Span<'s>), SyntaxError> {
    match parse_statement(s, diagnostics)? {
        Some((Some(statement), rest)) => Ok((statement, rest)),
        _ => Err(SyntaxError::new(strip_whitespace(s), "Expected a statement")),
    }
}

fn parse_if<'s>(
    after_keyword: Span<'s>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Statement, Span<'s>), SyntaxError> {
    let (condition, rest) = parse_condition(after_keyword)?;
    let (body, rest) = parse_body(rest, diagnostics)?;
    let after_body = strip_whitespace(rest);
    // `else` must be the keyword, not the head of an identifier
    let (otherwise, rest) = match find_keyword(after_body, "else") {
        Some(keyword) => {
            let (else_body, rest) = parse_body(after_body.strip(keyword), diagnostics)?;
            (Some(Box::new(else_body)), rest)
        }
        None => (None, rest),
    };
    let statement = Statement::Control(Control::If {
        condition,
        body: Box::new(body),
        otherwise,
    });
    Ok((statement, rest))
}

/// `for (init; condition; increment)` — any of the three may be empty, and
/// a missing condition means loop forever: the literal `1`.
fn parse_for<'s>(
    after_keyword: Span<'s>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Statement, Span<'s>), SyntaxError> {
    let working = strip_whitespace(after_keyword);
    let Some(parens) = find_closing(working, b'(', b')')? else {
        return Err(SyntaxError::new(working, "Expected a parenthesized loop header"));
    };
    let header = parens.interior();
    let Some(first) = find_string_nesting_sensitive(header, ";")? else {
        return Err(SyntaxError::new(header, "Expected two semicolons in for header"));
    };
    let tail = header.after(first);
    let Some(second) = find_string_nesting_sensitive(tail, ";")? else {
        return Err(SyntaxError::new(tail, "Expected two semicolons in for header"));
    };
    let init = parse_right_expression(header.before(first))?;
    let condition =
        parse_right_expression(tail.before(second))?.unwrap_or(Expression::UintLit(1));
    let increment = parse_right_expression(tail.after(second))?;
    let (body, rest) = parse_body(working.strip(parens), diagnostics)?;
    let statement = Statement::Control(Control::For {
        init,
        condition,
        increment,
        body: Box::new(body),
    });
    Ok((statement, rest))
}

fn parse_do<'s>(
    after_keyword: Span<'s>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Statement, Span<'s>), SyntaxError> {
    let (body, rest) = parse_body(after_keyword, diagnostics)?;
    let rest = strip_whitespace(rest);
    let Some(keyword) = find_keyword(rest, "while") else {
        return Err(SyntaxError::new(rest, "Expected while after do body"));
    };
    let (condition, rest) = parse_condition(rest.strip(keyword))?;
    let rest = strip_whitespace(rest);
    let Some(semicolon) = find_string(rest, ";") else {
        return Err(SyntaxError::new(rest, "Expected a semicolon"));
    };
    let statement = Statement::Control(Control::Do {
        body: Box::new(body),
        condition,
    });
    Ok((statement, rest.strip(semicolon)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Result<Scope, SyntaxError>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let scope = parse_scope(Span::new(source), &mut diagnostics);
        (scope, diagnostics)
    }

    /// Parse, print, and require zero diagnostics.
    fn roundtrip(source: &str) -> String {
        let (scope, diagnostics) = parse(source);
        let scope = scope.expect("scope should parse");
        assert_eq!(diagnostics, vec![], "unexpected diagnostics for {source:?}");
        scope.to_source()
    }

    #[test]
    fn simple_statements() {
        assert_eq!(roundtrip("x = 5;"), "x = 5;\n");
        assert_eq!(roundtrip("int x = 5; int y;"), "int x = 5;\nint y;\n");
        assert_eq!(roundtrip("typedef unsigned long size_type;"), "typedef unsigned long size_type;\n");
        assert_eq!(
            roundtrip("typedef struct { int x; int y; } Point_t;"),
            "typedef struct { int x; int y; } Point_t;\n"
        );
        assert_eq!(roundtrip("{ x = 1; y = 2; }"), "{\n    x = 1;\n    y = 2;\n}\n");
    }

    #[test]
    fn control_statements() {
        assert_eq!(
            roundtrip("if (x == 5) { y = 1; }"),
            "if (x == 5) {\n    y = 1;\n}\n"
        );
        assert_eq!(roundtrip("if (x) y = 1;"), "if (x)\n    y = 1;\n");
        assert_eq!(
            roundtrip("if (x) y = 1; else y = 2;"),
            "if (x)\n    y = 1;\nelse\n    y = 2;\n"
        );
        assert_eq!(
            roundtrip("if (a) { } else if (b) { } else { }"),
            "if (a) { } else if (b) { } else { }\n"
        );
        assert_eq!(
            roundtrip("while (i < n) { i = i + 1; }"),
            "while (i < n) {\n    i = i + 1;\n}\n"
        );
        assert_eq!(
            roundtrip("do { i = i + 1; } while (i < n);"),
            "do {\n    i = i + 1;\n} while (i < n);\n"
        );
        assert_eq!(
            roundtrip("for (i = 0; i < n; i = i + 1) { total = total + i; }"),
            "for (i = 0; i < n; i = i + 1) {\n    total = total + i;\n}\n"
        );
        assert_eq!(roundtrip("while (1) { break; }"), "while (1) {\n    break;\n}\n");
        assert_eq!(
            roundtrip("while (1) { continue; }"),
            "while (1) {\n    continue;\n}\n"
        );
        assert_eq!(roundtrip("return;"), "return;\n");
        assert_eq!(roundtrip("return x + 1;"), "return x + 1;\n");
    }

    #[test]
    fn for_header_defaults() {
        // a missing condition is an infinite loop
        assert_eq!(roundtrip("for (;;) { }"), "for (; 1;) { }\n");
        assert_eq!(
            roundtrip("for (i = 0;; i = i + 1) { }"),
            "for (i = 0; 1; i = i + 1) { }\n"
        );
    }

    #[test]
    fn else_is_a_keyword_not_an_identifier_prefix() {
        // `elsewhere` must not be consumed as an else branch
        assert_eq!(
            roundtrip("if (x) y = 1; elsewhere = 2;"),
            "if (x)\n    y = 1;\nelsewhere = 2;\n"
        );
    }

    #[test]
    fn function_definitions() {
        assert_eq!(
            roundtrip("void reset(int *counter) { *counter = 0; }"),
            "void reset(int *counter) {\n    *counter = 0;\n}\n"
        );
        assert_eq!(roundtrip("void noop() { }"), "void noop() { }\n");
        // nested definitions parse recursively
        assert_eq!(
            roundtrip("int outer() { int inner() { return 1; } return inner(); }"),
            "int outer() {\n    int inner() {\n        return 1;\n    }\n    return inner();\n}\n"
        );
    }

    #[test]
    fn scope_round_trips_are_fixed_points() {
        let sources = [
            "int x = 5;\nif (x > 2) {\n    x = x - 1;\n} else {\n    x = 0;\n}\n",
            "void swap(int *a, int *b) {\n    int tmp = *a;\n    *a = *b;\n    *b = tmp;\n}\n",
            "for (; 1;)\n    tick();\n",
        ];
        for source in sources {
            let printed = roundtrip(source);
            assert_eq!(printed, source, "not canonical for {source:?}");
            assert_eq!(roundtrip(&printed), printed, "not a fixed point: {source:?}");
        }
    }

    #[test]
    fn statement_errors_recover_at_boundaries() {
        let (scope, diagnostics) = parse("x = 5; int $bad = 3; y = 6;");
        let scope = scope.unwrap();
        assert_eq!(scope.statements.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(scope.to_source(), "x = 5;\ny = 6;\n");

        // the diagnostic points at the offending span
        let source = "x = 5; int $bad = 3; y = 6;";
        let at = &source[diagnostics[0].location.clone()];
        assert!(at.starts_with('$'), "diagnostic points at {at:?}");
    }

    #[test]
    fn bad_typedef_recovers() {
        let (scope, diagnostics) = parse("typedef int; x = 1;");
        assert_eq!(scope.unwrap().to_source(), "x = 1;\n");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn bad_function_signature_skips_the_body() {
        let (scope, diagnostics) = parse("int $oops() { x = 1; } y = 2;");
        assert_eq!(scope.unwrap().to_source(), "y = 2;\n");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn boundary_failures_are_fatal() {
        for source in [
            "{ x = 1;",          // unmatched brace
            "x = \"open;",       // unmatched quote
            "break",             // missing semicolon
            "break 5;",          // break takes no expression
            "if () { }",         // missing condition
            "int x = 5",         // missing final semicolon
            "do { } until (x);", // do without while
        ] {
            let (scope, _) = parse(source);
            assert!(scope.is_err(), "expected fatal error for {source:?}");
        }
    }

    #[test]
    fn struct_definition_statement_is_not_a_function() {
        assert_eq!(
            roundtrip("struct { int x; } s;"),
            "struct { int x; } s;\n"
        );
    }
}
