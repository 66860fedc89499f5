//! The type parser: primitive keyword sequences, `struct`/`union`/`enum`
//! introductions with optional names and bodies, and bare named-type
//! references.

use cgram_ast::{Compound, CompoundKind, EnumMember, EnumType, Primitive, SmolStr, Type};
use cgram_scan::{
    find_closing, find_identifier, find_integer, find_keyword, find_string,
    find_string_nesting_sensitive, find_whitespace, is_reserved, strip_whitespace, Span,
    SyntaxError,
};

use crate::var::parse_variable;

/// Keyword sequences mapped to primitive kinds. Sequences that shadow a
/// prefix of another must come first, so every `long long` row precedes the
/// `long` rows.
static PRIMITIVES: &[(&[&str], Primitive)] = &[
    (&["void"], Primitive::Void),
    (&["char"], Primitive::Char),
    (&["signed", "char"], Primitive::Char),
    (&["unsigned", "char"], Primitive::UnsignedChar),
    (&["short"], Primitive::Short),
    (&["signed", "short"], Primitive::Short),
    (&["unsigned", "short"], Primitive::UnsignedShort),
    (&["int"], Primitive::Int),
    (&["signed", "int"], Primitive::Int),
    (&["unsigned", "int"], Primitive::UnsignedInt),
    (&["long", "long"], Primitive::LongLong),
    (&["signed", "long", "long"], Primitive::LongLong),
    (&["unsigned", "long", "long"], Primitive::UnsignedLongLong),
    (&["long"], Primitive::Long),
    (&["signed", "long"], Primitive::Long),
    (&["unsigned", "long"], Primitive::UnsignedLong),
    (&["float"], Primitive::Float),
    (&["double"], Primitive::Double),
];

/// Match a primitive keyword sequence at the start of the span, returning
/// the remainder past it.
fn find_primitive(s: Span<'_>) -> Option<(Primitive, Span<'_>)> {
    'rows: for (words, primitive) in PRIMITIVES {
        let mut working = s;
        for word in *words {
            let Some(matched) = find_keyword(working, word) else {
                continue 'rows;
            };
            working = strip_whitespace(working.strip(matched));
        }
        return Some((*primitive, working));
    }
    None
}

/// Parse a terminal type at the start of the span. Returns the type and the
/// remainder past it.
pub fn parse_type(s: Span<'_>) -> Result<Option<(Type, Span<'_>)>, SyntaxError> {
    let working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }
    for kind in [CompoundKind::Struct, CompoundKind::Union] {
        if let Some(keyword) = find_keyword(working, kind.keyword()) {
            return parse_compound(kind, working, working.strip(keyword)).map(Some);
        }
    }
    if let Some(keyword) = find_keyword(working, "enum") {
        return parse_enum(working, working.strip(keyword)).map(Some);
    }
    if let Some((primitive, rest)) = find_primitive(working) {
        return Ok(Some((Type::Primitive(primitive), rest)));
    }
    if let Some(id) = find_identifier(working) {
        let name = SmolStr::new(id.as_str());
        return Ok(Some((Type::Named(name), working.strip(id))));
    }
    Err(SyntaxError::new(working, "Expected an identifier"))
}

/// Optional tag name after a compound keyword. A reserved word is never a
/// tag, so `struct int` falls through to the name-or-definition check.
fn find_tag<'s>(s: Span<'s>) -> (Option<SmolStr>, Span<'s>) {
    if let Some(ws) = find_whitespace(s) {
        let working = s.strip(ws);
        if let Some(id) = find_identifier(working) {
            if !is_reserved(id.as_str()) {
                let name = SmolStr::new(id.as_str());
                return (Some(name), strip_whitespace(working.strip(id)));
            }
        }
        return (None, working);
    }
    (None, s)
}

fn parse_compound<'s>(
    kind: CompoundKind,
    whole: Span<'s>,
    after_keyword: Span<'s>,
) -> Result<(Type, Span<'s>), SyntaxError> {
    let (name, mut working) = find_tag(after_keyword);
    let mut members = None;
    if let Some(region) = find_closing(working, b'{', b'}')? {
        members = Some(parse_member_list(region.interior())?);
        working = working.strip(region);
    }
    if name.is_none() && members.is_none() {
        return Err(SyntaxError::new(
            whole,
            "struct/union/enum needs a name or a definition",
        ));
    }
    Ok((
        Type::Compound(Compound {
            kind,
            name,
            members,
        }),
        working,
    ))
}

/// `;`-separated field declarations inside a struct/union body.
fn parse_member_list(interior: Span<'_>) -> Result<Vec<cgram_ast::Variable>, SyntaxError> {
    let mut members = Vec::new();
    let mut braces = interior;
    loop {
        match find_string_nesting_sensitive(braces, ";")? {
            Some(semicolon) => {
                let field = braces.before(semicolon);
                braces = braces.after(semicolon);
                match parse_variable(field)? {
                    Some(var) => members.push(var),
                    None => {
                        return Err(SyntaxError::new(field, "Expected a field declaration"));
                    }
                }
            }
            None => {
                let residue = strip_whitespace(braces);
                if !residue.is_empty() {
                    return Err(SyntaxError::new(
                        residue,
                        "Unexpected characters in struct/union definition",
                    ));
                }
                return Ok(members);
            }
        }
    }
}

fn parse_enum<'s>(whole: Span<'s>, after_keyword: Span<'s>) -> Result<(Type, Span<'s>), SyntaxError> {
    let (name, mut working) = find_tag(after_keyword);
    let mut members = None;
    if let Some(region) = find_closing(working, b'{', b'}')? {
        let mut list = Vec::new();
        let mut braces = region.interior();
        let mut expected = 0i64;
        while !strip_whitespace(braces).is_empty() {
            let (field, rest) = match find_string_nesting_sensitive(braces, ",")? {
                Some(comma) => (braces.before(comma), braces.after(comma)),
                None => (braces, braces.sub(braces.len()..braces.len())),
            };
            match parse_enum_member(field, expected)? {
                Some(member) => {
                    expected = member.value + 1;
                    list.push(member);
                }
                None => return Err(SyntaxError::new(field, "Expected an enum member")),
            }
            braces = rest;
        }
        members = Some(list);
        working = working.strip(region);
    }
    if name.is_none() && members.is_none() {
        return Err(SyntaxError::new(
            whole,
            "struct/union/enum needs a name or a definition",
        ));
    }
    Ok((Type::Enum(EnumType { name, members }), working))
}

/// One `name [= integer]` enum member. `expected` is the implicit value:
/// predecessor + 1, starting at 0.
fn parse_enum_member(s: Span<'_>, expected: i64) -> Result<Option<EnumMember>, SyntaxError> {
    let working = strip_whitespace(s);
    if working.is_empty() {
        return Ok(None);
    }
    let Some(id) = find_identifier(working) else {
        return Err(SyntaxError::new(working, "Enum member needs a name"));
    };
    if is_reserved(id.as_str()) {
        return Err(SyntaxError::new(id, "Enum member needs a name"));
    }
    let name = SmolStr::new(id.as_str());
    let mut working = strip_whitespace(working.strip(id));
    let mut value = expected;
    if let Some(equals) = find_string(working, "=") {
        working = strip_whitespace(working.strip(equals));
        let Some(literal) = find_integer(working) else {
            return Err(SyntaxError::new(working, "Expected an unsigned integer"));
        };
        value = literal.value as i64;
        working = working.strip(literal.text);
    }
    let residue = strip_whitespace(working);
    if !residue.is_empty() {
        return Err(SyntaxError::new(
            residue,
            "Unexpected characters in enum member",
        ));
    }
    Ok(Some(EnumMember { name, value }))
}
