//! Scanning primitives for the cgram grammar engine.
//!
//! Everything here operates on borrowed [`Span`]s of a source buffer and
//! never allocates on the scan path. Each primitive reports one of three
//! outcomes: `Ok(Some(span))` when the construct is present, `Ok(None)` when
//! it is simply absent (the caller may try another rule), and
//! `Err(SyntaxError)` when the construct committed to an interpretation that
//! cannot complete, such as an opening bracket with no closer.

use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// A borrowed view into the source buffer, `[start, end)` in bytes.
///
/// Spans are cheap to copy and never own text; the source buffer outlives
/// every span derived from it. Byte offsets are absolute so that errors
/// produced deep inside a parse still point at the original buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'src> {
    src: &'src str,
    start: usize,
    end: usize,
}

impl<'src> Span<'src> {
    /// A span covering the whole buffer.
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            start: 0,
            end: src.len(),
        }
    }

    pub fn as_str(&self) -> &'src str {
        &self.src[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Absolute byte range of this span in the source buffer.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Sub-span addressed relative to this span's start.
    pub fn sub(&self, range: Range<usize>) -> Span<'src> {
        debug_assert!(range.start <= range.end && range.end <= self.len());
        Span {
            src: self.src,
            start: self.start + range.start,
            end: self.start + range.end,
        }
    }

    /// Remove a child sub-span that shares this span's begin or end boundary.
    pub fn strip(&self, child: Span<'src>) -> Span<'src> {
        if child.start == self.start {
            debug_assert!(child.end <= self.end);
            Span {
                src: self.src,
                start: child.end,
                end: self.end,
            }
        } else {
            debug_assert!(child.end == self.end && child.start >= self.start);
            Span {
                src: self.src,
                start: self.start,
                end: child.start,
            }
        }
    }

    /// The part of this span before `inner`.
    pub fn before(&self, inner: Span<'src>) -> Span<'src> {
        debug_assert!(inner.start >= self.start && inner.start <= self.end);
        Span {
            src: self.src,
            start: self.start,
            end: inner.start,
        }
    }

    /// The part of this span after `inner`.
    pub fn after(&self, inner: Span<'src>) -> Span<'src> {
        debug_assert!(inner.end >= self.start && inner.end <= self.end);
        Span {
            src: self.src,
            start: inner.end,
            end: self.end,
        }
    }

    /// The suffix of this span starting where `inner` starts.
    pub fn from_start_of(&self, inner: Span<'src>) -> Span<'src> {
        debug_assert!(inner.start >= self.start && inner.start <= self.end);
        Span {
            src: self.src,
            start: inner.start,
            end: self.end,
        }
    }

    /// Interior of a delimited region: the span minus its first and last byte.
    pub fn interior(&self) -> Span<'src> {
        debug_assert!(self.len() >= 2);
        Span {
            src: self.src,
            start: self.start + 1,
            end: self.end - 1,
        }
    }

    fn bytes(&self) -> &'src [u8] {
        self.as_str().as_bytes()
    }
}

impl fmt::Display for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A definite syntax error at a known location.
///
/// This is the "malformed" arm of every tri-state scan/parse result: the
/// construct was recognized far enough to commit, and then failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at bytes {location:?}")]
pub struct SyntaxError {
    pub location: Range<usize>,
    pub message: String,
}

impl SyntaxError {
    pub fn new(at: Span<'_>, message: impl Into<String>) -> Self {
        Self {
            location: at.range(),
            message: message.into(),
        }
    }
}

/// Tri-state result of a scan: found / absent / malformed.
pub type Scan<'src> = Result<Option<Span<'src>>, SyntaxError>;

/// An integer literal: the matched text and its parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerLiteral<'src> {
    pub text: Span<'src>,
    pub value: u64,
}

/// C keywords this grammar knows about, sorted for binary search. Names that
/// would shadow one of these (compound-type names, enum member names) are
/// rejected by the parsers.
pub const RESERVED_WORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "while",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.binary_search(&word).is_ok()
}

fn is_identifier_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_identifier_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Byte width of the UTF-8 character starting with `b`.
fn char_width(b: u8) -> usize {
    match b {
        0xf0.. => 4,
        0xe0.. => 3,
        0xc0.. => 2,
        _ => 1,
    }
}

/// Find the run of whitespace at the beginning of the span. `//` and
/// `/* */` comments count as whitespace; an unterminated comment consumes to
/// the end of the span.
pub fn find_whitespace(s: Span<'_>) -> Option<Span<'_>> {
    let b = s.bytes();
    let mut i = 0;
    loop {
        match b.get(i) {
            Some(b' ' | b'\t' | b'\n') => i += 1,
            Some(b'/') if b.get(i + 1) == Some(&b'/') => {
                i += 2;
                while i < b.len() && b[i] != b'\n' {
                    i += 1;
                }
            }
            Some(b'/') if b.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < b.len() && !(b[i] == b'*' && b[i + 1] == b'/') {
                    i += 1;
                }
                i = if i + 1 < b.len() { i + 2 } else { b.len() };
            }
            _ => break,
        }
    }
    (i > 0).then(|| s.sub(0..i))
}

/// Strip leading whitespace and comments.
pub fn strip_whitespace(s: Span<'_>) -> Span<'_> {
    match find_whitespace(s) {
        Some(ws) => s.strip(ws),
        None => s,
    }
}

/// Exact literal prefix match.
pub fn find_string<'src>(s: Span<'src>, pattern: &str) -> Option<Span<'src>> {
    s.as_str()
        .starts_with(pattern)
        .then(|| s.sub(0..pattern.len()))
}

/// Keyword prefix match: the word must not run on into an identifier, so
/// `conststr` is never misread as `const`.
pub fn find_keyword<'src>(s: Span<'src>, word: &str) -> Option<Span<'src>> {
    let matched = find_string(s, word)?;
    match s.bytes().get(word.len()) {
        Some(&b) if is_identifier_byte(b) => None,
        _ => Some(matched),
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*` prefix match.
pub fn find_identifier(s: Span<'_>) -> Option<Span<'_>> {
    let b = s.bytes();
    match b.first() {
        Some(&c) if is_identifier_start(c) => {}
        _ => return None,
    }
    let mut i = 1;
    while i < b.len() && is_identifier_byte(b[i]) {
        i += 1;
    }
    Some(s.sub(0..i))
}

/// Decimal or `0x`-prefixed hexadecimal literal prefix match. Hex requires
/// the `0x` marker exactly; a bare `0x` with no hex digit falls back to the
/// decimal `0`.
pub fn find_integer(s: Span<'_>) -> Option<IntegerLiteral<'_>> {
    let b = s.bytes();
    if b.starts_with(b"0x") {
        let mut i = 2;
        let mut value: u64 = 0;
        while i < b.len() {
            let digit = match b[i] {
                c @ b'0'..=b'9' => c - b'0',
                c @ b'a'..=b'f' => 10 + c - b'a',
                c @ b'A'..=b'F' => 10 + c - b'A',
                _ => break,
            };
            value = value.wrapping_mul(16).wrapping_add(u64::from(digit));
            i += 1;
        }
        if i > 2 {
            return Some(IntegerLiteral {
                text: s.sub(0..i),
                value,
            });
        }
    }
    let mut i = 0;
    let mut value: u64 = 0;
    while i < b.len() && b[i].is_ascii_digit() {
        value = value.wrapping_mul(10).wrapping_add(u64::from(b[i] - b'0'));
        i += 1;
    }
    (i > 0).then(|| IntegerLiteral {
        text: s.sub(0..i),
        value,
    })
}

/// Balanced-depth scan from an opening character at the span's start to its
/// matching closer. Absent unless the span starts with `opening`; malformed
/// if the span ends before depth returns to zero.
pub fn find_closing(s: Span<'_>, opening: u8, closing: u8) -> Scan<'_> {
    let b = s.bytes();
    if b.first() != Some(&opening) {
        return Ok(None);
    }
    let mut depth = 1usize;
    let mut i = 1;
    while depth > 0 && i < b.len() {
        if b[i] == opening {
            depth += 1;
        } else if b[i] == closing {
            depth -= 1;
        }
        i += 1;
    }
    if depth > 0 {
        Err(SyntaxError::new(s, "No closing character"))
    } else {
        Ok(Some(s.sub(0..i)))
    }
}

/// Quote-delimited literal honoring a single-character escape prefix. The
/// matched span includes both quotes.
pub fn find_string_lit(s: Span<'_>, quote: u8, escape: u8) -> Scan<'_> {
    let b = s.bytes();
    if b.first() != Some(&quote) {
        return Ok(None);
    }
    let mut i = 1;
    while i < b.len() {
        if b[i] == quote {
            return Ok(Some(s.sub(0..i + 1)));
        }
        i += if b[i] == escape { 2 } else { 1 };
    }
    Err(SyntaxError::new(s, "No closing quote"))
}

/// Skip one balanced `()`/`[]`/`{}` region or quoted literal opening at the
/// start of the span, if any.
fn skip_balanced_region(s: Span<'_>) -> Scan<'_> {
    for (opening, closing) in [(b'(', b')'), (b'[', b']'), (b'{', b'}')] {
        if let Some(region) = find_closing(s, opening, closing)? {
            return Ok(Some(region));
        }
    }
    for quote in [b'"', b'\''] {
        if let Some(region) = find_string_lit(s, quote, b'\\')? {
            return Ok(Some(region));
        }
    }
    Ok(None)
}

/// Find the first occurrence of `pattern` at the same nesting level as the
/// beginning of the span, skipping over balanced bracket and quoted regions.
/// The pattern is tried at each position before any region opening there is
/// skipped.
pub fn find_string_nesting_sensitive<'src>(s: Span<'src>, pattern: &str) -> Scan<'src> {
    let mut working = s;
    while !working.is_empty() {
        if let Some(matched) = find_string(working, pattern) {
            return Ok(Some(matched));
        }
        match skip_balanced_region(working)? {
            Some(region) => working = working.strip(region),
            None => {
                let step = char_width(working.bytes()[0]);
                working = working.sub(step..working.len());
            }
        }
    }
    Ok(None)
}

/// Find the last top-level occurrence of `pattern`.
pub fn find_last_string_nesting_sensitive<'src>(s: Span<'src>, pattern: &str) -> Scan<'src> {
    let mut last = None;
    let mut working = s;
    while let Some(matched) = find_string_nesting_sensitive(working, pattern)? {
        last = Some(matched);
        working = working.after(matched);
    }
    Ok(last)
}

/// Find the last top-level balanced region of the given delimiter pair.
/// Resolves C's right-to-left declarator stacking: the innermost `()`/`[]`
/// must be peeled from the end of the span.
pub fn find_last_closure_nesting_sensitive(s: Span<'_>, opening: u8, closing: u8) -> Scan<'_> {
    let mut buf = [0u8; 4];
    let pattern = (opening as char).encode_utf8(&mut buf);
    let mut last = None;
    let mut working = s;
    loop {
        let Some(open_at) = find_string_nesting_sensitive(working, pattern)? else {
            return Ok(last);
        };
        let anchored = working.from_start_of(open_at);
        let Some(region) = find_closing(anchored, opening, closing)? else {
            return Ok(last);
        };
        last = Some(region);
        working = working.after(region);
    }
}
