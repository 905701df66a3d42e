//! Lexical primitives over template source
//!
//! The engine scans the source one byte at a time. [`Source`] wraps the text
//! with the small set of probes it needs: literal matching, anchored regex
//! probes, byte classification and "read until" scanning. All offsets are byte
//! offsets; slicing never panics on a non-boundary offset.
//!
//! Quoted string literals are decoded by [`decode_string_literal`], which
//! tries a strict JSON decode first and falls back to a plain escape decoder.

use once_cell::sync::Lazy;
use regex::Regex;

/// Numeric literal probe, e.g. `10`, `1.5`, `.5`
pub(crate) static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]*\.)?[0-9]+").expect("number pattern compiles"));

/// Read-only view of the template text
#[derive(Debug, Clone, Copy)]
pub(crate) struct Source<'a> {
    text: &'a str,
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        Source { text }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Byte at `at`, if in bounds
    pub fn byte(&self, at: usize) -> Option<u8> {
        self.text.as_bytes().get(at).copied()
    }

    /// Whether `literal` occurs at `at`
    pub fn matches(&self, at: usize, literal: &str) -> bool {
        self.text
            .as_bytes()
            .get(at..)
            .is_some_and(|rest| rest.starts_with(literal.as_bytes()))
    }

    /// Length of the anchored match of `re` at `at`, or 0
    pub fn probe(&self, at: usize, re: &Regex) -> usize {
        self.text
            .get(at..)
            .and_then(|rest| re.find(rest))
            .filter(|m| m.start() == 0)
            .map_or(0, |m| m.end())
    }

    /// Whether `word` occurs at `at` and is not followed by a name character
    pub fn matches_word(&self, at: usize, word: &str) -> bool {
        self.matches(at, word) && !self.byte(at + word.len()).is_some_and(is_name_byte)
    }

    /// Advance from `from` until `stop` holds or input ends.
    ///
    /// Returns the exclusive end offset and the consumed text.
    pub fn read_until(&self, from: usize, stop: impl Fn(u8, usize) -> bool) -> (usize, &'a str) {
        let bytes = self.text.as_bytes();
        let mut i = from;
        while i < bytes.len() && !stop(bytes[i], i) {
            i += 1;
        }
        (i, self.slice(from, i))
    }

    /// `text[start..end]`, or `""` when the range is not on char boundaries
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        self.text.get(start..end).unwrap_or("")
    }
}

/// Whitespace as understood by template tags
pub(crate) fn is_whitespace(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b
}

/// `[A-Za-z0-9_$]`
pub(crate) fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// `[A-Za-z_$]`
pub(crate) fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

/// Decode a quoted literal including its surrounding quotes.
pub fn decode_string_literal(raw: &str) -> String {
    if let Ok(value) = serde_json::from_str::<String>(raw) {
        return value;
    }

    let mut chars = raw.chars();
    let quote = chars.next();
    let inner = chars.as_str();
    let inner = match (quote, inner.chars().last()) {
        (Some(q), Some(last)) if last == q && !inner.is_empty() => {
            &inner[..inner.len() - q.len_utf8()]
        }
        _ => inner,
    };
    unescape(inner)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };

        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // line continuation
            '\n' => {}
            'x' => {
                let hex: String = take_hex(&mut chars, 2);
                match hex_char(&hex, 2) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('x');
                        out.push_str(&hex);
                    }
                }
            }
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    while let Some(&h) = chars.peek() {
                        chars.next();
                        if h == '}' {
                            break;
                        }
                        hex.push(h);
                    }
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(ch) => out.push(ch),
                        None => {
                            out.push_str("u{");
                            out.push_str(&hex);
                            out.push('}');
                        }
                    }
                } else {
                    let hex = take_hex(&mut chars, 4);
                    match hex_char(&hex, 4) {
                        Some(ch) => out.push(ch),
                        None => {
                            out.push('u');
                            out.push_str(&hex);
                        }
                    }
                }
            }
            other => out.push(other),
        }
    }

    out
}

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, n: usize) -> String {
    let mut hex = String::with_capacity(n);
    while hex.len() < n {
        match chars.peek() {
            Some(h) if h.is_ascii_hexdigit() => {
                hex.push(*h);
                chars.next();
            }
            _ => break,
        }
    }
    hex
}

fn hex_char(hex: &str, width: usize) -> Option<char> {
    if hex.len() != width {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_sequence() {
        let src = Source::new("{% if %}");
        assert!(src.matches(0, "{%"));
        assert!(src.matches(6, "%}"));
        assert!(!src.matches(7, "%}"));
        assert!(!src.matches(100, "{"));
    }

    #[test]
    fn test_probe_is_anchored() {
        let src = Source::new("a 12.5");
        assert_eq!(src.probe(0, &NUMBER), 0);
        assert_eq!(src.probe(2, &NUMBER), 4);
        assert_eq!(Source::new(".5").probe(0, &NUMBER), 2);
        assert_eq!(Source::new("1..10").probe(0, &NUMBER), 1);
    }

    #[test]
    fn test_probe_off_boundary() {
        let src = Source::new("é1");
        assert_eq!(src.probe(1, &NUMBER), 0);
    }

    #[test]
    fn test_matches_word() {
        let src = Source::new("and android in include");
        assert!(src.matches_word(0, "and"));
        assert!(!src.matches_word(4, "and"));
        assert!(src.matches_word(12, "in"));
        assert!(!src.matches_word(15, "in"));
    }

    #[test]
    fn test_read_until() {
        let src = Source::new("endif %}");
        let (end, name) = src.read_until(0, |b, _| is_whitespace(b));
        assert_eq!(end, 5);
        assert_eq!(name, "endif");

        let src = Source::new("else%}");
        let (end, name) = src.read_until(0, |b, j| is_whitespace(b) || src.matches(j, "%}"));
        assert_eq!((end, name), (4, "else"));
    }

    #[test]
    fn test_classification() {
        assert!(is_whitespace(b' '));
        assert!(is_whitespace(b'\n'));
        assert!(!is_whitespace(b'a'));
        assert!(is_name_byte(b'$'));
        assert!(is_name_byte(b'9'));
        assert!(!is_name_start(b'9'));
        assert!(!is_name_byte(b'.'));
    }

    #[test]
    fn test_decode_double_quoted() {
        assert_eq!(decode_string_literal(r#""bar""#), "bar");
        assert_eq!(decode_string_literal(r#""\"quoted\"""#), "\"quoted\"");
        assert_eq!(decode_string_literal(r#""tab\there""#), "tab\there");
    }

    #[test]
    fn test_decode_single_quoted() {
        assert_eq!(decode_string_literal("'bar'"), "bar");
        assert_eq!(decode_string_literal(r"'it\'s'"), "it's");
        assert_eq!(decode_string_literal(r#"'say "hi"'"#), "say \"hi\"");
    }

    #[test]
    fn test_decode_permissive_escapes() {
        assert_eq!(decode_string_literal(r#""\x41B\u{43}""#), "ABC");
        assert_eq!(decode_string_literal(r#""\q""#), "q");
        assert_eq!(decode_string_literal("\"a\\\nb\""), "ab");
        assert_eq!(decode_string_literal(r#""\xZZ""#), "xZZ");
    }
}
