//! Line and field splitting for AT information text.
//!
//! Nothing in here fails: a line that does not have the expected shape just
//! yields fewer fields, and callers treat a missing field as absent.
//!
//! Fields are split on commas only. Surrounding spaces are trimmed but never
//! delimit, so keys such as `RSCP LEV` stay whole.

use core::str::FromStr;

/// A single line of modem output with the optional `+CMD:` echo prefix split
/// off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    raw: &'a str,
    label: Option<&'a str>,
    body: &'a str,
}

impl<'a> Line<'a> {
    pub fn new(text: &'a str) -> Self {
        let text = text.trim();

        if let Some((label, body)) = text.strip_prefix('+').and_then(|t| t.split_once(':')) {
            if !label.is_empty() && label.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Self {
                    raw: text,
                    label: Some(label),
                    body: body.trim(),
                };
            }
        }

        Self {
            raw: text,
            label: None,
            body: text,
        }
    }

    /// The whole line, trimmed, echo prefix included.
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Command label of the echo prefix, without `+` and `:`.
    pub fn label(&self) -> Option<&'a str> {
        self.label
    }

    /// Everything after the echo prefix, or the whole line without one.
    pub fn body(&self) -> &'a str {
        self.body
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn fields(&self) -> Fields<'a> {
        Fields::new(self.body)
    }

    pub fn field(&self, n: usize) -> Option<&'a str> {
        self.fields().nth(n)
    }

    pub fn quoted(&self) -> Quoted<'a> {
        quoted(self.body)
    }
}

/// Iterate the non-empty lines of a chunk. Accepts `\r\n`, bare `\n` and
/// bare `\r` terminators, or none at all.
pub fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    text.split(['\r', '\n'])
        .map(Line::new)
        .filter(|line| !line.is_empty())
}

/// Comma separated fields with surrounding whitespace trimmed. Commas inside
/// double quotes do not split, and empty fields are kept.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    rest: Option<&'a str>,
}

impl<'a> Fields<'a> {
    pub fn new(body: &'a str) -> Self {
        Self {
            rest: (!body.trim().is_empty()).then_some(body),
        }
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;

        let mut in_quotes = false;
        for (i, c) in rest.char_indices() {
            match c {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => {
                    self.rest = Some(&rest[i + 1..]);
                    return Some(rest[..i].trim());
                }
                _ => {}
            }
        }

        self.rest = None;
        Some(rest.trim())
    }
}

/// Substrings enclosed in double quotes, in order of appearance. An
/// unterminated trailing quote is ignored.
#[derive(Debug, Clone)]
pub struct Quoted<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Quoted<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, after_open) = self.rest.split_once('"')?;
        let (inner, after_close) = after_open.split_once('"')?;
        self.rest = after_close;
        Some(inner)
    }
}

pub fn quoted(text: &str) -> Quoted<'_> {
    Quoted { rest: text }
}

/// Strip one pair of enclosing double quotes, if present.
pub fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}

/// Parse a decimal field. Leading zeros are accepted (`Arfcn:00128`).
pub fn dec<T: FromStr>(field: &str) -> Option<T> {
    unquote(field).parse().ok()
}

/// Parse a hexadecimal field, with or without a `0x` prefix.
pub fn hex(field: &str) -> Option<u32> {
    let field = unquote(field);
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u32::from_str_radix(digits, 16).ok()
}
