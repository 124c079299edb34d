//! Java-Properties text codec for entry metadata
//!
//! Extended cache entries keep their status, content type and cookies in a
//! `.prp` file using the `key=value` properties format. The writer escapes the
//! way `java.util.Properties::store` does; the reader accepts the full line
//! syntax (`=`/`:`/whitespace separators, `#`/`!` comments, escapes and
//! backslash continuations) so caches written by other tools stay readable.

use thiserror::Error;

const WHITESPACE: [char; 3] = [' ', '\t', '\x0c'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertiesError {
    #[error("malformed escape sequence in '{0}'")]
    MalformedEscape(String),
}

/// Ordered set of string properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value for the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse properties text
    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let mut props = Self::new();
        let mut lines = text.lines();

        while let Some(line) = lines.next() {
            let trimmed = line.trim_start_matches(WHITESPACE);
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }

            let mut logical = trimmed.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start_matches(WHITESPACE)),
                    None => break,
                }
            }

            let (key, value) = split_key_value(&logical);
            props.set(unescape(key)?, unescape(value)?);
        }

        Ok(props)
    }

    /// Render as properties text, optionally preceded by a comment line
    pub fn to_text(&self, comment: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(comment) = comment {
            out.push('#');
            out.push_str(comment);
            out.push('\n');
        }
        for (key, value) in self.iter() {
            escape_into(key, true, &mut out);
            out.push('=');
            escape_into(value, false, &mut out);
            out.push('\n');
        }
        out
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut separator = None;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                separator = Some((idx, true));
                break;
            }
            ' ' | '\t' | '\x0c' => {
                separator = Some((idx, false));
                break;
            }
            _ => {}
        }
    }

    let Some((idx, explicit)) = separator else {
        return (line, "");
    };

    let key = &line[..idx];
    let mut rest = line[idx + 1..].trim_start_matches(WHITESPACE);
    if !explicit {
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start_matches(WHITESPACE);
        }
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String, PropertiesError> {
    let malformed = || PropertiesError::MalformedEscape(raw.to_string());
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut buf = [0u16; 2];

    while let Some(c) = chars.next() {
        let decoded = if c == '\\' {
            match chars.next() {
                Some('t') => '\t',
                Some('n') => '\n',
                Some('r') => '\r',
                Some('f') => '\x0c',
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if hex.len() != 4 {
                        return Err(malformed());
                    }
                    let unit = u16::from_str_radix(&hex, 16).map_err(|_| malformed())?;
                    units.push(unit);
                    continue;
                }
                Some(other) => other,
                None => break,
            }
        } else {
            c
        };
        units.extend_from_slice(decoded.encode_utf16(&mut buf));
    }

    String::from_utf16(&units).map_err(|_| malformed())
}

fn escape_into(text: &str, is_key: bool, out: &mut String) {
    let mut buf = [0u16; 2];
    for (idx, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if !(' '..='~').contains(&c) => {
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
            c => out.push(c),
        }
    }
}
