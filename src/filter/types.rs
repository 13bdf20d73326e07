//! Filter expression types

use std::fmt;

/// Fold a string for case-ignore matching
///
/// Leading and trailing space is dropped, inner runs of whitespace become a
/// single space and letters are lowercased.
pub(crate) fn case_ignore(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Escape raw bytes for use as an assertion value in filter text
///
/// `*`, `(`, `)`, `\` and NUL are always escaped. Bytes that are not part of
/// valid UTF-8 are escaped as well.
pub fn escape_value(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            for c in text.chars() {
                match c {
                    '*' | '(' | ')' | '\\' | '\0' => out.push_str(&format!("\\{:02x}", c as u32)),
                    _ => out.push(c),
                }
            }
        }
        Err(_) => {
            for &b in bytes {
                if b.is_ascii() && !matches!(b, b'*' | b'(' | b')' | b'\\' | 0) {
                    out.push(char::from(b));
                } else {
                    out.push_str(&format!("\\{b:02x}"));
                }
            }
        }
    }
    out
}

/// The value side of a filter comparison
///
/// Keeps what the client sent next to what matching uses. `original` is the
/// text exactly as written in the filter, escapes included; it is what
/// `Display` writes back. `assertion_value` is the decoded value and
/// `normalized` its case-folded comparison form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionValue {
    original: String,
    bytes: Vec<u8>,
    normalized: String,
}

impl AssertionValue {
    pub(crate) fn from_parts(original: String, bytes: Vec<u8>) -> Self {
        let normalized = case_ignore(&String::from_utf8_lossy(&bytes));
        Self {
            original,
            bytes,
            normalized,
        }
    }

    /// Value built in code rather than parsed
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self::from_parts(escape_value(&bytes), bytes)
    }

    /// The value text as the client wrote it, escapes included
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The decoded assertion value, byte for byte
    pub fn assertion_value(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded value, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Comparison form used by evaluation
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl From<&str> for AssertionValue {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl From<String> for AssertionValue {
    fn from(value: String) -> Self {
        Self::from_bytes(value.into_bytes())
    }
}

/// Components of a substring assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substrings {
    pub initial: Option<AssertionValue>,
    pub any: Vec<AssertionValue>,
    pub final_value: Option<AssertionValue>,
}

/// A parsed search filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality {
        attribute: String,
        value: AssertionValue,
    },
    Substring {
        attribute: String,
        substrings: Substrings,
    },
    GreaterOrEqual {
        attribute: String,
        value: AssertionValue,
    },
    LessOrEqual {
        attribute: String,
        value: AssertionValue,
    },
    Present {
        attribute: String,
    },
    Approx {
        attribute: String,
        value: AssertionValue,
    },
}

impl Filter {
    /// `(attribute=value)`
    pub fn equality(attribute: impl Into<String>, value: impl Into<AssertionValue>) -> Self {
        Filter::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// `(attribute=*)`
    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Attribute description of a leaf filter
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Filter::Equality { attribute, .. }
            | Filter::Substring { attribute, .. }
            | Filter::GreaterOrEqual { attribute, .. }
            | Filter::LessOrEqual { attribute, .. }
            | Filter::Present { attribute }
            | Filter::Approx { attribute, .. } => Some(attribute),
            Filter::And(_) | Filter::Or(_) | Filter::Not(_) => None,
        }
    }

    /// Filter text with every value re-escaped from its decoded form
    ///
    /// Equal to `to_string()` unless the client escaped characters that did
    /// not need it, or used uppercase hex.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, &|v: &AssertionValue| escape_value(v.assertion_value()));
        out
    }

    fn write(&self, out: &mut String, value: &dyn Fn(&AssertionValue) -> String) {
        out.push('(');
        match self {
            Filter::And(filters) | Filter::Or(filters) => {
                out.push(if matches!(self, Filter::And(_)) { '&' } else { '|' });
                for filter in filters {
                    filter.write(out, value);
                }
            }
            Filter::Not(filter) => {
                out.push('!');
                filter.write(out, value);
            }
            Filter::Equality { attribute, value: v } => {
                out.push_str(attribute);
                out.push('=');
                out.push_str(&value(v));
            }
            Filter::Substring {
                attribute,
                substrings,
            } => {
                out.push_str(attribute);
                out.push('=');
                if let Some(initial) = &substrings.initial {
                    out.push_str(&value(initial));
                }
                out.push('*');
                for any in &substrings.any {
                    out.push_str(&value(any));
                    out.push('*');
                }
                if let Some(final_value) = &substrings.final_value {
                    out.push_str(&value(final_value));
                }
            }
            Filter::GreaterOrEqual { attribute, value: v } => {
                out.push_str(attribute);
                out.push_str(">=");
                out.push_str(&value(v));
            }
            Filter::LessOrEqual { attribute, value: v } => {
                out.push_str(attribute);
                out.push_str("<=");
                out.push_str(&value(v));
            }
            Filter::Present { attribute } => {
                out.push_str(attribute);
                out.push_str("=*");
            }
            Filter::Approx { attribute, value: v } => {
                out.push_str(attribute);
                out.push_str("~=");
                out.push_str(&value(v));
            }
        }
        out.push(')');
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write(&mut out, &|v: &AssertionValue| v.original().to_string());
        f.write_str(&out)
    }
}
