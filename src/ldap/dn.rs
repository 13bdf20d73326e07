//! Distinguished names
//!
//! Parsing and formatting follow RFC 4514 for the string forms clients send:
//! `username=washington,o=pennaveiam`. Multi-valued RDNs (`cn=a+sn=b`) and
//! `\`-escapes (both `\,` and `\2c`) are supported. Comparison is
//! case-insensitive on attribute types and values.

use crate::error::{Error, Result};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single attribute type and value pair inside an RDN
#[derive(Debug, Clone)]
pub struct AttributeTypeAndValue {
    pub attribute: String,
    pub value: String,
}

/// A relative distinguished name
#[derive(Debug, Clone)]
pub struct Rdn {
    components: Vec<AttributeTypeAndValue>,
}

impl Rdn {
    /// Create a single-valued RDN
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            components: vec![AttributeTypeAndValue {
                attribute: attribute.into(),
                value: value.into(),
            }],
        }
    }

    /// All attribute/value pairs of this RDN
    pub fn components(&self) -> &[AttributeTypeAndValue] {
        &self.components
    }

    /// Attribute type of the first component
    pub fn attribute(&self) -> &str {
        &self.components[0].attribute
    }

    /// Value of the first component
    pub fn value(&self) -> &str {
        &self.components[0].value
    }

    /// Value for the given attribute type, if this RDN names it
    pub fn value_of(&self, attribute: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|c| c.attribute.eq_ignore_ascii_case(attribute))
            .map(|c| c.value.as_str())
    }

    fn normalized(&self) -> String {
        let mut parts: Vec<String> = self
            .components
            .iter()
            .map(|c| {
                format!(
                    "{}={}",
                    c.attribute.to_ascii_lowercase(),
                    escape_dn_value(&c.value.to_lowercase())
                )
            })
            .collect();
        parts.sort();
        parts.join("+")
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}={}", c.attribute, escape_dn_value(&c.value))?;
        }
        Ok(())
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Rdn {}

/// A distinguished name, leftmost (most specific) RDN first
#[derive(Debug, Clone, Default)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// The empty (root) DN
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a DN from its string form
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = trim_unescaped(input);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut rdns = Vec::new();
        for rdn_text in split_unescaped(trimmed, ',') {
            let mut components = Vec::new();
            for ava_text in split_unescaped(&rdn_text, '+') {
                let (attribute, raw_value) = ava_text
                    .split_once('=')
                    .ok_or_else(|| Error::invalid_dn(input, format!("'{ava_text}' has no '='")))?;
                let attribute = attribute.trim();
                if !is_valid_attribute_type(attribute) {
                    return Err(Error::invalid_dn(
                        input,
                        format!("invalid attribute type '{attribute}'"),
                    ));
                }
                let value = unescape_dn_value(trim_unescaped(raw_value))
                    .map_err(|message| Error::invalid_dn(input, message))?;
                components.push(AttributeTypeAndValue {
                    attribute: attribute.to_string(),
                    value,
                });
            }
            rdns.push(Rdn { components });
        }

        Ok(Self { rdns })
    }

    /// RDNs, leftmost first
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// The leftmost RDN, `None` for the root DN
    pub fn leftmost(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    /// Parent DN (the root DN is its own parent)
    pub fn parent(&self) -> Dn {
        Dn {
            rdns: self.rdns.iter().skip(1).cloned().collect(),
        }
    }

    /// Child DN with the given RDN prepended
    pub fn child(&self, rdn: Rdn) -> Dn {
        let mut rdns = Vec::with_capacity(self.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(self.rdns.iter().cloned());
        Dn { rdns }
    }

    /// Whether this DN is `ancestor` or lies below it
    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        if ancestor.rdns.len() > self.rdns.len() {
            return false;
        }
        let offset = self.rdns.len() - ancestor.rdns.len();
        self.rdns[offset..]
            .iter()
            .zip(&ancestor.rdns)
            .all(|(a, b)| a == b)
    }

    /// Whether this DN is exactly one level below `parent`
    pub fn is_child_of(&self, parent: &Dn) -> bool {
        self.rdns.len() == parent.rdns.len() + 1 && self.is_descendant_of(parent)
    }

    /// Case-folded string form used for comparison
    pub fn normalized(&self) -> String {
        self.rdns
            .iter()
            .map(Rdn::normalized)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for Dn {}

impl Hash for Dn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl std::str::FromStr for Dn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Dn::parse(s)
    }
}

fn is_valid_attribute_type(attribute: &str) -> bool {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric() || c == '-'),
        Some(c) if c.is_ascii_digit() => attribute
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())),
        _ => false,
    }
}

/// Split on a separator that is not preceded by a backslash escape
fn split_unescaped(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Trim surrounding whitespace, keeping a trailing space written as `\ `
fn trim_unescaped(raw: &str) -> &str {
    let raw = raw.trim_start();
    let bytes = raw.as_bytes();
    let mut end = raw.len();

    while end > 0 && bytes[end - 1].is_ascii_whitespace() {
        let backslashes = bytes[..end - 1]
            .iter()
            .rev()
            .take_while(|b| **b == b'\\')
            .count();
        if backslashes % 2 == 1 {
            break;
        }
        end -= 1;
    }
    &raw[..end]
}

fn unescape_dn_value(raw: &str) -> std::result::Result<String, String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let next = *bytes
            .get(i + 1)
            .ok_or_else(|| "value ends with a dangling escape".to_string())?;
        if next.is_ascii_hexdigit() {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| format!("invalid hex escape at offset {i}"))?;
            out.push(hex);
            i += 3;
        } else if matches!(
            next,
            b',' | b'+' | b'"' | b'\\' | b'<' | b'>' | b';' | b'=' | b' ' | b'#'
        ) {
            out.push(next);
            i += 2;
        } else {
            return Err(format!("invalid escape '\\{}' at offset {i}", next as char));
        }
    }

    String::from_utf8(out).map_err(|_| "value is not valid UTF-8 after unescaping".to_string())
}

/// Escape an attribute value for use in a DN string
pub fn escape_dn_value(value: &str) -> String {
    let char_count = value.chars().count();
    let mut result = String::with_capacity(value.len() + 4);

    for (i, ch) in value.chars().enumerate() {
        let is_first = i == 0;
        let is_last = i + 1 == char_count;

        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                result.push('\\');
                result.push(ch);
            }
            '\0' => result.push_str("\\00"),
            ' ' if is_first || is_last => result.push_str("\\20"),
            '#' if is_first => result.push_str("\\23"),
            _ => result.push(ch),
        }
    }

    result
}
