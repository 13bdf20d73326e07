//! RFC 4515 filter parser

use super::types::{AssertionValue, Filter, Substrings};
use crate::error::{Error, Result};

/// Deepest nesting of `&`, `|` and `!` accepted
const MAX_DEPTH: usize = 64;

impl Filter {
    /// Parse a filter string such as `(&(username=washington)(!(termsServed<=0)))`
    ///
    /// Leading and trailing whitespace around the filter is ignored. Extensible
    /// match (`:=`) is not supported.
    pub fn parse(input: &str) -> Result<Filter> {
        let mut parser = Parser {
            input,
            bytes: input.as_bytes(),
            pos: input.len() - input.trim_start().len(),
        };
        if parser.pos == input.len() {
            return Err(Error::filter_syntax(0, "empty filter"));
        }

        let filter = parser.filter(0)?;
        let end = input.trim_end().len();
        if parser.pos < end {
            return Err(Error::filter_syntax(
                parser.pos,
                "unexpected characters after the filter",
            ));
        }
        Ok(filter)
    }
}

impl std::str::FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Filter::parse(s)
    }
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(b) => Err(Error::filter_syntax(
                self.pos,
                format!("expected '{}', found '{}'", byte as char, b as char),
            )),
            None => Err(Error::filter_syntax(
                self.pos,
                format!("expected '{}', found end of filter", byte as char),
            )),
        }
    }

    fn filter(&mut self, depth: usize) -> Result<Filter> {
        if depth > MAX_DEPTH {
            return Err(Error::filter_syntax(self.pos, "filter is nested too deeply"));
        }
        self.expect(b'(')?;
        let filter = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                Filter::And(self.filter_list(depth, '&')?)
            }
            Some(b'|') => {
                self.pos += 1;
                Filter::Or(self.filter_list(depth, '|')?)
            }
            Some(b'!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter(depth + 1)?))
            }
            Some(b')') => return Err(Error::filter_syntax(self.pos, "empty expression")),
            None => return Err(Error::filter_syntax(self.pos, "unbalanced parentheses")),
            Some(_) => self.item()?,
        };
        self.expect(b')')?;
        Ok(filter)
    }

    fn filter_list(&mut self, depth: usize, op: char) -> Result<Vec<Filter>> {
        let mut filters = Vec::new();
        while self.peek() == Some(b'(') {
            filters.push(self.filter(depth + 1)?);
        }
        if filters.is_empty() {
            return Err(Error::filter_syntax(
                self.pos,
                format!("empty '{op}' expression"),
            ));
        }
        Ok(filters)
    }

    fn item(&mut self) -> Result<Filter> {
        let attr_start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b';') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let attribute = &self.input[attr_start..self.pos];
        validate_attribute(attribute, attr_start)?;

        let op_pos = self.pos;
        let op = match (self.peek(), self.bytes.get(self.pos + 1).copied()) {
            (Some(b'='), _) => {
                self.pos += 1;
                "="
            }
            (Some(b'~'), Some(b'=')) => {
                self.pos += 2;
                "~="
            }
            (Some(b'>'), Some(b'=')) => {
                self.pos += 2;
                ">="
            }
            (Some(b'<'), Some(b'=')) => {
                self.pos += 2;
                "<="
            }
            (Some(b':'), _) => {
                return Err(Error::filter_syntax(
                    op_pos,
                    "extensible match filters are not supported",
                ))
            }
            (None, _) => return Err(Error::filter_syntax(op_pos, "unbalanced parentheses")),
            (Some(b), _) => {
                return Err(Error::filter_syntax(
                    op_pos,
                    format!("expected a filter operator, found '{}'", b as char),
                ))
            }
        };

        let value_start = self.pos;
        while let Some(b) = self.peek() {
            match b {
                b')' => break,
                b'(' => {
                    return Err(Error::filter_syntax(self.pos, "unescaped '(' in value"))
                }
                0 => return Err(Error::filter_syntax(self.pos, "NUL in value")),
                _ => self.pos += 1,
            }
        }
        if self.peek().is_none() {
            return Err(Error::filter_syntax(self.pos, "unbalanced parentheses"));
        }
        let text = &self.input[value_start..self.pos];
        let attribute = attribute.to_string();

        match op {
            "=" if text == "*" => Ok(Filter::Present { attribute }),
            "=" if text.contains('*') => Ok(Filter::Substring {
                attribute,
                substrings: substrings(text, value_start)?,
            }),
            "=" => Ok(Filter::Equality {
                attribute,
                value: assertion_value(text, value_start)?,
            }),
            "~=" => Ok(Filter::Approx {
                attribute,
                value: assertion_value(text, value_start)?,
            }),
            ">=" => Ok(Filter::GreaterOrEqual {
                attribute,
                value: assertion_value(text, value_start)?,
            }),
            _ => Ok(Filter::LessOrEqual {
                attribute,
                value: assertion_value(text, value_start)?,
            }),
        }
    }
}

/// Check an attribute description: `descr` or numeric OID, then `;options`
fn validate_attribute(attribute: &str, offset: usize) -> Result<()> {
    if attribute.is_empty() {
        return Err(Error::filter_syntax(offset, "missing attribute description"));
    }
    let mut parts = attribute.split(';');
    let base = parts.next().unwrap_or_default();

    let valid_base = match base.bytes().next() {
        Some(b) if b.is_ascii_alphabetic() => base
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-'),
        Some(b) if b.is_ascii_digit() => base.split('.').all(|arc| {
            !arc.is_empty()
                && arc.bytes().all(|b| b.is_ascii_digit())
                && (arc == "0" || !arc.starts_with('0'))
        }),
        _ => false,
    };
    if !valid_base {
        return Err(Error::filter_syntax(
            offset,
            format!("malformed attribute description '{attribute}'"),
        ));
    }

    for option in parts {
        if option.is_empty() || !option.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(Error::filter_syntax(
                offset,
                format!("malformed attribute option in '{attribute}'"),
            ));
        }
    }
    Ok(())
}

/// Decode an assertion value, keeping its original text
fn assertion_value(text: &str, offset: usize) -> Result<AssertionValue> {
    let raw = text.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        match raw[i] {
            b'\\' => {
                let hex = raw
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .ok_or_else(|| {
                        Error::filter_syntax(
                            offset + i,
                            "'\\' must be followed by two hex digits",
                        )
                    })?;
                let high = hex_digit(hex[0]);
                let low = hex_digit(hex[1]);
                bytes.push((high << 4) | low);
                i += 3;
            }
            b'*' => {
                return Err(Error::filter_syntax(offset + i, "unescaped '*' in value"));
            }
            b => {
                bytes.push(b);
                i += 1;
            }
        }
    }

    Ok(AssertionValue::from_parts(text.to_string(), bytes))
}

fn hex_digit(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

fn substrings(text: &str, offset: usize) -> Result<Substrings> {
    let pieces: Vec<&str> = text.split('*').collect();
    let last = pieces.len() - 1;
    let mut result = Substrings {
        initial: None,
        any: Vec::new(),
        final_value: None,
    };

    let mut piece_offset = offset;
    for (i, piece) in pieces.iter().enumerate() {
        if i == 0 {
            if !piece.is_empty() {
                result.initial = Some(assertion_value(piece, piece_offset)?);
            }
        } else if i == last {
            if !piece.is_empty() {
                result.final_value = Some(assertion_value(piece, piece_offset)?);
            }
        } else if piece.is_empty() {
            return Err(Error::filter_syntax(piece_offset, "empty substring component"));
        } else {
            result.any.push(assertion_value(piece, piece_offset)?);
        }
        piece_offset += piece.len() + 1;
    }

    Ok(result)
}
