//! Filter evaluation against directory entries

use super::types::{case_ignore, AssertionValue, Filter, Substrings};
use crate::ldap::{Entry, EntryValue};
use std::cmp::Ordering;

/// Evaluate a filter against an entry
pub fn evaluate(filter: &Filter, entry: &Entry) -> bool {
    filter.matches(entry)
}

impl Filter {
    /// Whether `entry` satisfies this filter
    ///
    /// Comparisons that cannot be made (a numeric assertion that is not a
    /// number, ordering on a boolean attribute) are false, never an error.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(entry)),
            Filter::Not(filter) => !filter.matches(entry),
            Filter::Present { attribute } => {
                values(entry, attribute).is_some_and(|v| !v.is_empty())
            }
            Filter::Equality { attribute, value } => {
                any_value(entry, attribute, |v| equals(v, value))
            }
            Filter::GreaterOrEqual { attribute, value } => any_value(entry, attribute, |v| {
                matches!(compare(v, value), Some(Ordering::Greater | Ordering::Equal))
            }),
            Filter::LessOrEqual { attribute, value } => any_value(entry, attribute, |v| {
                matches!(compare(v, value), Some(Ordering::Less | Ordering::Equal))
            }),
            Filter::Substring {
                attribute,
                substrings,
            } => any_value(entry, attribute, |v| substring_matches(v, substrings)),
            Filter::Approx { attribute, value } => {
                any_value(entry, attribute, |v| approx_equals(v, value))
            }
        }
    }
}

/// Values of an attribute; options in the description are ignored
fn values<'a>(entry: &'a Entry, attribute: &str) -> Option<&'a [EntryValue]> {
    let base = attribute.split(';').next().unwrap_or(attribute);
    entry.get(base)
}

fn any_value(entry: &Entry, attribute: &str, predicate: impl Fn(&EntryValue) -> bool) -> bool {
    values(entry, attribute).is_some_and(|values| values.iter().any(predicate))
}

fn assertion_number(value: &AssertionValue) -> Option<f64> {
    value
        .as_str()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

fn assertion_bool(value: &AssertionValue) -> Option<bool> {
    match value.normalized() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn equals(value: &EntryValue, assertion: &AssertionValue) -> bool {
    match value {
        EntryValue::String(s) => case_ignore(s) == assertion.normalized(),
        EntryValue::Number(n) => assertion_number(assertion).is_some_and(|a| *n == a),
        EntryValue::Boolean(b) => assertion_bool(assertion) == Some(*b),
        EntryValue::Binary(bytes) => bytes.as_slice() == assertion.assertion_value(),
    }
}

/// Order an attribute value against an assertion
///
/// Strings order lexicographically on their case-folded form, numbers
/// numerically. Booleans have no ordering.
fn compare(value: &EntryValue, assertion: &AssertionValue) -> Option<Ordering> {
    match value {
        EntryValue::String(s) => Some(case_ignore(s).as_str().cmp(assertion.normalized())),
        EntryValue::Number(n) => n.partial_cmp(&assertion_number(assertion)?),
        EntryValue::Boolean(_) => None,
        EntryValue::Binary(bytes) => Some(bytes.as_slice().cmp(assertion.assertion_value())),
    }
}

fn substring_matches(value: &EntryValue, substrings: &Substrings) -> bool {
    if let EntryValue::Binary(bytes) = value {
        let any: Vec<&[u8]> = substrings.any.iter().map(AssertionValue::assertion_value).collect();
        return match_pieces(
            bytes,
            substrings.initial.as_ref().map(AssertionValue::assertion_value),
            &any,
            substrings.final_value.as_ref().map(AssertionValue::assertion_value),
        );
    }

    // Components keep their edge spaces, only the value is trimmed
    let fold = |v: &AssertionValue| fold_component(&String::from_utf8_lossy(v.assertion_value()));
    let text = case_ignore(&value.to_string());
    let initial = substrings.initial.as_ref().map(fold);
    let any: Vec<String> = substrings.any.iter().map(fold).collect();
    let final_value = substrings.final_value.as_ref().map(fold);
    let any: Vec<&[u8]> = any.iter().map(String::as_bytes).collect();

    match_pieces(
        text.as_bytes(),
        initial.as_deref().map(str::as_bytes),
        &any,
        final_value.as_deref().map(str::as_bytes),
    )
}

fn fold_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.extend(c.to_lowercase());
            in_space = false;
        }
    }
    out
}

fn match_pieces(value: &[u8], initial: Option<&[u8]>, any: &[&[u8]], final_value: Option<&[u8]>) -> bool {
    let mut rest = value;

    if let Some(initial) = initial {
        match rest.strip_prefix(initial) {
            Some(tail) => rest = tail,
            None => return false,
        }
    }
    if let Some(final_value) = final_value {
        match rest.strip_suffix(final_value) {
            Some(head) => rest = head,
            None => return false,
        }
    }
    for piece in any {
        match find(rest, piece) {
            Some(pos) => rest = &rest[pos + piece.len()..],
            None => return false,
        }
    }
    true
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Permissive fuzzy equality
///
/// Strings match when they are equal once reduced to lowercase letters and
/// digits, or when they are one edit apart. Other types fall back to equality.
fn approx_equals(value: &EntryValue, assertion: &AssertionValue) -> bool {
    match value {
        EntryValue::String(s) => {
            let left = alphanumeric(s);
            let right = alphanumeric(assertion.normalized());
            left == right || edit_distance(&left, &right) <= 1
        }
        other => equals(other, assertion),
    }
}

fn alphanumeric(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn edit_distance(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
