//! Search filter module
//!
//! Parses RFC 4515 filter strings into a `Filter` tree and evaluates the
//! tree against directory entries.
//!
//! # Example
//!
//! ```rust,ignore
//! use dirconnect::filter::Filter;
//!
//! let filter = Filter::parse("(&(username=washington)(!(termsServed<=0)))")?;
//! assert!(filter.matches(&entry));
//! ```
//!
//! Each assertion value is kept in two forms: the text the client sent
//! (`AssertionValue::original`, which is also what `Display` writes) and the
//! folded form matching uses (`AssertionValue::normalized`).

mod eval;
mod parser;
mod types;

pub use eval::evaluate;
pub use types::{escape_value, AssertionValue, Filter, Substrings};

#[cfg(test)]
mod tests;
