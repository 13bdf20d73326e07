//! Directory protocol model
//!
//! Distinguished names and entries shared by the dispatcher, the schema
//! mapping and the filter evaluator.

mod dn;
mod entry;

pub use dn::{escape_dn_value, AttributeTypeAndValue, Dn, Rdn};
pub use entry::{Entry, EntryValue};
