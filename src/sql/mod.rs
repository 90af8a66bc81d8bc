//! SQL dialect handling.
//!
//! - [`dialect`] - dialect names and the asset type lookup

pub mod dialect;

pub use dialect::{BuiltinDialects, Dialect, DialectLookup, UnknownDialect};
