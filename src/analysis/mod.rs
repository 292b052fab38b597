//! Analysis modules.
//!
//! Row filters and numeric aggregations over dataset tables.

pub mod filters;

pub use filters::*;
