//! Rating categories (tiers)
//!
//! Categories are contiguous rating bands kept in a configuration table so
//! alternate tier layouts can be substituted without code changes.

pub mod table;

pub use table::{CategoryTable, CategoryTransition, Tier};
