//! Catalog access and ordering.
//!
//! `store` holds the typed query wrappers; `reorder` is the pure ordering
//! algebra the admin move/reorder endpoints run before persisting.

pub mod reorder;
pub mod store;
