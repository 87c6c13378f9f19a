//! Persistence boundary for catalog records.
//!
//! # Responsibility
//! - Define the content store contract consumed by lifecycle services.
//! - Isolate SQLite query details from deletion/import orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`UnsupportedIndex`, `InvalidData`)
//!   in addition to transport errors.
//! - Transport failures are distinguishable (`StoreError::Unavailable`).

pub mod content_store;
