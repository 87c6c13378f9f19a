//! Catalog domain model.
//!
//! # Responsibility
//! - Define one explicit record type per entity kind.
//! - Provide the tagged `Record` union the content store speaks in.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Optional attributes are `Option` members, never ad-hoc document fields.
//! - A lesson's `course_uuid` always equals its module's `course_uuid`.

pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod module;
pub mod record;
