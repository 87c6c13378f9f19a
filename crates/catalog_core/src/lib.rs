//! Core content lifecycle logic for the course catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogSink};
pub use model::course::{Course, CourseId};
pub use model::enrollment::{Enrollment, EnrollmentId, EnrollmentProgress};
pub use model::lesson::{Lesson, LessonId, LessonType, TestCase};
pub use model::module::{Module, ModuleId};
pub use model::record::{EntityKind, IndexField, Record};
pub use repo::content_store::{ContentStore, SqliteContentStore, StoreError, StoreResult};
pub use service::cascade_service::{
    CascadeDeleter, CascadeError, CascadeReport, CascadeStep, CascadeTarget,
};
pub use service::classifier::is_legacy;
pub use service::diagnostics::lesson_titles_by_slug;
pub use service::import_service::{
    ContentImporter, CourseSpec, ImportDocument, ImportError, ImportMode, ImportOutcome,
    LessonSpec, ModuleSpec, ValidationIssue, MAX_POSITION,
};
pub use service::retirement_service::{RetirementFailure, RetirementJob, RetirementReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
