//! Legacy course retirement job.
//!
//! # Responsibility
//! - Scan every course, classify it, and cascade-delete legacy ones.
//! - Report partial results instead of aborting on one failed course.
//!
//! # Invariants
//! - Courses are deleted one at a time, in store order.
//! - A run over an already-clean catalog deletes nothing.

use crate::model::course::{Course, CourseId};
use crate::repo::content_store::{ContentStore, StoreResult};
use crate::service::cascade_service::{CascadeDeleter, CascadeError};
use crate::service::classifier::is_legacy;
use log::{info, warn};
use std::time::Instant;

/// One course the job failed to retire.
#[derive(Debug)]
pub struct RetirementFailure {
    pub course_id: CourseId,
    pub error: CascadeError,
}

/// Outcome of one retirement run.
#[derive(Debug, Default)]
pub struct RetirementReport {
    /// Courses enumerated from the store.
    pub scanned: usize,
    /// Courses classified as legacy.
    pub matched: usize,
    /// Courses whose record was removed by this run.
    pub deleted_count: usize,
    pub failed: Vec<RetirementFailure>,
}

impl RetirementReport {
    /// True when no legacy course failed to delete.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_course_ids(&self) -> Vec<CourseId> {
        self.failed.iter().map(|failure| failure.course_id).collect()
    }
}

/// Administrative job retiring legacy courses.
pub struct RetirementJob<S: ContentStore> {
    store: S,
}

impl<S: ContentStore> RetirementJob<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists legacy courses without deleting anything.
    pub fn find_candidates(&self) -> StoreResult<Vec<Course>> {
        let mut courses = self.store.courses()?;
        courses.retain(is_legacy);
        Ok(courses)
    }

    /// Retires every legacy course.
    ///
    /// # Errors
    /// - Returns `StoreError` only when the initial course scan fails. Per
    ///   course failures are collected in the report.
    pub fn run(&self) -> StoreResult<RetirementReport> {
        let started_at = Instant::now();
        info!("event=retirement_run module=retirement status=start");

        let courses = self.store.courses()?;
        let deleter = CascadeDeleter::new(&self.store);
        let mut report = RetirementReport {
            scanned: courses.len(),
            ..RetirementReport::default()
        };

        for course in courses.iter().filter(|course| is_legacy(course)) {
            report.matched += 1;
            match deleter.delete_course(course.uuid) {
                Ok(cascade) => {
                    if cascade.deleted_course {
                        report.deleted_count += 1;
                    }
                }
                Err(error) => {
                    warn!(
                        "event=retirement_course module=retirement status=error course={} retryable={}",
                        course.uuid,
                        error.is_retryable()
                    );
                    report.failed.push(RetirementFailure {
                        course_id: course.uuid,
                        error,
                    });
                }
            }
        }

        info!(
            "event=retirement_run module=retirement status={} scanned={} matched={} deleted={} failed={} duration_ms={}",
            if report.is_clean() { "ok" } else { "partial" },
            report.scanned,
            report.matched,
            report.deleted_count,
            report.failed.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}
