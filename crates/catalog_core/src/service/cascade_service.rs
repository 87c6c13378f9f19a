//! Cascading course/module deletion.
//!
//! # Responsibility
//! - Remove a course together with its modules, lessons and enrollments.
//! - Remove a single module together with its lessons.
//!
//! # Invariants
//! - Children are deleted before parents: lessons, then their module,
//!   then enrollments, then the course.
//! - The first failing store call stops the sequence. The course row is never
//!   deleted while dependents may remain.
//! - Missing targets are a zero-count success, so a delete can be re-issued
//!   after a partial failure to finish the job.
//! - No retries happen here.

use crate::model::course::CourseId;
use crate::model::module::ModuleId;
use crate::model::record::EntityKind;
use crate::repo::content_store::{ContentStore, StoreError};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Counts of records removed by one cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub deleted_modules: usize,
    pub deleted_lessons: usize,
    pub deleted_enrollments: usize,
    /// Whether the target course row itself was removed by this call.
    pub deleted_course: bool,
}

impl CascadeReport {
    /// Number of successful delete sub-operations.
    pub fn completed_operations(&self) -> usize {
        self.deleted_modules
            + self.deleted_lessons
            + self.deleted_enrollments
            + usize::from(self.deleted_course)
    }

    pub fn is_empty(&self) -> bool {
        self.completed_operations() == 0
    }
}

/// Root entity a cascade was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeTarget {
    Course(CourseId),
    Module(ModuleId),
}

impl Display for CascadeTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Course(id) => write!(f, "course {id}"),
            Self::Module(id) => write!(f, "module {id}"),
        }
    }
}

/// Store call that failed inside a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    LoadModule(ModuleId),
    ListModules,
    ListLessons(ModuleId),
    ListEnrollments,
    Delete { kind: EntityKind, id: Uuid },
}

impl Display for CascadeStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadModule(id) => write!(f, "load module {id}"),
            Self::ListModules => write!(f, "list modules"),
            Self::ListLessons(id) => write!(f, "list lessons of module {id}"),
            Self::ListEnrollments => write!(f, "list enrollments"),
            Self::Delete { kind, id } => write!(f, "delete {kind} {id}"),
        }
    }
}

/// Partial failure of a cascade.
///
/// `completed` holds everything removed before `step` failed; re-issuing the
/// same delete resumes from there.
#[derive(Debug)]
pub struct CascadeError {
    pub target: CascadeTarget,
    pub step: CascadeStep,
    pub completed: CascadeReport,
    pub source: StoreError,
}

impl CascadeError {
    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}

impl Display for CascadeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cascade delete of {} stopped at `{}` after {} deletes: {}",
            self.target,
            self.step,
            self.completed.completed_operations(),
            self.source
        )
    }
}

impl Error for CascadeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

type StepResult<T> = Result<T, (CascadeStep, StoreError)>;

/// Children-first deleter over a content store.
pub struct CascadeDeleter<S: ContentStore> {
    store: S,
}

impl<S: ContentStore> CascadeDeleter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Deletes a course and every module, lesson and enrollment that
    /// references it.
    ///
    /// Callers must not run two deletes of the same course concurrently.
    pub fn delete_course(&self, course_id: CourseId) -> Result<CascadeReport, CascadeError> {
        let target = CascadeTarget::Course(course_id);
        self.run(target, |report| self.sweep_course(course_id, report))
    }

    /// Deletes one module and its lessons. Its course is left untouched.
    pub fn delete_module(&self, module_id: ModuleId) -> Result<CascadeReport, CascadeError> {
        let target = CascadeTarget::Module(module_id);
        self.run(target, |report| {
            let found = self
                .store
                .get(EntityKind::Module, module_id)
                .map_err(|source| (CascadeStep::LoadModule(module_id), source))?;
            if found.is_some() {
                self.sweep_module(module_id, report)?;
            }
            Ok(())
        })
    }

    fn run(
        &self,
        target: CascadeTarget,
        sweep: impl FnOnce(&mut CascadeReport) -> StepResult<()>,
    ) -> Result<CascadeReport, CascadeError> {
        let started_at = Instant::now();
        info!("event=cascade_delete module=cascade status=start target=\"{target}\"");

        let mut report = CascadeReport::default();
        match sweep(&mut report) {
            Ok(()) => {
                info!(
                    "event=cascade_delete module=cascade status=ok target=\"{}\" modules={} lessons={} enrollments={} course={} duration_ms={}",
                    target,
                    report.deleted_modules,
                    report.deleted_lessons,
                    report.deleted_enrollments,
                    report.deleted_course,
                    started_at.elapsed().as_millis()
                );
                Ok(report)
            }
            Err((step, source)) => {
                error!(
                    "event=cascade_delete module=cascade status=error target=\"{}\" step=\"{}\" completed={} retryable={} duration_ms={} error={}",
                    target,
                    step,
                    report.completed_operations(),
                    source.is_retryable(),
                    started_at.elapsed().as_millis(),
                    source
                );
                Err(CascadeError {
                    target,
                    step,
                    completed: report,
                    source,
                })
            }
        }
    }

    fn sweep_course(&self, course_id: CourseId, report: &mut CascadeReport) -> StepResult<()> {
        let modules = self
            .store
            .modules_of(course_id)
            .map_err(|source| (CascadeStep::ListModules, source))?;
        for module in modules {
            self.sweep_module(module.uuid, report)?;
        }

        let enrollments = self
            .store
            .enrollments_of(course_id)
            .map_err(|source| (CascadeStep::ListEnrollments, source))?;
        for enrollment in enrollments {
            if self.remove(EntityKind::Enrollment, enrollment.uuid)? {
                report.deleted_enrollments += 1;
            }
        }

        report.deleted_course = self.remove(EntityKind::Course, course_id)?;
        Ok(())
    }

    fn sweep_module(&self, module_id: ModuleId, report: &mut CascadeReport) -> StepResult<()> {
        let lessons = self
            .store
            .lessons_of(module_id)
            .map_err(|source| (CascadeStep::ListLessons(module_id), source))?;
        for lesson in lessons {
            if self.remove(EntityKind::Lesson, lesson.uuid)? {
                report.deleted_lessons += 1;
            }
        }

        if self.remove(EntityKind::Module, module_id)? {
            report.deleted_modules += 1;
        }
        Ok(())
    }

    fn remove(&self, kind: EntityKind, id: Uuid) -> StepResult<bool> {
        self.store
            .delete(kind, id)
            .map_err(|source| (CascadeStep::Delete { kind, id }, source))
    }
}
