//! Tagged record union exchanged with the content store.

use crate::model::course::Course;
use crate::model::enrollment::Enrollment;
use crate::model::lesson::Lesson;
use crate::model::module::Module;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Entity kinds known to the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Course,
    Module,
    Lesson,
    Enrollment,
}

impl EntityKind {
    /// Collection name, also used as the SQLite table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Course => "courses",
            Self::Module => "modules",
            Self::Lesson => "lessons",
            Self::Enrollment => "enrollments",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary index fields usable with `ContentStore::query_by_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexField {
    CourseId,
    ModuleId,
    Slug,
}

impl IndexField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CourseId => "course_id",
            Self::ModuleId => "module_id",
            Self::Slug => "slug",
        }
    }
}

impl Display for IndexField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted entity, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Course(Course),
    Module(Module),
    Lesson(Lesson),
    Enrollment(Enrollment),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Course(_) => EntityKind::Course,
            Self::Module(_) => EntityKind::Module,
            Self::Lesson(_) => EntityKind::Lesson,
            Self::Enrollment(_) => EntityKind::Enrollment,
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Course(course) => course.uuid,
            Self::Module(module) => module.uuid,
            Self::Lesson(lesson) => lesson.uuid,
            Self::Enrollment(enrollment) => enrollment.uuid,
        }
    }

    pub fn into_course(self) -> Option<Course> {
        match self {
            Self::Course(course) => Some(course),
            _ => None,
        }
    }

    pub fn into_module(self) -> Option<Module> {
        match self {
            Self::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn into_lesson(self) -> Option<Lesson> {
        match self {
            Self::Lesson(lesson) => Some(lesson),
            _ => None,
        }
    }

    pub fn into_enrollment(self) -> Option<Enrollment> {
        match self {
            Self::Enrollment(enrollment) => Some(enrollment),
            _ => None,
        }
    }
}

impl From<Course> for Record {
    fn from(value: Course) -> Self {
        Self::Course(value)
    }
}

impl From<Module> for Record {
    fn from(value: Module) -> Self {
        Self::Module(value)
    }
}

impl From<Lesson> for Record {
    fn from(value: Lesson) -> Self {
        Self::Lesson(value)
    }
}

impl From<Enrollment> for Record {
    fn from(value: Enrollment) -> Self {
        Self::Enrollment(value)
    }
}
