//! Enrollment record.

use crate::model::course::CourseId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable enrollment identifier.
pub type EnrollmentId = Uuid;

/// Learner progress through an enrolled course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentProgress {
    NotStarted,
    InProgress,
    Completed,
}

impl EnrollmentProgress {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A learner's association with one course. Many enrollments may share a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub uuid: EnrollmentId,
    pub course_uuid: CourseId,
    /// Opaque learner reference owned by the identity system.
    pub learner_id: String,
    pub progress: EnrollmentProgress,
    pub completed_lessons: u32,
}

impl Enrollment {
    pub fn new(course_uuid: CourseId, learner_id: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            course_uuid,
            learner_id: learner_id.into(),
            progress: EnrollmentProgress::NotStarted,
            completed_lessons: 0,
        }
    }
}
