//! Module record.

use crate::model::course::CourseId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable module identifier.
pub type ModuleId = Uuid;

/// Ordered grouping of lessons, exclusively owned by one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub uuid: ModuleId,
    pub course_uuid: CourseId,
    /// Ordering key among the modules of one course.
    pub position: i64,
    pub title: String,
    pub description: Option<String>,
}

impl Module {
    pub fn new(course_uuid: CourseId, position: i64, title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            course_uuid,
            position,
            title: title.into(),
            description: None,
        }
    }
}
