//! Course record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable course identifier.
pub type CourseId = Uuid;

/// Top-level content unit. Owns modules and is referenced by enrollments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub uuid: CourseId,
    pub title: String,
    /// Free-form: either an image URL or a symbolic glyph.
    pub icon: Option<String>,
    /// Unique human-readable key when present.
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl Course {
    /// Creates a course with a generated id and no optional attributes.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            icon: None,
            slug: None,
            description: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}
