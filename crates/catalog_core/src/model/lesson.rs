//! Lesson record and its nested graded content.
//!
//! # Responsibility
//! - Define the five lesson kinds and their storage spelling.
//! - Carry optional code, test case, hint and reward attributes.
//!
//! # Invariants
//! - `module_uuid` and `course_uuid` are fixed at construction.
//! - `course_uuid` is taken from the parent module, never supplied separately.

use crate::model::course::CourseId;
use crate::model::module::{Module, ModuleId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable lesson identifier.
pub type LessonId = Uuid;

/// Recognized lesson kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    Theory,
    Practice,
    Challenge,
    Project,
    Quiz,
}

impl LessonType {
    pub const ALL: [LessonType; 5] = [
        Self::Theory,
        Self::Practice,
        Self::Challenge,
        Self::Project,
        Self::Quiz,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Practice => "practice",
            Self::Challenge => "challenge",
            Self::Project => "project",
            Self::Quiz => "quiz",
        }
    }

    /// Parses the exact lowercase spelling. Unknown kinds yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// One graded input/output pair attached to a practice-style lesson.
///
/// Serialized in camelCase both in import documents and in the
/// `test_cases_json` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
    /// Hidden cases are graded but not shown to the learner.
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub points: u32,
}

/// Atomic content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub uuid: LessonId,
    pub module_uuid: ModuleId,
    /// Denormalized owner course; equals the parent module's course.
    pub course_uuid: CourseId,
    #[serde(rename = "type")]
    pub kind: LessonType,
    pub position: i64,
    pub title: String,
    pub content: String,
    pub code_template: Option<String>,
    pub solution: Option<String>,
    pub language: Option<String>,
    pub test_cases: Vec<TestCase>,
    pub hints: Vec<String>,
    pub xp_reward: Option<u32>,
    pub estimated_minutes: Option<u32>,
}

impl Lesson {
    /// Creates a lesson bound to `module`, inheriting its course.
    pub fn new(
        module: &Module,
        kind: LessonType,
        position: i64,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            module_uuid: module.uuid,
            course_uuid: module.course_uuid,
            kind,
            position,
            title: title.into(),
            content: content.into(),
            code_template: None,
            solution: None,
            language: None,
            test_cases: Vec::new(),
            hints: Vec::new(),
            xp_reward: None,
            estimated_minutes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Lesson, LessonType, TestCase};
    use crate::model::module::Module;
    use uuid::Uuid;

    #[test]
    fn parse_accepts_exactly_the_five_kinds() {
        for kind in LessonType::ALL {
            assert_eq!(LessonType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(LessonType::parse("essay"), None);
        assert_eq!(LessonType::parse("Theory"), None);
    }

    #[test]
    fn new_lesson_inherits_course_from_module() {
        let module = Module::new(Uuid::new_v4(), 1, "Basics");
        let lesson = Lesson::new(&module, LessonType::Quiz, 1, "Check", "body");
        assert_eq!(lesson.module_uuid, module.uuid);
        assert_eq!(lesson.course_uuid, module.course_uuid);
    }

    #[test]
    fn test_case_reads_camel_case_and_defaults_optional_fields() {
        let case: TestCase =
            serde_json::from_str(r#"{ "input": "2 3", "expectedOutput": "5" }"#).unwrap();
        assert_eq!(case.expected_output, "5");
        assert!(!case.is_hidden);
        assert_eq!(case.points, 0);

        let missing: TestCase = serde_json::from_str(r#"{ "isHidden": true }"#).unwrap();
        assert!(missing.input.is_empty());
        assert!(missing.is_hidden);
    }
}
