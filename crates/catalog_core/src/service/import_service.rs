//! Structured course import.
//!
//! # Responsibility
//! - Parse a nested Course/Module/Lesson document.
//! - Validate the whole document before the first write.
//! - Write the graph top-down: course, then each module, then its lessons.
//!
//! # Invariants
//! - A document with any validation issue writes nothing.
//! - Lesson `course_uuid` is always derived from the module being written.
//! - Lesson positions are unique within one module; module positions are
//!   unique within one course.
//! - Every position written by an import lies in `1..=MAX_POSITION`.
//! - A storage failure after validation leaves written rows in place and
//!   reports how many were committed.
//!
//! # Import modes
//! - `InsertNew` (default): always creates a new course. A slug that already
//!   exists is a validation issue.
//! - `AppendToSlug`: resolves an existing course by slug and appends modules
//!   after its current last position. A missing course is `CourseNotFound`.

use crate::model::course::{Course, CourseId};
use crate::model::lesson::{Lesson, LessonType, TestCase};
use crate::model::module::Module;
use crate::repo::content_store::{ContentStore, StoreError};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// Largest module or lesson position an import may assign.
pub const MAX_POSITION: i64 = 1_000_000;

/// How the importer resolves the target course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    #[default]
    InsertNew,
    AppendToSlug,
}

impl ImportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsertNew => "insert_new",
            Self::AppendToSlug => "append_to_slug",
        }
    }
}

/// Top-level import document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDocument {
    pub course: CourseSpec,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSpec {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Overrides the default 1-based sequence position.
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub lessons: Vec<LessonSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSpec {
    pub title: String,
    /// Kept as text so unknown kinds surface as validation issues.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub code_template: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    /// Missing `input` or `expectedOutput` surface as validation issues.
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub xp_reward: Option<u32>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
}

/// One problem found while validating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Location such as `modules[1].lessons[0].type`.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Successful import summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub course_id: CourseId,
    /// False when modules were appended to an existing course.
    pub created_course: bool,
    pub modules_written: usize,
    pub lessons_written: usize,
}

/// Errors from content import.
#[derive(Debug)]
pub enum ImportError {
    /// Input is not a well-formed import document.
    MalformedDocument(serde_json::Error),
    /// Document failed validation. Nothing was written.
    Validation(Vec<ValidationIssue>),
    /// `AppendToSlug` target course does not exist. Nothing was written.
    CourseNotFound(String),
    /// A pre-write lookup failed. Nothing was written.
    Store(StoreError),
    /// A write failed after validation. Committed rows are left in place.
    PartialWrite {
        course_id: Option<CourseId>,
        modules_committed: usize,
        lessons_committed: usize,
        source: StoreError,
    },
}

impl ImportError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(err) | Self::PartialWrite { source: err, .. } => err.is_retryable(),
            Self::MalformedDocument(_) | Self::Validation(_) | Self::CourseNotFound(_) => false,
        }
    }
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedDocument(err) => write!(f, "malformed import document: {err}"),
            Self::Validation(issues) => {
                write!(f, "import document has {} validation issue(s)", issues.len())?;
                for issue in issues {
                    write!(f, "; {issue}")?;
                }
                Ok(())
            }
            Self::CourseNotFound(slug) => write!(f, "no course with slug `{slug}`"),
            Self::Store(err) => write!(f, "{err}"),
            Self::PartialWrite {
                course_id,
                modules_committed,
                lessons_committed,
                source,
            } => {
                let course = course_id.map_or_else(|| "none".to_string(), |id| id.to_string());
                write!(
                    f,
                    "import stopped after committing course {course}, {modules_committed} module(s), {lessons_committed} lesson(s): {source}"
                )
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedDocument(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::PartialWrite { source, .. } => Some(source),
            Self::Validation(_) | Self::CourseNotFound(_) => None,
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedDocument(value)
    }
}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Validated module with resolved positions and parsed lesson kinds.
struct PlannedModule<'doc> {
    spec: &'doc ModuleSpec,
    position: i64,
    lessons: Vec<PlannedLesson<'doc>>,
}

struct PlannedLesson<'doc> {
    spec: &'doc LessonSpec,
    kind: LessonType,
    position: i64,
}

/// Course graph importer.
pub struct ContentImporter<S: ContentStore> {
    store: S,
    mode: ImportMode,
}

impl<S: ContentStore> ContentImporter<S> {
    /// Creates an importer running in `ImportMode::InsertNew`.
    pub fn new(store: S) -> Self {
        Self::with_mode(store, ImportMode::InsertNew)
    }

    pub fn with_mode(store: S, mode: ImportMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    /// Parses a JSON document and imports it.
    pub fn import_json(&self, json: &str) -> Result<ImportOutcome, ImportError> {
        let document: ImportDocument = serde_json::from_str(json)?;
        self.import_course(&document)
    }

    /// Validates and writes one course graph.
    pub fn import_course(&self, document: &ImportDocument) -> Result<ImportOutcome, ImportError> {
        let started_at = Instant::now();
        info!(
            "event=content_import module=import status=start mode={} modules={}",
            self.mode.as_str(),
            document.modules.len()
        );

        let (existing, plan) = match self.prepare(document) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(
                    "event=content_import module=import status=rejected mode={} duration_ms={} error={}",
                    self.mode.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };

        match self.write(document, existing, &plan) {
            Ok(outcome) => {
                info!(
                    "event=content_import module=import status=ok mode={} course={} created={} modules={} lessons={} duration_ms={}",
                    self.mode.as_str(),
                    outcome.course_id,
                    outcome.created_course,
                    outcome.modules_written,
                    outcome.lessons_written,
                    started_at.elapsed().as_millis()
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    "event=content_import module=import status=error mode={} retryable={} duration_ms={} error={}",
                    self.mode.as_str(),
                    err.is_retryable(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Runs every check, including store lookups, without writing.
    fn prepare<'doc>(
        &self,
        document: &'doc ImportDocument,
    ) -> Result<(Option<Course>, Vec<PlannedModule<'doc>>), ImportError> {
        let mut issues = validate_course(&document.course, self.mode);

        let existing = match (self.mode, document.course.slug.as_deref()) {
            (ImportMode::InsertNew, Some(slug)) if !slug.is_empty() => {
                if let Some(course) = self.store.course_by_slug(slug)? {
                    issues.push(ValidationIssue::new(
                        "course.slug",
                        format!("slug `{slug}` is already used by course {}", course.uuid),
                    ));
                }
                None
            }
            (ImportMode::AppendToSlug, Some(slug)) if issues.is_empty() => Some(
                self.store
                    .course_by_slug(slug)?
                    .ok_or_else(|| ImportError::CourseNotFound(slug.to_string()))?,
            ),
            _ => None,
        };

        let mut taken_positions = HashMap::new();
        let mut next_position = 1;
        if let Some(course) = &existing {
            for module in self.store.modules_of(course.uuid)? {
                next_position = next_position.max(module.position.saturating_add(1));
                taken_positions.insert(module.position, None);
            }
        }

        let plan = plan_modules(
            &document.modules,
            next_position,
            &mut taken_positions,
            &mut issues,
        );

        if issues.is_empty() {
            Ok((existing, plan))
        } else {
            Err(ImportError::Validation(issues))
        }
    }

    fn write(
        &self,
        document: &ImportDocument,
        existing: Option<Course>,
        plan: &[PlannedModule<'_>],
    ) -> Result<ImportOutcome, ImportError> {
        let (course, created_course) = match existing {
            Some(course) => (course, false),
            None => (build_course(&document.course), true),
        };

        let mut modules_committed = 0;
        let mut lessons_committed = 0;
        let partial = |committed_course: Option<CourseId>,
                       modules_committed: usize,
                       lessons_committed: usize,
                       source: StoreError| ImportError::PartialWrite {
            course_id: committed_course,
            modules_committed,
            lessons_committed,
            source,
        };

        if created_course {
            self.store
                .insert(&course.clone().into())
                .map_err(|source| partial(None, 0, 0, source))?;
        }

        for planned in plan {
            let module = build_module(&course, planned);
            self.store.insert(&module.clone().into()).map_err(|source| {
                partial(Some(course.uuid), modules_committed, lessons_committed, source)
            })?;
            modules_committed += 1;

            for planned_lesson in &planned.lessons {
                let lesson = build_lesson(&module, planned_lesson);
                self.store.insert(&lesson.into()).map_err(|source| {
                    partial(Some(course.uuid), modules_committed, lessons_committed, source)
                })?;
                lessons_committed += 1;
            }
        }

        Ok(ImportOutcome {
            course_id: course.uuid,
            created_course,
            modules_written: modules_committed,
            lessons_written: lessons_committed,
        })
    }
}

fn validate_course(spec: &CourseSpec, mode: ImportMode) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if spec.title.trim().is_empty() {
        issues.push(ValidationIssue::new("course.title", "must not be blank"));
    }
    match spec.slug.as_deref() {
        Some(slug) if !SLUG_RE.is_match(slug) => issues.push(ValidationIssue::new(
            "course.slug",
            format!("`{slug}` is not lowercase words joined by `-`"),
        )),
        None if mode == ImportMode::AppendToSlug => issues.push(ValidationIssue::new(
            "course.slug",
            "required when appending to an existing course",
        )),
        _ => {}
    }
    issues
}

/// Resolves module and lesson positions and validates nested content.
///
/// `taken_positions` maps module positions already in use to the document
/// index that claimed them (`None` for modules already stored).
fn plan_modules<'doc>(
    specs: &'doc [ModuleSpec],
    first_position: i64,
    taken_positions: &mut HashMap<i64, Option<usize>>,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<PlannedModule<'doc>> {
    let mut plan = Vec::with_capacity(specs.len());
    for (module_index, spec) in specs.iter().enumerate() {
        let path = format!("modules[{module_index}]");
        if spec.title.trim().is_empty() {
            issues.push(ValidationIssue::new(format!("{path}.title"), "must not be blank"));
        }

        let position = resolve_position(spec.order, sequence_position(first_position, module_index));
        check_position(
            &format!("{path}.order"),
            spec.order,
            position,
            module_index,
            taken_positions,
            "modules",
            issues,
        );

        let mut lesson_positions = HashMap::new();
        let mut lessons = Vec::with_capacity(spec.lessons.len());
        for (lesson_index, lesson) in spec.lessons.iter().enumerate() {
            let lesson_path = format!("{path}.lessons[{lesson_index}]");
            let kind = validate_lesson(&lesson_path, lesson, issues);
            let position = resolve_position(lesson.order, sequence_position(1, lesson_index));
            check_position(
                &format!("{lesson_path}.order"),
                lesson.order,
                position,
                lesson_index,
                &mut lesson_positions,
                &format!("{path}.lessons"),
                issues,
            );
            if let Some(kind) = kind {
                lessons.push(PlannedLesson {
                    spec: lesson,
                    kind,
                    position,
                });
            }
        }

        plan.push(PlannedModule {
            spec,
            position,
            lessons,
        });
    }
    plan
}

fn validate_lesson(
    path: &str,
    spec: &LessonSpec,
    issues: &mut Vec<ValidationIssue>,
) -> Option<LessonType> {
    if spec.title.trim().is_empty() {
        issues.push(ValidationIssue::new(format!("{path}.title"), "must not be blank"));
    }

    for (case_index, case) in spec.test_cases.iter().enumerate() {
        let case_path = format!("{path}.testCases[{case_index}]");
        if case.input.is_empty() {
            issues.push(ValidationIssue::new(format!("{case_path}.input"), "must not be empty"));
        }
        if case.expected_output.is_empty() {
            issues.push(ValidationIssue::new(
                format!("{case_path}.expectedOutput"),
                "must not be empty",
            ));
        }
    }

    let kind = LessonType::parse(&spec.kind);
    if kind.is_none() {
        let expected = LessonType::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join("|");
        issues.push(ValidationIssue::new(
            format!("{path}.type"),
            format!("unknown lesson type `{}`; expected {expected}", spec.kind),
        ));
    }
    kind
}

fn resolve_position(order: Option<i64>, default_position: i64) -> i64 {
    order.unwrap_or(default_position)
}

/// Position of the `index`-th sibling counted from `first`. Saturates so an
/// out-of-range result is caught by `check_position`.
fn sequence_position(first: i64, index: usize) -> i64 {
    first.saturating_add(i64::try_from(index).unwrap_or(i64::MAX))
}

fn check_position(
    path: &str,
    explicit: Option<i64>,
    position: i64,
    index: usize,
    taken: &mut HashMap<i64, Option<usize>>,
    sibling_label: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if !(1..=MAX_POSITION).contains(&position) {
        let message = match explicit {
            Some(_) => format!("must be between 1 and {MAX_POSITION}"),
            None => format!("next free position {position} is past {MAX_POSITION}"),
        };
        issues.push(ValidationIssue::new(path, message));
        return;
    }
    match taken.get(&position) {
        Some(Some(other)) => issues.push(ValidationIssue::new(
            path,
            format!("position {position} duplicates {sibling_label}[{other}]"),
        )),
        Some(None) => issues.push(ValidationIssue::new(
            path,
            format!("position {position} is already used by a stored module"),
        )),
        None => {
            taken.insert(position, Some(index));
        }
    }
}

fn build_course(spec: &CourseSpec) -> Course {
    let mut course = Course::new(spec.title.trim());
    course.slug = spec.slug.clone();
    course.icon = spec.icon.clone();
    course.description = spec.description.clone();
    course
}

fn build_module(course: &Course, planned: &PlannedModule<'_>) -> Module {
    let mut module = Module::new(course.uuid, planned.position, planned.spec.title.trim());
    module.description = planned.spec.description.clone();
    module
}

fn build_lesson(module: &Module, planned: &PlannedLesson<'_>) -> Lesson {
    let spec = planned.spec;
    let mut lesson = Lesson::new(
        module,
        planned.kind,
        planned.position,
        spec.title.trim(),
        spec.content.as_str(),
    );
    lesson.code_template = spec.code_template.clone();
    lesson.solution = spec.solution.clone();
    lesson.language = spec.language.clone();
    lesson.test_cases = spec.test_cases.clone();
    lesson.hints = spec.hints.clone();
    lesson.xp_reward = spec.xp_reward;
    lesson.estimated_minutes = spec.estimated_minutes;
    lesson
}
