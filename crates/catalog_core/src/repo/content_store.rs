//! Content store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide per-record insert/delete/get plus indexed lookups by parent id.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every call is one autocommit statement; no cross-record transactions.
//! - Relationship traversal is explicit index lookups, never joins.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Query results are deterministic: position/uuid for modules and lessons,
//!   title/uuid for courses, uuid for enrollments.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::course::{Course, CourseId};
use crate::model::enrollment::{Enrollment, EnrollmentProgress};
use crate::model::lesson::{Lesson, LessonType, TestCase};
use crate::model::module::{Module, ModuleId};
use crate::model::record::{EntityKind, IndexField, Record};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const COURSE_SELECT_SQL: &str = "SELECT uuid, title, icon, slug, description FROM courses";

const MODULE_SELECT_SQL: &str =
    "SELECT uuid, course_uuid, position, title, description FROM modules";

const LESSON_SELECT_SQL: &str = "SELECT
    uuid,
    module_uuid,
    course_uuid,
    kind,
    position,
    title,
    content,
    code_template,
    solution,
    language,
    test_cases_json,
    hints_json,
    xp_reward,
    estimated_minutes
FROM lessons";

const ENROLLMENT_SELECT_SQL: &str =
    "SELECT uuid, course_uuid, learner_id, progress, completed_lessons FROM enrollments";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from content store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Transport or connectivity failure (busy, locked, I/O). Safe to retry.
    Unavailable(DbError),
    /// Any other database failure, including constraint violations.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// The `(kind, field)` pair has no backing index.
    UnsupportedIndex {
        kind: EntityKind,
        field: IndexField,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl StoreError {
    /// Whether the caller may retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "content store unavailable: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "content store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::UnsupportedIndex { kind, field } => {
                write!(f, "no index on `{field}` for `{kind}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::UnsupportedIndex { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        let unavailable = matches!(
            value.sqlite_error_code(),
            Some(
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::CannotOpen
                    | ErrorCode::SystemIoFailure
            )
        );
        if unavailable {
            Self::Unavailable(DbError::Sqlite(value))
        } else {
            Self::Db(DbError::Sqlite(value))
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

/// Storage contract consumed by the lifecycle services.
///
/// Supported indexes: `modules.course_id`, `lessons.module_id`,
/// `lessons.course_id`, `enrollments.course_id` and `courses.slug`.
pub trait ContentStore {
    /// Inserts one record and returns its id.
    fn insert(&self, record: &Record) -> StoreResult<Uuid>;
    /// Deletes one record. `Ok(false)` means it was already absent.
    fn delete(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool>;
    fn get(&self, kind: EntityKind, id: Uuid) -> StoreResult<Option<Record>>;
    fn query_by_index(
        &self,
        kind: EntityKind,
        field: IndexField,
        value: &str,
    ) -> StoreResult<Vec<Record>>;
    fn query_all(&self, kind: EntityKind) -> StoreResult<Vec<Record>>;

    /// Loads one course by id.
    fn course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        self.get(EntityKind::Course, id)?
            .map(|record| expect_record(record, EntityKind::Course, Record::into_course))
            .transpose()
    }

    /// Lists every course.
    fn courses(&self) -> StoreResult<Vec<Course>> {
        typed(self.query_all(EntityKind::Course)?, EntityKind::Course, Record::into_course)
    }

    /// Resolves a course by its unique slug.
    fn course_by_slug(&self, slug: &str) -> StoreResult<Option<Course>> {
        let mut courses = typed(
            self.query_by_index(EntityKind::Course, IndexField::Slug, slug)?,
            EntityKind::Course,
            Record::into_course,
        )?;
        if courses.len() > 1 {
            return Err(StoreError::InvalidData(format!(
                "slug `{slug}` is shared by {} courses",
                courses.len()
            )));
        }
        Ok(courses.pop())
    }

    /// Lists the modules of one course in position order.
    fn modules_of(&self, course_id: CourseId) -> StoreResult<Vec<Module>> {
        typed(
            self.query_by_index(EntityKind::Module, IndexField::CourseId, &course_id.to_string())?,
            EntityKind::Module,
            Record::into_module,
        )
    }

    /// Lists the lessons of one module in position order.
    fn lessons_of(&self, module_id: ModuleId) -> StoreResult<Vec<Lesson>> {
        typed(
            self.query_by_index(EntityKind::Lesson, IndexField::ModuleId, &module_id.to_string())?,
            EntityKind::Lesson,
            Record::into_lesson,
        )
    }

    /// Lists the enrollments referencing one course.
    fn enrollments_of(&self, course_id: CourseId) -> StoreResult<Vec<Enrollment>> {
        typed(
            self.query_by_index(
                EntityKind::Enrollment,
                IndexField::CourseId,
                &course_id.to_string(),
            )?,
            EntityKind::Enrollment,
            Record::into_enrollment,
        )
    }
}

impl<S: ContentStore + ?Sized> ContentStore for &S {
    fn insert(&self, record: &Record) -> StoreResult<Uuid> {
        (**self).insert(record)
    }

    fn delete(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool> {
        (**self).delete(kind, id)
    }

    fn get(&self, kind: EntityKind, id: Uuid) -> StoreResult<Option<Record>> {
        (**self).get(kind, id)
    }

    fn query_by_index(
        &self,
        kind: EntityKind,
        field: IndexField,
        value: &str,
    ) -> StoreResult<Vec<Record>> {
        (**self).query_by_index(kind, field, value)
    }

    fn query_all(&self, kind: EntityKind) -> StoreResult<Vec<Record>> {
        (**self).query_all(kind)
    }
}

fn expect_record<T>(
    record: Record,
    kind: EntityKind,
    project: fn(Record) -> Option<T>,
) -> StoreResult<T> {
    let actual = record.kind();
    project(record).ok_or_else(|| {
        StoreError::InvalidData(format!("expected `{kind}` record, got `{actual}`"))
    })
}

fn typed<T>(
    records: Vec<Record>,
    kind: EntityKind,
    project: fn(Record) -> Option<T>,
) -> StoreResult<Vec<T>> {
    records
        .into_iter()
        .map(|record| expect_record(record, kind, project))
        .collect()
}

/// SQLite-backed content store.
#[derive(Clone, Copy)]
pub struct SqliteContentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContentStore<'conn> {
    /// Creates a store from a connection opened through `db::open_db*`.
    ///
    /// Rejects connections whose schema is not fully migrated.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    fn insert_course(&self, course: &Course) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO courses (uuid, title, icon, slug, description)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                course.uuid.to_string(),
                course.title.as_str(),
                course.icon.as_deref(),
                course.slug.as_deref(),
                course.description.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn insert_module(&self, module: &Module) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO modules (uuid, course_uuid, position, title, description)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                module.uuid.to_string(),
                module.course_uuid.to_string(),
                module.position,
                module.title.as_str(),
                module.description.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn insert_lesson(&self, lesson: &Lesson) -> StoreResult<()> {
        let test_cases_json = serde_json::to_string(&lesson.test_cases).map_err(|err| {
            StoreError::InvalidData(format!("cannot encode lesson test cases: {err}"))
        })?;
        let hints_json = serde_json::to_string(&lesson.hints)
            .map_err(|err| StoreError::InvalidData(format!("cannot encode lesson hints: {err}")))?;

        self.conn.execute(
            "INSERT INTO lessons (
                uuid,
                module_uuid,
                course_uuid,
                kind,
                position,
                title,
                content,
                code_template,
                solution,
                language,
                test_cases_json,
                hints_json,
                xp_reward,
                estimated_minutes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                lesson.uuid.to_string(),
                lesson.module_uuid.to_string(),
                lesson.course_uuid.to_string(),
                lesson.kind.as_str(),
                lesson.position,
                lesson.title.as_str(),
                lesson.content.as_str(),
                lesson.code_template.as_deref(),
                lesson.solution.as_deref(),
                lesson.language.as_deref(),
                test_cases_json,
                hints_json,
                lesson.xp_reward,
                lesson.estimated_minutes,
            ],
        )?;
        Ok(())
    }

    fn insert_enrollment(&self, enrollment: &Enrollment) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO enrollments (uuid, course_uuid, learner_id, progress, completed_lessons)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                enrollment.uuid.to_string(),
                enrollment.course_uuid.to_string(),
                enrollment.learner_id.as_str(),
                enrollment.progress.as_str(),
                enrollment.completed_lessons,
            ],
        )?;
        Ok(())
    }

    fn select(&self, kind: EntityKind, filter: Option<(&str, &str)>) -> StoreResult<Vec<Record>> {
        let (base, order_by) = match kind {
            EntityKind::Course => (COURSE_SELECT_SQL, "title ASC, uuid ASC"),
            EntityKind::Module => (MODULE_SELECT_SQL, "position ASC, uuid ASC"),
            EntityKind::Lesson => (LESSON_SELECT_SQL, "position ASC, uuid ASC"),
            EntityKind::Enrollment => (ENROLLMENT_SELECT_SQL, "uuid ASC"),
        };

        let sql = match filter {
            Some((column, _)) => format!("{base} WHERE {column} = ?1 ORDER BY {order_by};"),
            None => format!("{base} ORDER BY {order_by};"),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match filter {
            Some((_, value)) => stmt.query([value])?,
            None => stmt.query([])?,
        };

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(kind, row)?);
        }
        Ok(records)
    }
}

impl ContentStore for SqliteContentStore<'_> {
    fn insert(&self, record: &Record) -> StoreResult<Uuid> {
        match record {
            Record::Course(course) => self.insert_course(course)?,
            Record::Module(module) => self.insert_module(module)?,
            Record::Lesson(lesson) => self.insert_lesson(lesson)?,
            Record::Enrollment(enrollment) => self.insert_enrollment(enrollment)?,
        }
        Ok(record.uuid())
    }

    fn delete(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE uuid = ?1;", kind.as_str()),
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn get(&self, kind: EntityKind, id: Uuid) -> StoreResult<Option<Record>> {
        let id_text = id.to_string();
        let mut records = self.select(kind, Some(("uuid", id_text.as_str())))?;
        Ok(records.pop())
    }

    fn query_by_index(
        &self,
        kind: EntityKind,
        field: IndexField,
        value: &str,
    ) -> StoreResult<Vec<Record>> {
        let column = index_column(kind, field).ok_or(StoreError::UnsupportedIndex { kind, field })?;
        self.select(kind, Some((column, value)))
    }

    fn query_all(&self, kind: EntityKind) -> StoreResult<Vec<Record>> {
        self.select(kind, None)
    }
}

fn index_column(kind: EntityKind, field: IndexField) -> Option<&'static str> {
    match (kind, field) {
        (EntityKind::Course, IndexField::Slug) => Some("slug"),
        (EntityKind::Module, IndexField::CourseId) => Some("course_uuid"),
        (EntityKind::Lesson, IndexField::ModuleId) => Some("module_uuid"),
        (EntityKind::Lesson, IndexField::CourseId) => Some("course_uuid"),
        (EntityKind::Enrollment, IndexField::CourseId) => Some("course_uuid"),
        _ => None,
    }
}

fn parse_record_row(kind: EntityKind, row: &Row<'_>) -> StoreResult<Record> {
    let record = match kind {
        EntityKind::Course => Record::Course(Course {
            uuid: parse_uuid(row, "uuid", "courses.uuid")?,
            title: row.get("title")?,
            icon: row.get("icon")?,
            slug: row.get("slug")?,
            description: row.get("description")?,
        }),
        EntityKind::Module => Record::Module(Module {
            uuid: parse_uuid(row, "uuid", "modules.uuid")?,
            course_uuid: parse_uuid(row, "course_uuid", "modules.course_uuid")?,
            position: row.get("position")?,
            title: row.get("title")?,
            description: row.get("description")?,
        }),
        EntityKind::Lesson => Record::Lesson(parse_lesson_row(row)?),
        EntityKind::Enrollment => {
            let progress_text: String = row.get("progress")?;
            let progress = EnrollmentProgress::parse(&progress_text).ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "invalid progress `{progress_text}` in enrollments.progress"
                ))
            })?;
            Record::Enrollment(Enrollment {
                uuid: parse_uuid(row, "uuid", "enrollments.uuid")?,
                course_uuid: parse_uuid(row, "course_uuid", "enrollments.course_uuid")?,
                learner_id: row.get("learner_id")?,
                progress,
                completed_lessons: row.get("completed_lessons")?,
            })
        }
    };
    Ok(record)
}

fn parse_lesson_row(row: &Row<'_>) -> StoreResult<Lesson> {
    let kind_text: String = row.get("kind")?;
    let kind = LessonType::parse(&kind_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid lesson type `{kind_text}` in lessons.kind"))
    })?;

    let test_cases_json: String = row.get("test_cases_json")?;
    let test_cases: Vec<TestCase> = serde_json::from_str(&test_cases_json).map_err(|err| {
        StoreError::InvalidData(format!("invalid lessons.test_cases_json: {err}"))
    })?;
    let hints_json: String = row.get("hints_json")?;
    let hints: Vec<String> = serde_json::from_str(&hints_json)
        .map_err(|err| StoreError::InvalidData(format!("invalid lessons.hints_json: {err}")))?;

    Ok(Lesson {
        uuid: parse_uuid(row, "uuid", "lessons.uuid")?,
        module_uuid: parse_uuid(row, "module_uuid", "lessons.module_uuid")?,
        course_uuid: parse_uuid(row, "course_uuid", "lessons.course_uuid")?,
        kind,
        position: row.get("position")?,
        title: row.get("title")?,
        content: row.get("content")?,
        code_template: row.get("code_template")?,
        solution: row.get("solution")?,
        language: row.get("language")?,
        test_cases,
        hints,
        xp_reward: row.get("xp_reward")?,
        estimated_minutes: row.get("estimated_minutes")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, label: &str) -> StoreResult<Uuid> {
    let value: String = row.get(column)?;
    Uuid::parse_str(&value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{value}` in {label}")))
}
