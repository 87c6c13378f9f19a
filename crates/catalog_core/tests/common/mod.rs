#![allow(dead_code)]

use catalog_core::db::DbError;
use catalog_core::{
    ContentStore, Course, CourseId, EntityKind, Enrollment, IndexField, Lesson, LessonType,
    Module, Record, SqliteContentStore, StoreError, StoreResult,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use uuid::Uuid;

pub fn injected_outage() -> StoreError {
    StoreError::Unavailable(DbError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        Some("injected outage".to_string()),
    )))
}

/// Wraps the SQLite store and fails selected calls on demand.
pub struct FlakyStore<'conn> {
    inner: SqliteContentStore<'conn>,
    failing_deletes: RefCell<HashSet<Uuid>>,
    failing_index_kind: Cell<Option<EntityKind>>,
    insert_budget: Cell<Option<usize>>,
    inserts: Cell<usize>,
    deletes: Cell<usize>,
}

impl<'conn> FlakyStore<'conn> {
    pub fn new(inner: SqliteContentStore<'conn>) -> Self {
        Self {
            inner,
            failing_deletes: RefCell::new(HashSet::new()),
            failing_index_kind: Cell::new(None),
            insert_budget: Cell::new(None),
            inserts: Cell::new(0),
            deletes: Cell::new(0),
        }
    }

    pub fn fail_delete_of(&self, id: Uuid) {
        self.failing_deletes.borrow_mut().insert(id);
    }

    pub fn fail_index_queries_on(&self, kind: EntityKind) {
        self.failing_index_kind.set(Some(kind));
    }

    /// Lets `count` more inserts through, then fails every insert.
    pub fn fail_inserts_after(&self, count: usize) {
        self.insert_budget.set(Some(count));
    }

    pub fn heal(&self) {
        self.failing_deletes.borrow_mut().clear();
        self.failing_index_kind.set(None);
        self.insert_budget.set(None);
    }

    pub fn inserts(&self) -> usize {
        self.inserts.get()
    }

    pub fn deletes(&self) -> usize {
        self.deletes.get()
    }
}

impl ContentStore for FlakyStore<'_> {
    fn insert(&self, record: &Record) -> StoreResult<Uuid> {
        if let Some(budget) = self.insert_budget.get() {
            if budget == 0 {
                return Err(injected_outage());
            }
            self.insert_budget.set(Some(budget - 1));
        }
        let id = self.inner.insert(record)?;
        self.inserts.set(self.inserts.get() + 1);
        Ok(id)
    }

    fn delete(&self, kind: EntityKind, id: Uuid) -> StoreResult<bool> {
        if self.failing_deletes.borrow().contains(&id) {
            return Err(injected_outage());
        }
        let deleted = self.inner.delete(kind, id)?;
        self.deletes.set(self.deletes.get() + 1);
        Ok(deleted)
    }

    fn get(&self, kind: EntityKind, id: Uuid) -> StoreResult<Option<Record>> {
        self.inner.get(kind, id)
    }

    fn query_by_index(
        &self,
        kind: EntityKind,
        field: IndexField,
        value: &str,
    ) -> StoreResult<Vec<Record>> {
        if self.failing_index_kind.get() == Some(kind) {
            return Err(injected_outage());
        }
        self.inner.query_by_index(kind, field, value)
    }

    fn query_all(&self, kind: EntityKind) -> StoreResult<Vec<Record>> {
        self.inner.query_all(kind)
    }
}

/// Shape of a seeded course graph.
pub struct Seed<'a> {
    pub title: &'a str,
    pub slug: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub modules: usize,
    pub lessons_per_module: usize,
    pub enrollments: usize,
}

impl Default for Seed<'_> {
    fn default() -> Self {
        Self {
            title: "Seeded course",
            slug: Some("seeded"),
            icon: Some("🐍"),
            modules: 2,
            lessons_per_module: 3,
            enrollments: 2,
        }
    }
}

/// Inserts a full course graph directly through the store.
pub fn seed_course(store: &impl ContentStore, seed: Seed<'_>) -> CourseId {
    let mut course = Course::new(seed.title);
    course.slug = seed.slug.map(str::to_string);
    course.icon = seed.icon.map(str::to_string);
    store.insert(&course.clone().into()).unwrap();

    for module_index in 0..seed.modules {
        let module = Module::new(
            course.uuid,
            module_index as i64 + 1,
            format!("Module {}", module_index + 1),
        );
        store.insert(&module.clone().into()).unwrap();
        for lesson_index in 0..seed.lessons_per_module {
            let lesson = Lesson::new(
                &module,
                LessonType::Theory,
                lesson_index as i64 + 1,
                format!("Lesson {}.{}", module_index + 1, lesson_index + 1),
                "body",
            );
            store.insert(&lesson.into()).unwrap();
        }
    }

    for learner in 0..seed.enrollments {
        let enrollment = Enrollment::new(course.uuid, format!("learner-{learner}"));
        store.insert(&enrollment.into()).unwrap();
    }

    course.uuid
}

/// Counts every module, lesson and enrollment still pointing at `course_id`.
pub fn residue(store: &impl ContentStore, course_id: CourseId) -> usize {
    let key = course_id.to_string();
    let modules = store
        .query_by_index(EntityKind::Module, IndexField::CourseId, &key)
        .unwrap();
    let mut lessons = store
        .query_by_index(EntityKind::Lesson, IndexField::CourseId, &key)
        .unwrap()
        .len();
    for module in &modules {
        lessons += store
            .query_by_index(EntityKind::Lesson, IndexField::ModuleId, &module.uuid().to_string())
            .unwrap()
            .len();
    }
    let enrollments = store
        .query_by_index(EntityKind::Enrollment, IndexField::CourseId, &key)
        .unwrap()
        .len();
    modules.len() + lessons + enrollments
}
