use catalog_core::db::open_db_in_memory;
use catalog_core::{
    ContentStore, Course, EntityKind, Enrollment, EnrollmentProgress, IndexField, Lesson,
    LessonType, Module, Record, SqliteContentStore, StoreError, TestCase,
};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

#[test]
fn insert_and_get_roundtrip_keeps_optional_fields() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    let course = Course::new("Rust 101").with_slug("rust-101").with_icon("🦀");
    store.insert(&course.clone().into()).unwrap();
    let module = Module::new(course.uuid, 1, "Ownership");
    store.insert(&module.clone().into()).unwrap();

    let mut lesson = Lesson::new(&module, LessonType::Challenge, 1, "Borrow", "Fix it");
    lesson.language = Some("rust".to_string());
    lesson.code_template = Some("fn main() {}".to_string());
    lesson.hints = vec!["Look at the lifetime".to_string()];
    lesson.xp_reward = Some(50);
    lesson.estimated_minutes = Some(15);
    lesson.test_cases.push(TestCase {
        input: "3".to_string(),
        expected_output: "9".to_string(),
        is_hidden: true,
        label: Some("square".to_string()),
        points: 10,
    });
    let lesson_id = store.insert(&lesson.clone().into()).unwrap();
    assert_eq!(lesson_id, lesson.uuid);

    assert_eq!(store.course(course.uuid).unwrap(), Some(course));
    let loaded = store.get(EntityKind::Lesson, lesson.uuid).unwrap().unwrap();
    assert_eq!(loaded, Record::Lesson(lesson));
}

#[test]
fn get_missing_record_returns_none() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    assert!(store.get(EntityKind::Course, Uuid::new_v4()).unwrap().is_none());
    assert!(!store.delete(EntityKind::Course, Uuid::new_v4()).unwrap());
}

#[test]
fn query_by_index_orders_children_by_position() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    let course = Course::new("Ordering").with_slug("ordering");
    store.insert(&course.clone().into()).unwrap();
    for position in [3, 1, 2] {
        let module = Module::new(course.uuid, position, format!("M{position}"));
        store.insert(&module.into()).unwrap();
    }

    let positions: Vec<i64> = store
        .modules_of(course.uuid)
        .unwrap()
        .into_iter()
        .map(|module| module.position)
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);

    let by_slug = store.course_by_slug("ordering").unwrap().unwrap();
    assert_eq!(by_slug.uuid, course.uuid);
    assert!(store.course_by_slug("missing").unwrap().is_none());
}

#[test]
fn unsupported_index_is_rejected() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    let err = store
        .query_by_index(EntityKind::Enrollment, IndexField::ModuleId, "x")
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::UnsupportedIndex {
            kind: EntityKind::Enrollment,
            field: IndexField::ModuleId
        }
    ));
}

#[test]
fn children_cannot_reference_missing_parents() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    let orphan_module = Module::new(Uuid::new_v4(), 1, "Orphan");
    let err = store.insert(&orphan_module.into()).unwrap_err();
    assert!(matches!(err, StoreError::Db(_)));

    let orphan_enrollment = Enrollment::new(Uuid::new_v4(), "learner");
    assert!(store.insert(&orphan_enrollment.into()).is_err());
}

#[test]
fn lesson_course_must_match_module_course() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    let course_a = Course::new("A").with_slug("a");
    let course_b = Course::new("B").with_slug("b");
    store.insert(&course_a.clone().into()).unwrap();
    store.insert(&course_b.clone().into()).unwrap();
    let module = Module::new(course_a.uuid, 1, "Only in A");
    store.insert(&module.clone().into()).unwrap();

    let mut lesson = Lesson::new(&module, LessonType::Theory, 1, "Mismatch", "body");
    lesson.course_uuid = course_b.uuid;
    assert!(store.insert(&lesson.into()).is_err());
}

#[test]
fn parent_delete_is_refused_while_children_exist() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    let course = Course::new("Busy").with_slug("busy");
    store.insert(&course.clone().into()).unwrap();
    let mut enrollment = Enrollment::new(course.uuid, "learner-1");
    enrollment.progress = EnrollmentProgress::InProgress;
    store.insert(&enrollment.clone().into()).unwrap();

    assert!(store.delete(EntityKind::Course, course.uuid).is_err());
    assert!(store.course(course.uuid).unwrap().is_some());

    let loaded = store.enrollments_of(course.uuid).unwrap();
    assert_eq!(loaded, vec![enrollment]);
}

#[test]
fn duplicate_slug_is_rejected_but_empty_slugs_may_repeat() {
    let conn = setup();
    let store = SqliteContentStore::try_new(&conn).unwrap();

    store
        .insert(&Course::new("One").with_slug("same").into())
        .unwrap();
    assert!(store
        .insert(&Course::new("Two").with_slug("same").into())
        .is_err());

    store.insert(&Course::new("Legacy 1").with_slug("").into()).unwrap();
    store.insert(&Course::new("Legacy 2").with_slug("").into()).unwrap();
    store.insert(&Course::new("Legacy 3").into()).unwrap();
    assert_eq!(store.courses().unwrap().len(), 4);
}
