mod common;

use catalog_core::db::open_db_in_memory;
use catalog_core::{lesson_titles_by_slug, SqliteContentStore};
use common::{seed_course, Seed};

#[test]
fn lesson_titles_are_grouped_by_slug_in_position_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteContentStore::try_new(&conn).unwrap();
    seed_course(
        &store,
        Seed {
            slug: Some("python-basics"),
            modules: 2,
            lessons_per_module: 2,
            ..Seed::default()
        },
    );
    seed_course(
        &store,
        Seed {
            slug: Some("rust-basics"),
            modules: 1,
            lessons_per_module: 1,
            ..Seed::default()
        },
    );
    seed_course(
        &store,
        Seed {
            slug: None,
            ..Seed::default()
        },
    );

    let all = lesson_titles_by_slug(&store, None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        all["python-basics"],
        vec!["Lesson 1.1", "Lesson 1.2", "Lesson 2.1", "Lesson 2.2"]
    );
    assert_eq!(all["rust-basics"], vec!["Lesson 1.1"]);

    let filtered = lesson_titles_by_slug(&store, Some("python")).unwrap();
    assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["python-basics"]);

    assert!(lesson_titles_by_slug(&store, Some("haskell"))
        .unwrap()
        .is_empty());
}
