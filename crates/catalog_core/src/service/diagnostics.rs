//! Read-only inspection helpers for external tooling.
//!
//! Not used by deletion or import; walks the store through the same index
//! lookups so its view matches what the lifecycle services see.

use crate::repo::content_store::{ContentStore, StoreResult};
use std::collections::BTreeMap;

/// Lists lesson titles grouped by course slug.
///
/// Only courses with a non-empty slug are included. When `slug_filter` is set,
/// a course is kept when its slug contains the filter. Titles are ordered by
/// module position, then lesson position.
pub fn lesson_titles_by_slug(
    store: &impl ContentStore,
    slug_filter: Option<&str>,
) -> StoreResult<BTreeMap<String, Vec<String>>> {
    let mut grouped = BTreeMap::new();
    for course in store.courses()? {
        let Some(slug) = course.slug.filter(|slug| !slug.is_empty()) else {
            continue;
        };
        if slug_filter.is_some_and(|filter| !slug.contains(filter)) {
            continue;
        }

        let mut titles = Vec::new();
        for module in store.modules_of(course.uuid)? {
            titles.extend(
                store
                    .lessons_of(module.uuid)?
                    .into_iter()
                    .map(|lesson| lesson.title),
            );
        }
        grouped.insert(slug, titles);
    }
    Ok(grouped)
}
