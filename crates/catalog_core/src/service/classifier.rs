//! Legacy course classifier.
//!
//! # Invariants
//! - Pure: no I/O, no logging.
//! - Only `icon` and `slug` participate. Other malformed fields never make a
//!   course legacy.

use crate::model::course::Course;

const URL_ICON_PREFIX: &str = "http";

/// Returns whether `course` is a legacy record eligible for retirement.
///
/// A course is legacy when its icon is present and starts with `http`, or
/// when its slug is absent or empty. An empty icon is not a URL; a slug made
/// of whitespace is not empty.
pub fn is_legacy(course: &Course) -> bool {
    has_url_icon(course) || lacks_slug(course)
}

fn has_url_icon(course: &Course) -> bool {
    course
        .icon
        .as_deref()
        .is_some_and(|icon| icon.starts_with(URL_ICON_PREFIX))
}

fn lacks_slug(course: &Course) -> bool {
    course.slug.as_deref().map_or(true, str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::is_legacy;
    use crate::model::course::Course;

    fn course(icon: Option<&str>, slug: Option<&str>) -> Course {
        let mut course = Course::new("Python Basics");
        course.icon = icon.map(str::to_string);
        course.slug = slug.map(str::to_string);
        course
    }

    #[test]
    fn url_icon_is_legacy_even_with_slug() {
        assert!(is_legacy(&course(Some("https://x.png"), Some("intro"))));
        assert!(is_legacy(&course(Some("http://cdn/img.svg"), Some("intro"))));
    }

    #[test]
    fn glyph_icon_with_slug_is_not_legacy() {
        assert!(!is_legacy(&course(Some("🐍"), Some("intro"))));
        assert!(!is_legacy(&course(None, Some("intro"))));
    }

    #[test]
    fn missing_or_empty_slug_is_legacy() {
        assert!(is_legacy(&course(Some("🐍"), None)));
        assert!(is_legacy(&course(Some("🐍"), Some(""))));
        assert!(is_legacy(&course(None, None)));
    }

    #[test]
    fn classification_stays_literal_on_edge_values() {
        assert!(!is_legacy(&course(Some(""), Some("intro"))));
        assert!(!is_legacy(&course(Some("HTTPS://x.png"), Some("intro"))));
        assert!(!is_legacy(&course(Some("🐍"), Some(" "))));
        assert!(is_legacy(&course(Some("httpish"), Some("intro"))));

        let mut odd = course(Some("🐍"), Some("intro"));
        odd.title.clear();
        odd.description = Some(String::new());
        assert!(!is_legacy(&odd));
    }
}
