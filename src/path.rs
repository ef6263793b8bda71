//! Anchor identifiers for nodes of a schema tree.
//!
//! A path is the lowercase list of keys and indices leading to a node,
//! joined with `-`. The top level of a schema has the empty path.

use std::fmt::Display;

pub const PATH_SEPARATOR: char = '-';

/// Extend `path` with one more segment.
pub fn append_to_path(path: &str, segment: impl Display) -> String {
    if path.is_empty() {
        segment.to_string().to_lowercase()
    } else {
        format!("{}{}{}", path, PATH_SEPARATOR, segment).to_lowercase()
    }
}

/// Normalize a document name the way label ids are compared against it.
pub fn normalize_name(name: &str) -> String {
    name.replace(['.', '_', '/'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_append_to_empty_path() {
        assert_eq!(append_to_path("", "Foo"), "foo");
        assert_eq!(append_to_path("", 3), "3");
    }

    #[test]
    fn test_append_nested() {
        let path = append_to_path("", "data");
        let path = append_to_path(&path, "anyOf");
        let path = append_to_path(&path, 0);
        assert_eq!(path, "data-anyof-0");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("core/ndarray-1.0.0"), "core-ndarray-1-0-0");
        assert_eq!(normalize_name("my_schema"), "my-schema");
    }

    proptest! {
        #[test]
        fn last_segment_round_trips(
            base in "[a-z0-9]{0,8}(-[a-z0-9]{1,8}){0,3}",
            segment in "[A-Za-z0-9_]{1,12}",
        ) {
            let path = append_to_path(&base, &segment);
            let last = path.rsplit(PATH_SEPARATOR).next().unwrap();
            prop_assert_eq!(last, segment.to_lowercase());
        }

        #[test]
        fn append_is_deterministic(base in "[a-z-]{0,12}", index in 0usize..1000) {
            prop_assert_eq!(append_to_path(&base, index), append_to_path(&base, index));
        }
    }
}
