//! Canonical template path resolution

/// Directory that relative view names are resolved against
pub const VIEW_BASE_DIR: &str = "/ftl/";

/// Extension appended to view names that have none
pub const VIEW_SUFFIX: &str = ".ftl";

/// Map a raw view name to the canonical template path used for lookup
///
/// Names not starting with `/` are placed under [`VIEW_BASE_DIR`]; names
/// containing no `.` get [`VIEW_SUFFIX`] appended. Any existing extension
/// is kept as is.
///
/// # Examples
///
/// ```rust
/// use acton_views::resolve_view_name;
///
/// assert_eq!(resolve_view_name("view"), "/ftl/view.ftl");
/// assert_eq!(resolve_view_name("view.html"), "/ftl/view.html");
/// assert_eq!(resolve_view_name("/path/view"), "/path/view.ftl");
/// assert_eq!(resolve_view_name("/ftl/view.ftl"), "/ftl/view.ftl");
/// ```
#[must_use]
pub fn resolve_view_name(raw: &str) -> String {
    let mut path = if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("{VIEW_BASE_DIR}{raw}")
    };
    if !path.contains('.') {
        path.push_str(VIEW_SUFFIX);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_relative_names_resolve_under_base_dir() {
        assert_eq!(resolve_view_name("view"), "/ftl/view.ftl");
        assert_eq!(resolve_view_name("view.ftl"), "/ftl/view.ftl");
        assert_eq!(resolve_view_name("path/view.ftl"), "/ftl/path/view.ftl");
        assert_eq!(resolve_view_name("path/view"), "/ftl/path/view.ftl");
    }

    #[test]
    fn test_existing_extension_suppresses_suffix() {
        assert_eq!(resolve_view_name("view.html"), "/ftl/view.html");
        assert_eq!(resolve_view_name("path/view.html"), "/ftl/path/view.html");
    }

    #[test]
    fn test_absolute_names_keep_their_directory() {
        assert_eq!(resolve_view_name("/path/view"), "/path/view.ftl");
        assert_eq!(resolve_view_name("/ftl/view.ftl"), "/ftl/view.ftl");
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(resolve_view_name(""), "/ftl/.ftl");
    }

    proptest! {
        #[test]
        fn names_with_extension_only_gain_prefix(stem in "[a-z/]{0,12}", ext in "[a-z]{1,4}") {
            let raw = format!("{stem}.{ext}");
            let resolved = resolve_view_name(&raw);
            let suffix = format!(".{ext}");
            prop_assert!(resolved.ends_with(&suffix));
            if raw.starts_with('/') {
                prop_assert_eq!(resolved, raw);
            } else {
                prop_assert_eq!(resolved, format!("/ftl/{raw}"));
            }
        }

        #[test]
        fn names_without_extension_gain_suffix_once(raw in "[a-z/]{0,16}") {
            let resolved = resolve_view_name(&raw);
            prop_assert!(resolved.ends_with(".ftl"));
            prop_assert_eq!(resolved.matches('.').count(), 1);
        }

        #[test]
        fn resolution_is_idempotent(raw in "[a-z/.]{0,16}") {
            let once = resolve_view_name(&raw);
            prop_assert_eq!(resolve_view_name(&once), once.clone());
        }
    }
}
