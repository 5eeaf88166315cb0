//! Slash-path helpers used for entry keys
//!
//! Keys are always `/`-separated, never start or end with `/`, and contain
//! no empty or `.` segments.

/// Non-empty, non-`.` segments of a path (separators normalized)
pub fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// True if any segment is `..`
pub fn has_parent_segment(path: &str) -> bool {
    segments(path).contains(&"..")
}

/// Canonical key form of a relative path
pub fn normalize(path: &str) -> String {
    segments(path).join("/")
}

/// Join a relative path onto a root key
pub fn join(root: &str, relative: &str) -> String {
    let relative = normalize(relative);
    match (root.is_empty(), relative.is_empty()) {
        (true, _) => relative,
        (false, true) => root.to_string(),
        (false, false) => format!("{}/{}", root, relative),
    }
}

/// Strip `root + "/"` from `key`, if present
pub fn strip_root<'a>(key: &'a str, root: &str) -> Option<&'a str> {
    if root.is_empty() {
        return Some(key);
    }
    key.strip_prefix(root)?.strip_prefix('/')
}

/// Final segment, or `.` for an empty path
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|s| !s.is_empty() && *s != ".")
        .unwrap_or(".")
}
