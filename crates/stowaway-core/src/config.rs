//! Container format configuration

use crate::error::{Error, Result};
use crate::signature::APP_TAG_SIZE;
use std::fmt;

/// Identity of the container format: the magic tag written into every
/// trailer, the format version, and the namespace segment every embedded
/// path is re-rooted under.
///
/// Built once and handed to the codec, builder and restorer explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    app_tag: String,
    major: u16,
    minor: u16,
    revision: u16,
    namespace: String,
}

impl ContainerConfig {
    /// Create a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the tag is empty, longer than the
    /// trailer's tag field, not ASCII or contains NUL, or if the namespace is
    /// not a single plain path segment.
    pub fn new(
        app_tag: impl Into<String>,
        (major, minor, revision): (u16, u16, u16),
        namespace: impl Into<String>,
    ) -> Result<Self> {
        let app_tag = app_tag.into();
        let namespace = namespace.into();

        if app_tag.is_empty() || app_tag.len() > APP_TAG_SIZE {
            return Err(Error::validation(format!(
                "app tag must be 1-{} bytes, got {}",
                APP_TAG_SIZE,
                app_tag.len()
            )));
        }
        if !app_tag.is_ascii() || app_tag.contains('\0') {
            return Err(Error::validation("app tag must be ASCII without NUL"));
        }
        if namespace.is_empty()
            || namespace == "."
            || namespace == ".."
            || namespace.contains(['/', '\\'])
        {
            return Err(Error::validation(format!(
                "namespace must be a single path segment, got '{}'",
                namespace
            )));
        }

        Ok(Self {
            app_tag,
            major,
            minor,
            revision,
            namespace,
        })
    }

    /// Magic tag written at offset 0 of every trailer
    pub fn app_tag(&self) -> &str {
        &self.app_tag
    }

    /// (major, minor, revision)
    pub fn version(&self) -> (u16, u16, u16) {
        (self.major, self.minor, self.revision)
    }

    /// Top-level segment all embedded entries live under
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `tag-major.minor.revision`
    pub fn version_string(&self) -> String {
        format!(
            "{}-{}.{}.{}",
            self.app_tag, self.major, self.minor, self.revision
        )
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            app_tag: "stowaway".to_string(),
            major: 0,
            minor: 1,
            revision: 0,
            namespace: "stowaway".to_string(),
        }
    }
}

impl fmt::Display for ContainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.version_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let default = ContainerConfig::default();
        let rebuilt =
            ContainerConfig::new(default.app_tag(), default.version(), default.namespace())
                .unwrap();
        assert_eq!(default, rebuilt);
        assert_eq!(default.version_string(), "stowaway-0.1.0");
    }

    #[test]
    fn test_rejects_long_tag() {
        assert!(ContainerConfig::new("toolongtag", (1, 0, 0), "assets").is_err());
        assert!(ContainerConfig::new("", (1, 0, 0), "assets").is_err());
        assert!(ContainerConfig::new("ab\0c", (1, 0, 0), "assets").is_err());
    }

    #[test]
    fn test_rejects_nested_namespace() {
        assert!(ContainerConfig::new("app", (1, 0, 0), "a/b").is_err());
        assert!(ContainerConfig::new("app", (1, 0, 0), "..").is_err());
        assert!(ContainerConfig::new("app", (1, 0, 0), "").is_err());
        assert!(ContainerConfig::new("app", (1, 0, 0), "assets").is_ok());
    }
}
