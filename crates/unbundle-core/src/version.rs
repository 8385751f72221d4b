//! Build identification for `unbundle version` and the dev server banner.

use std::fmt;

/// Crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What was built: version, optional commit and profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    /// Commit hash, injected through `UNBUNDLE_BUILD_GIT_HASH` at compile time.
    pub git_hash: Option<&'static str>,
    pub debug: bool,
}

impl BuildInfo {
    #[must_use]
    pub const fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: option_env!("UNBUNDLE_BUILD_GIT_HASH"),
            debug: cfg!(debug_assertions),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unbundle {}", self.version)?;
        match (self.git_hash, self.debug) {
            (Some(hash), true) => write!(f, " ({hash}, debug build)"),
            (Some(hash), false) => write!(f, " ({hash})"),
            (None, true) => f.write_str(" (debug build)"),
            (None, false) => Ok(()),
        }
    }
}

/// One-line version for the CLI.
#[must_use]
pub fn version_string() -> String {
    BuildInfo::current().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_starts_with_name_and_version() {
        let vs = version_string();
        assert!(vs.starts_with(&format!("unbundle {VERSION}")));
    }

    #[test]
    fn test_display_variants() {
        let info = BuildInfo {
            version: "1.2.3",
            git_hash: Some("abc123"),
            debug: false,
        };
        assert_eq!(info.to_string(), "unbundle 1.2.3 (abc123)");

        let dev = BuildInfo {
            git_hash: None,
            debug: true,
            ..info
        };
        assert_eq!(dev.to_string(), "unbundle 1.2.3 (debug build)");

        let plain = BuildInfo { debug: false, ..dev };
        assert_eq!(plain.to_string(), "unbundle 1.2.3");
    }
}
