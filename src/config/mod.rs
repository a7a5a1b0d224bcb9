//! Configuration management.
//!
//! This module resolves where wishsync keeps its state and who is acting.
//!
//! # Layout
//!
//! Everything lives under a single global directory:
//! - **Database**: `~/.wishsync/data/wishsync.db`
//! - **Test database**: `~/.wishsync/test/wishsync.db` (when `WISHSYNC_TEST_DB` is set)
//! - **Provider settings**: `~/.wishsync/config.json` (see [`crate::provider::config`])

use std::path::{Path, PathBuf};

/// Get the global wishsync directory location (`~/.wishsync/`).
#[must_use]
pub fn global_wishsync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".wishsync"))
}

/// Interpret an environment flag value. Empty, `0` and `false` are off.
fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `WISHSYNC_TEST_DB=1` (or any truthy value).
/// This redirects database operations to an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("WISHSYNC_TEST_DB").is_ok_and(|v| is_truthy(&v))
}

/// Get the test database path: `~/.wishsync/test/wishsync.db`.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_wishsync_dir().map(|dir| dir.join("test").join("wishsync.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag, which also reads `WISHSYNC_DB`)
/// 2. `WISHSYNC_TEST_DB` set → the test database
/// 3. Global location: `~/.wishsync/data/wishsync.db`
///
/// Returns `None` only when no home directory can be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    global_wishsync_dir().map(|dir| dir.join("data").join("wishsync.db"))
}

/// Get the default actor name recorded on audit events.
///
/// Priority:
/// 1. `WISHSYNC_ACTOR` environment variable
/// 2. System username
/// 3. "unknown"
#[must_use]
pub fn default_actor() -> String {
    ["WISHSYNC_ACTOR", "USER"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_actor() {
        let actor = default_actor();
        assert!(!actor.is_empty());
    }

    #[test]
    fn test_resolve_db_path_with_explicit() {
        let explicit = PathBuf::from("/custom/path/wishes.db");
        let result = resolve_db_path(Some(&explicit));
        assert_eq!(result, Some(explicit));
    }

    #[test]
    fn test_resolve_db_path_defaults_to_global() {
        let path = resolve_db_path(None).unwrap();
        assert!(path.ends_with("wishsync.db"));
        assert!(path.to_string_lossy().contains(".wishsync"));
    }

    #[test]
    fn test_test_db_path_is_separate() {
        let global = global_wishsync_dir().unwrap();
        let test = test_db_path().unwrap();

        assert!(test.ends_with("test/wishsync.db"));
        assert_ne!(global.join("data").join("wishsync.db"), test);
    }

    #[test]
    fn test_truthy_parsing() {
        for off in ["", "0", "false", "FALSE"] {
            assert!(!is_truthy(off), "{off:?}");
        }
        for on in ["1", "true", "yes"] {
            assert!(is_truthy(on), "{on:?}");
        }
    }
}
