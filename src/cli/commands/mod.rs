//! Command implementations.

pub mod completions;
pub mod import;
pub mod init;
pub mod provider;
pub mod user;
pub mod version;
pub mod wishes;

use crate::config::{default_actor, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::User;
use crate::storage::SqliteStorage;
use std::path::PathBuf;

/// Open the resolved database, failing with `NotInitialized` if it is missing.
pub(crate) fn open_storage(db_path: Option<&PathBuf>, actor: Option<&str>) -> Result<SqliteStorage> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    let actor = actor.map(ToString::to_string).unwrap_or_else(default_actor);
    Ok(SqliteStorage::open(&db_path)?.with_actor(&actor))
}

/// Look up a user by numeric ID or by email.
pub(crate) fn resolve_user(storage: &SqliteStorage, key: &str) -> Result<User> {
    let key = key.trim();
    let found = match key.parse::<i64>() {
        Ok(id) => storage.get_user(id)?,
        Err(_) => storage.get_user_by_email(key)?,
    };
    found.ok_or_else(|| Error::UserNotFound { id: key.to_string() })
}
