//! Create the wish database.
//!
//! The database lives at the resolved path (`--db`, `WISHSYNC_DB`, test mode,
//! or `~/.wishsync/data/wishsync.db`). The schema is applied on open, so init
//! only has to create the directory and open the file once.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    recreated: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is unset,
/// or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path()))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    let exists = db_path.exists();
    if exists && !force {
        return Err(Error::AlreadyInitialized { path: db_path });
    }
    if exists {
        remove_database(&db_path)?;
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    SqliteStorage::open(&db_path)?;

    if json {
        let output = InitOutput {
            database: db_path,
            recreated: exists,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized wishsync database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: wishsync user create <email>");
    }

    Ok(())
}

/// Remove a database file together with its WAL sidecars.
fn remove_database(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = PathBuf::from(sidecar);
        if sidecar.exists() {
            fs::remove_file(sidecar)?;
        }
    }
    Ok(())
}
