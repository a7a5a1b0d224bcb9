//! Import command implementation.

use crate::cli::commands::{open_storage, resolve_user};
use crate::cli::ImportArgs;
use crate::error::{Error, Result};
use crate::provider::{resolve_lang_for, MihoyoClient};
use crate::sync::{CutoffPolicy, ImportStats, Synchronizer};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Output for import.
#[derive(Serialize)]
struct ImportOutput {
    user_id: i64,
    policy: CutoffPolicy,
    imported: ImportStats,
    total: usize,
}

/// Execute the import command.
///
/// # Errors
///
/// Returns identity, provider, or database errors from the import.
pub fn execute(
    args: &ImportArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    if args.authkey.trim().is_empty() {
        return Err(Error::InvalidArgument("authkey must not be empty".to_string()));
    }

    let mut storage = open_storage(db_path, actor)?;
    let user = resolve_user(&storage, &args.user)?;
    let lang = resolve_lang_for(user.lang.as_deref());
    let client = MihoyoClient::with_config(None, None, Some(lang), None);
    let policy = if args.strict_cutoff {
        CutoffPolicy::TimestampAndId
    } else {
        CutoffPolicy::Timestamp
    };

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let imported = rt.block_on(async {
        Synchronizer::new(&mut storage, &client)
            .with_policy(policy)
            .import_all(&user, args.authkey.trim())
            .await
    })?;

    if json {
        let output = ImportOutput {
            user_id: user.id,
            policy,
            total: imported.total(),
            imported,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if imported.is_empty() {
        println!("Already up to date.");
        return Ok(());
    }

    println!(
        "{} {} new wishes for user {}",
        "Imported".green().bold(),
        imported.total(),
        user.id
    );
    for (banner, count) in imported.iter().filter(|(_, count)| *count > 0) {
        println!("  {:<10} {count}", banner.as_str());
    }

    Ok(())
}
