//! User command implementations.

use crate::cli::commands::{open_storage, resolve_user};
use crate::cli::UserCommands;
use crate::error::Result;
use crate::model::User;
use crate::storage::Event;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Output for user list.
#[derive(Serialize)]
struct UserListOutput {
    users: Vec<User>,
    count: usize,
}

/// Output for user show.
#[derive(Serialize)]
struct UserShowOutput {
    #[serde(flatten)]
    user: User,
    wishes: usize,
}

/// Output for history.
#[derive(Serialize)]
struct HistoryOutput {
    user_id: i64,
    events: Vec<Event>,
    count: usize,
}

/// Execute user commands.
pub fn execute(
    command: &UserCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    match command {
        UserCommands::Create { email, lang } => {
            create(email, lang.as_deref(), db_path, actor, json)
        }
        UserCommands::Show { user } => show(user, db_path, json),
        UserCommands::List => list(db_path, json),
        UserCommands::Link {
            user,
            uid,
            username,
        } => link(user, uid, username.as_deref(), db_path, actor, json),
    }
}

fn create(
    email: &str,
    lang: Option<&str>,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path, actor)?;
    let user = storage.create_user(email, lang)?;

    if json {
        println!("{}", serde_json::to_string(&user)?);
    } else {
        println!("Created user {} ({})", user.id.to_string().bold(), user.email);
        println!();
        println!("Next: wishsync user link {} <provider-uid>", user.id);
    }

    Ok(())
}

fn show(key: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path, None)?;
    let user = resolve_user(&storage, key)?;
    let wishes = storage.count_all(user.id)?;

    if json {
        let output = UserShowOutput { user, wishes };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{} {}", "User".cyan().bold(), user.id);
    println!("  Email:    {}", user.email);
    if let Some(ref lang) = user.lang {
        println!("  Language: {lang}");
    }
    match user.linked_uid() {
        Some(uid) => {
            let name = user.provider_username.as_deref().unwrap_or("-");
            println!("  Provider: {uid} ({name})");
        }
        None => println!("  Provider: {}", "not linked".yellow()),
    }
    println!("  Wishes:   {wishes}");

    Ok(())
}

fn list(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path, None)?;
    let users = storage.list_users()?;

    if json {
        let output = UserListOutput {
            count: users.len(),
            users,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if users.is_empty() {
        println!("No users found.");
    } else {
        println!("Users ({} found):", users.len());
        println!();
        for user in &users {
            let linked = user
                .linked_uid()
                .map_or_else(|| "unlinked".dimmed().to_string(), ToString::to_string);
            println!("  {:>4}  {}  {}", user.id, user.email, linked);
        }
    }

    Ok(())
}

fn link(
    key: &str,
    uid: &str,
    username: Option<&str>,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut storage = open_storage(db_path, actor)?;
    let user = resolve_user(&storage, key)?;
    let user = storage.link_identity(user.id, uid, username)?;

    if json {
        println!("{}", serde_json::to_string(&user)?);
    } else {
        println!(
            "Linked user {} to provider account {}",
            user.id,
            uid.trim().bold()
        );
    }

    Ok(())
}

/// Show a user's audit history, newest first.
///
/// # Errors
///
/// Returns `UserNotFound` or a database error.
pub fn execute_history(key: &str, limit: u32, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path, None)?;
    let user = resolve_user(&storage, key)?;
    let events = storage.user_events(user.id, Some(limit))?;

    if json {
        let output = HistoryOutput {
            user_id: user.id,
            count: events.len(),
            events,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if events.is_empty() {
        println!("No history for user {}.", user.id);
    } else {
        for event in &events {
            let when = chrono::DateTime::from_timestamp_millis(event.created_at).map_or_else(
                || event.created_at.to_string(),
                |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            );
            print!(
                "{}  {:<16} {}",
                when.dimmed(),
                event.event_type.as_str(),
                event.actor
            );
            if let Some(ref comment) = event.comment {
                print!("  {comment}");
            }
            println!();
        }
    }

    Ok(())
}
