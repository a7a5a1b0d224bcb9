//! SQLite storage implementation.
//!
//! This module provides the main storage backend for wishsync using SQLite.
//! It follows the MutationContext pattern for transaction discipline and audit logging.

use crate::error::{Error, Result};
use crate::model::{BannerType, Cutoff, User, Wish};
use crate::storage::WishStore;
use crate::storage::events::{get_events, insert_event, Event, EventType};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const USER_COLUMNS: &str = "id, email, lang, created_at, provider_username, provider_uid";
const WISH_COLUMNS: &str = "owner_id, id, gacha_type, time, name, item_type, rank_type";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    actor: String,
}

/// Context for a mutation operation, tracking side effects.
///
/// Passed to mutation closures to collect audit events, which are written
/// in the same transaction as the mutation itself.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation.
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: &str, event_type: EventType) {
        self.events
            .push(Event::new(entity_type, entity_id, event_type, &self.actor));
    }

    /// Record an event with a free-form comment.
    pub fn record_comment(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        comment: &str,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor).with_comment(comment),
        );
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self {
            conn,
            actor: "unknown".to_string(),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            actor: "unknown".to_string(),
        })
    }

    /// Set the actor recorded on audit events.
    #[must_use]
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, &self.actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;
        debug!(op, events = ctx.events.len(), "Mutation committed");

        Ok(result)
    }

    // ==============
    // User Operations
    // ==============

    /// Create a new local user.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the email is blank or already taken.
    pub fn create_user(&mut self, email: &str, lang: Option<&str>) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidArgument("email must not be empty".to_string()));
        }
        if self.get_user_by_email(email)?.is_some() {
            return Err(Error::InvalidArgument(format!(
                "a user with email '{email}' already exists"
            )));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let id = self.mutate("create_user", |tx, ctx| {
            tx.execute(
                "INSERT INTO users (email, lang, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![email, lang, now],
            )?;
            let id = tx.last_insert_rowid();
            ctx.record_event("user", &id.to_string(), EventType::UserCreated);
            Ok(id)
        })?;

        self.require_user(id)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        self.conn
            .query_row(&sql, [id], map_user)
            .optional()
            .map_err(Error::from)
    }

    /// Get a user by ID, failing with `UserNotFound` if absent.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no such user exists.
    pub fn require_user(&self, id: i64) -> Result<User> {
        self.get_user(id)?.ok_or_else(|| Error::UserNotFound {
            id: id.to_string(),
        })
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        self.conn
            .query_row(&sql, [email], map_user)
            .optional()
            .map_err(Error::from)
    }

    /// List all users ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Link a provider identity to a user.
    ///
    /// Re-linking to a different uid is refused while the user still owns
    /// imported wishes, since those were verified against the old identity.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, or `InvalidArgument` for a blank uid or a
    /// refused re-link.
    pub fn link_identity(
        &mut self,
        user_id: i64,
        provider_uid: &str,
        provider_username: Option<&str>,
    ) -> Result<User> {
        let provider_uid = provider_uid.trim();
        if provider_uid.is_empty() {
            return Err(Error::InvalidArgument("provider uid must not be empty".to_string()));
        }

        let user = self.require_user(user_id)?;
        if let Some(linked) = user.linked_uid() {
            if linked != provider_uid && self.count_all(user_id)? > 0 {
                return Err(Error::InvalidArgument(format!(
                    "user {user_id} already has wishes imported from provider uid {linked}; \
                     delete them before re-linking"
                )));
            }
        }

        self.mutate("link_identity", |tx, ctx| {
            tx.execute(
                "UPDATE users SET provider_uid = ?1, provider_username = ?2 WHERE id = ?3",
                rusqlite::params![provider_uid, provider_username, user_id],
            )?;
            ctx.record_comment(
                "user",
                &user_id.to_string(),
                EventType::IdentityLinked,
                provider_uid,
            );
            Ok(())
        })?;

        self.require_user(user_id)
    }

    /// Audit history for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn user_events(&self, user_id: i64, limit: Option<u32>) -> Result<Vec<Event>> {
        get_events(&self.conn, "user", &user_id.to_string(), limit).map_err(Error::from)
    }

    /// Total number of wishes owned by a user across all banners.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_all(&self, owner_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM wishes WHERE owner_id = ?1",
            [owner_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl WishStore for SqliteStorage {
    fn find_most_recent_cutoff(&self, owner_id: i64) -> Result<Option<Cutoff>> {
        self.conn
            .query_row(
                "SELECT time, id FROM wishes WHERE owner_id = ?1
                 ORDER BY time DESC, id DESC LIMIT 1",
                [owner_id],
                |row| {
                    Ok(Cutoff {
                        time: row.get(0)?,
                        id: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Error::from)
    }

    fn bulk_insert(&mut self, wishes: &[Wish]) -> Result<usize> {
        if wishes.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp_millis();
        self.mutate("bulk_insert", |tx, ctx| {
            let mut per_owner: BTreeMap<i64, BTreeMap<BannerType, usize>> = BTreeMap::new();
            let mut stmt = tx.prepare_cached(
                "INSERT INTO wishes (owner_id, id, gacha_type, time, name, item_type, rank_type, imported_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for wish in wishes {
                let owner_id = wish.owner_id.ok_or_else(|| {
                    Error::InvalidArgument(format!("wish {} has no owner", wish.id))
                })?;
                stmt.execute(rusqlite::params![
                    owner_id,
                    wish.id,
                    wish.banner.gacha_type(),
                    wish.time,
                    wish.name,
                    wish.item_type,
                    wish.rank,
                    now,
                ])?;
                *per_owner
                    .entry(owner_id)
                    .or_default()
                    .entry(wish.banner)
                    .or_default() += 1;
            }

            for (owner_id, counts) in &per_owner {
                let comment = counts
                    .iter()
                    .map(|(banner, n)| format!("{banner}={n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                ctx.record_comment(
                    "user",
                    &owner_id.to_string(),
                    EventType::WishesImported,
                    &comment,
                );
            }

            Ok(wishes.len())
        })
    }

    fn find_top(&self, owner_id: i64, banner: BannerType, limit: u32) -> Result<Vec<Wish>> {
        let sql = format!(
            "SELECT {WISH_COLUMNS} FROM wishes
             WHERE owner_id = ?1 AND gacha_type = ?2
             ORDER BY time DESC, id DESC
             LIMIT ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params![owner_id, banner.gacha_type(), limit],
                map_wish,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn find_page(
        &self,
        owner_id: i64,
        banner: BannerType,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Wish>> {
        let offset = i64::from(page) * i64::from(page_size);
        let sql = format!(
            "SELECT {WISH_COLUMNS} FROM wishes
             WHERE owner_id = ?1 AND gacha_type = ?2
             ORDER BY time DESC, id DESC
             LIMIT ?3 OFFSET ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params![owner_id, banner.gacha_type(), page_size, offset],
                map_wish,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self, owner_id: i64, banner: BannerType) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM wishes WHERE owner_id = ?1 AND gacha_type = ?2",
            rusqlite::params![owner_id, banner.gacha_type()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn delete_all(&mut self, owner_id: i64) -> Result<usize> {
        self.mutate("delete_all", |tx, ctx| {
            let rows = tx.execute("DELETE FROM wishes WHERE owner_id = ?1", [owner_id])?;
            ctx.record_comment(
                "user",
                &owner_id.to_string(),
                EventType::WishesDeleted,
                &format!("{rows} wishes"),
            );
            Ok(rows)
        })
    }
}

fn map_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        lang: row.get(2)?,
        created_at: row.get(3)?,
        provider_username: row.get(4)?,
        provider_uid: row.get(5)?,
    })
}

fn map_wish(row: &rusqlite::Row) -> rusqlite::Result<Wish> {
    let code: u16 = row.get(2)?;
    let banner = BannerType::from_gacha_type(code)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, i64::from(code)))?;

    Ok(Wish {
        owner_id: Some(row.get(0)?),
        id: row.get(1)?,
        banner,
        time: row.get(3)?,
        name: row.get(4)?,
        item_type: row.get(5)?,
        rank: row.get(6)?,
    })
}
