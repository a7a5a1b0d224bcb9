//! SQLite storage layer for wishsync.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Audit events for history
//!
//! The import logic only talks to storage through [`WishStore`], so it
//! can run against any backend that offers these queries.
//!
//! # Submodules
//!
//! - [`events`] - Audit event storage
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - Main SQLite storage implementation

pub mod events;
pub mod schema;
pub mod sqlite;

pub use events::{Event, EventType};
pub use sqlite::{MutationContext, SqliteStorage};

use crate::error::Result;
use crate::model::{BannerType, Cutoff, Wish};

/// Repository of imported wishes.
///
/// Read operations return wishes newest-first. `bulk_insert` must persist
/// the given slice atomically and in slice order.
pub trait WishStore {
    /// Position of the most recent stored wish for the owner, across all banners.
    fn find_most_recent_cutoff(&self, owner_id: i64) -> Result<Option<Cutoff>>;

    /// Insert wishes in order, all or nothing. Every wish must carry an owner.
    fn bulk_insert(&mut self, wishes: &[Wish]) -> Result<usize>;

    /// Up to `limit` most recent wishes on a banner.
    fn find_top(&self, owner_id: i64, banner: BannerType, limit: u32) -> Result<Vec<Wish>>;

    /// A 0-indexed page of wishes on a banner.
    fn find_page(
        &self,
        owner_id: i64,
        banner: BannerType,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Wish>>;

    /// Number of stored wishes on a banner.
    fn count(&self, owner_id: i64, banner: BannerType) -> Result<usize>;

    /// Remove every wish owned by the user. Returns the number removed.
    fn delete_all(&mut self, owner_id: i64) -> Result<usize>;
}
