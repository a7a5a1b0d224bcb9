//! Incremental wish history import.
//!
//! The synchronizer pulls each banner's history from the provider, newest
//! first, until it reaches records already held locally:
//!
//! - **Cutoff**: the newest stored `(time, id)` for the user, read once per run
//! - **Paging**: pages 1, 2, ... until an empty page or the cutoff is reached
//! - **Persist**: kept records are reversed to chronological order, stamped
//!   with the owner and written in a single transaction
//!
//! # Example
//!
//! ```ignore
//! use wishsync::sync::{CutoffPolicy, Synchronizer};
//!
//! let client = MihoyoClient::new();
//! let mut sync = Synchronizer::new(&mut storage, &client).with_policy(CutoffPolicy::Timestamp);
//! let stats = sync.import_all(&user, &authkey).await?;
//! println!("imported {} wishes", stats.total());
//! ```

pub mod synchronizer;
pub mod types;

pub use synchronizer::{Synchronizer, BANNER_PREVIEW_LIMIT, HISTORY_PAGE_SIZE};
pub use types::{BannerCounts, CutoffPolicy, ImportStats};
