//! Types shared by the import algorithm and its callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{BannerType, Cutoff, Wish};

/// How a remote record is compared against the stored high-water-mark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffPolicy {
    /// Compare draw time only. Records sharing the cutoff's timestamp count
    /// as already imported, even with a higher id.
    #[default]
    Timestamp,
    /// Compare `(time, id)`. A same-instant record with a higher id than the
    /// cutoff is still imported.
    TimestampAndId,
}

impl CutoffPolicy {
    /// Whether `wish` is strictly newer than `cutoff`.
    #[must_use]
    pub fn is_newer(self, wish: &Wish, cutoff: Cutoff) -> bool {
        match self {
            Self::Timestamp => wish.time > cutoff.time,
            Self::TimestampAndId => wish.position() > cutoff,
        }
    }

    /// Apply the cutoff to one newest-first page.
    ///
    /// Returns the records to keep and whether the cutoff was reached. When the
    /// page's oldest record is not newer than the cutoff, only the newer
    /// records are kept and paging must stop. Otherwise the whole page is kept.
    #[must_use]
    pub fn split_page(self, page: Vec<Wish>, cutoff: Option<Cutoff>) -> (Vec<Wish>, bool) {
        let Some(cutoff) = cutoff else {
            return (page, false);
        };

        let reached = page
            .last()
            .is_some_and(|oldest| !self.is_newer(oldest, cutoff));
        if !reached {
            return (page, false);
        }

        let kept = page
            .into_iter()
            .filter(|wish| self.is_newer(wish, cutoff))
            .collect();
        (kept, true)
    }
}

/// Per-banner wish counts.
///
/// Always holds an entry for every banner, zero when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BannerCounts {
    counts: BTreeMap<BannerType, usize>,
}

/// Wishes imported per banner by one run.
pub type ImportStats = BannerCounts;

impl Default for BannerCounts {
    fn default() -> Self {
        Self {
            counts: BannerType::ALL.iter().map(|banner| (*banner, 0)).collect(),
        }
    }
}

impl BannerCounts {
    /// Set the count for a banner.
    pub fn set(&mut self, banner: BannerType, count: usize) {
        self.counts.insert(banner, count);
    }

    /// Count for a banner.
    #[must_use]
    pub fn get(&self, banner: BannerType) -> usize {
        self.counts.get(&banner).copied().unwrap_or_default()
    }

    /// Sum over all banners.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// True when every banner is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate `(banner, count)` in banner order.
    pub fn iter(&self) -> impl Iterator<Item = (BannerType, usize)> + '_ {
        self.counts.iter().map(|(banner, count)| (*banner, *count))
    }
}
