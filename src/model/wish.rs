//! Wish record model.

use serde::{Deserialize, Serialize};

use super::BannerType;

/// A single draw event.
///
/// Records are created from provider data, attributed to a local user
/// during import and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wish {
    /// Provider-assigned identifier (higher = more recent at equal time)
    pub id: i64,

    /// Banner the wish was drawn on
    pub banner: BannerType,

    /// Draw time (Unix milliseconds)
    pub time: i64,

    /// Name of the item drawn
    pub name: String,

    /// Item kind as reported by the provider (e.g. "Character", "Weapon")
    pub item_type: String,

    /// Rarity (3-5)
    pub rank: u8,

    /// Owning local user, unset until import
    pub owner_id: Option<i64>,
}

impl Wish {
    /// The `(time, id)` position of this wish in the feed ordering.
    #[must_use]
    pub const fn position(&self) -> Cutoff {
        Cutoff {
            time: self.time,
            id: self.id,
        }
    }

    /// Format the draw time the way the provider does.
    #[must_use]
    pub fn time_display(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.time).map_or_else(
            || self.time.to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
    }
}

/// High-water-mark of a user's stored wishes.
///
/// Ordering is `(time, id)` lexicographic, matching the provider feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cutoff {
    pub time: i64,
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_orders_by_time_then_id() {
        let a = Cutoff { time: 1000, id: 9 };
        let b = Cutoff { time: 1000, id: 10 };
        let c = Cutoff { time: 2000, id: 1 };
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_time_display() {
        let wish = Wish {
            id: 1,
            banner: BannerType::Permanent,
            time: 1_601_553_600_000,
            name: "Amber".to_string(),
            item_type: "Character".to_string(),
            rank: 4,
            owner_id: None,
        };
        assert_eq!(wish.time_display(), "2020-10-01 12:00:00");
    }
}
