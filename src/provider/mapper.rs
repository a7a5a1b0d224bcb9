//! Translation from provider records to [`Wish`].

use crate::error::{Error, Result};
use crate::model::{BannerType, Wish};

use super::types::GachaLogEntry;

/// Time format used by the provider feed.
pub const PROVIDER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Map one provider record to a [`Wish`] on the banner it was fetched from.
///
/// The provider reports sub-types (e.g. a second character event banner)
/// under the queried feed, so the feed's banner wins over `gacha_type`.
/// The result has no owner.
///
/// # Errors
///
/// Returns `MalformedResponse` if the id, time or rank cannot be parsed.
pub fn from_provider(entry: GachaLogEntry, banner: BannerType) -> Result<Wish> {
    let id = entry
        .id
        .trim()
        .parse::<i64>()
        .map_err(|e| malformed(&entry.id, "id", &e))?;

    let time = chrono::NaiveDateTime::parse_from_str(entry.time.trim(), PROVIDER_TIME_FORMAT)
        .map_err(|e| malformed(&entry.id, "time", &e))?
        .and_utc()
        .timestamp_millis();

    let rank = entry
        .rank_type
        .trim()
        .parse::<u8>()
        .map_err(|e| malformed(&entry.id, "rank_type", &e))?;

    Ok(Wish {
        id,
        banner,
        time,
        name: entry.name,
        item_type: entry.item_type,
        rank,
        owner_id: None,
    })
}

fn malformed(id: &str, field: &str, err: &dyn std::fmt::Display) -> Error {
    Error::MalformedResponse(format!("wish record {id}: bad {field} ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, time: &str, rank: &str) -> GachaLogEntry {
        GachaLogEntry {
            id: id.to_string(),
            uid: "700000001".to_string(),
            gacha_type: "400".to_string(),
            time: time.to_string(),
            name: "Keqing".to_string(),
            item_type: "Character".to_string(),
            rank_type: rank.to_string(),
        }
    }

    #[test]
    fn test_maps_fields() {
        let wish = from_provider(
            entry("1601553600000000001", "2020-10-01 12:00:00", "5"),
            BannerType::CharacterEvent,
        )
        .unwrap();

        assert_eq!(wish.id, 1_601_553_600_000_000_001);
        assert_eq!(wish.banner, BannerType::CharacterEvent);
        assert_eq!(wish.time, 1_601_553_600_000);
        assert_eq!(wish.name, "Keqing");
        assert_eq!(wish.rank, 5);
        assert_eq!(wish.owner_id, None);
    }

    #[test]
    fn test_rejects_malformed_fields() {
        let bad_id = from_provider(entry("abc", "2020-10-01 12:00:00", "5"), BannerType::Novice);
        assert!(matches!(bad_id, Err(Error::MalformedResponse(_))));

        let bad_time = from_provider(entry("1", "01/10/2020", "5"), BannerType::Novice);
        assert!(matches!(bad_time, Err(Error::MalformedResponse(_))));

        let bad_rank = from_provider(entry("1", "2020-10-01 12:00:00", "five"), BannerType::Novice);
        assert!(matches!(bad_rank, Err(Error::MalformedResponse(_))));
    }
}
