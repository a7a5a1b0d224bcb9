//! Banner (wish category) enumeration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A wish category.
///
/// Each banner has an independent history feed on the provider side,
/// addressed by its numeric gacha type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerType {
    /// Beginner banner (gacha type 100)
    Novice,
    /// Standard banner (gacha type 200)
    Permanent,
    /// Character event banner (gacha type 301)
    CharacterEvent,
    /// Weapon event banner (gacha type 302)
    WeaponEvent,
}

impl BannerType {
    /// Every banner, in import order.
    pub const ALL: [Self; 4] = [
        Self::Novice,
        Self::Permanent,
        Self::CharacterEvent,
        Self::WeaponEvent,
    ];

    /// Provider gacha type code.
    #[must_use]
    pub const fn gacha_type(self) -> u16 {
        match self {
            Self::Novice => 100,
            Self::Permanent => 200,
            Self::CharacterEvent => 301,
            Self::WeaponEvent => 302,
        }
    }

    /// Look up a banner by provider gacha type code.
    #[must_use]
    pub const fn from_gacha_type(code: u16) -> Option<Self> {
        match code {
            100 => Some(Self::Novice),
            200 => Some(Self::Permanent),
            301 => Some(Self::CharacterEvent),
            302 => Some(Self::WeaponEvent),
            _ => None,
        }
    }

    /// Short name used on the command line and in output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Novice => "novice",
            Self::Permanent => "permanent",
            Self::CharacterEvent => "character",
            Self::WeaponEvent => "weapon",
        }
    }
}

impl fmt::Display for BannerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BannerType {
    type Err = Error;

    /// Accepts short names, a few synonyms, and numeric gacha codes.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        if let Ok(code) = normalized.parse::<u16>() {
            return Self::from_gacha_type(code)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown banner code '{code}'")));
        }

        match normalized.as_str() {
            "novice" | "beginner" => Ok(Self::Novice),
            "permanent" | "standard" => Ok(Self::Permanent),
            "character" | "character_event" | "event" => Ok(Self::CharacterEvent),
            "weapon" | "weapon_event" => Ok(Self::WeaponEvent),
            _ => Err(Error::InvalidArgument(format!("unknown banner '{s}'"))),
        }
    }
}
