//! Player and SkillTier data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches and lookups).
pub type PlayerId = Uuid;

/// Rating a new player starts with unless told otherwise.
pub const DEFAULT_RATING: i32 = 1500;

/// Coarse skill band derived from rating.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Pro,
}

impl SkillTier {
    pub fn from_rating(rating: i32) -> Self {
        match rating {
            r if r < 1200 => SkillTier::Beginner,
            r if r < 1500 => SkillTier::Intermediate,
            r if r < 1800 => SkillTier::Advanced,
            _ => SkillTier::Pro,
        }
    }
}

/// A club member with an Elo rating.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
    pub matches_played: u32,
    pub matches_won: u32,
    pub skill_tier: SkillTier,
    /// Optimistic concurrency counter, bumped by the repository on every save.
    #[serde(default)]
    pub version: u64,
}

impl Player {
    /// Create a new player with the default rating.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rating(name, DEFAULT_RATING)
    }

    pub fn with_rating(name: impl Into<String>, rating: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            rating,
            matches_played: 0,
            matches_won: 0,
            skill_tier: SkillTier::from_rating(rating),
            version: 0,
        }
    }

    /// Apply a finished match: new rating, played/won counters, refreshed tier.
    pub fn record_match(&mut self, new_rating: i32, won: bool) {
        self.rating = new_rating;
        self.matches_played += 1;
        if won {
            self.matches_won += 1;
        }
        self.skill_tier = SkillTier::from_rating(new_rating);
    }
}
