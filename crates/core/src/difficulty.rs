//! Task difficulty tiers and their fixed base-XP values.

use serde::{Deserialize, Serialize};

/// Difficulty tier of a task. Determines base XP per completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    /// Fixed base XP awarded per completion at this tier.
    pub fn base_xp(self) -> i64 {
        match self {
            Difficulty::Easy => 25,
            Difficulty::Medium => 50,
            Difficulty::Hard => 100,
            Difficulty::Extreme => 200,
        }
    }

    /// Storage representation (lowercase, matches the `tasks.difficulty` column).
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
        }
    }

    /// Parse a stored tier name. Unknown or missing tiers fall back to
    /// [`Difficulty::Medium`] so legacy rows still earn a sane base XP.
    pub fn parse_or_default(value: &str) -> Self {
        match value {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            "extreme" => Difficulty::Extreme,
            _ => Difficulty::Medium,
        }
    }
}
