//! Level score: coins, time bonus and star rating.

use serde::{Deserialize, Serialize};

/// Points per coin.
pub const COIN_VALUE: u32 = 10;
/// Time bonus at zero seconds.
pub const TIME_BONUS_MAX: f64 = 500.0;
/// Time bonus lost per second.
pub const TIME_BONUS_DECAY_PER_SECOND: f64 = 5.0;

/// Minimum scores for each star.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarThresholds {
    /// One star
    pub one_star: u32,
    /// Two stars
    pub two_star: u32,
    /// Three stars
    pub three_star: u32,
}

/// Running score for the current level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTracker {
    coins: u32,
    score: u32,
}

impl ScoreTracker {
    /// Start at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Coins collected.
    #[must_use]
    pub fn coins(&self) -> u32 {
        self.coins
    }

    /// Score before the time bonus.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Add coins and their score.
    pub fn add_coins(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        self.coins = self.coins.saturating_add(count);
        self.score = self.score.saturating_add(count.saturating_mul(COIN_VALUE));
    }

    /// Bonus for finishing quickly: 500 at zero seconds, minus 5 per second,
    /// floored at zero. Negative times count as zero.
    #[must_use]
    pub fn time_bonus(&self, time_elapsed_ms: f64) -> u32 {
        let seconds = time_elapsed_ms.max(0.0) / 1000.0;
        let bonus = (TIME_BONUS_MAX - seconds * TIME_BONUS_DECAY_PER_SECOND).max(0.0);
        // Bounded to [0, 500]
        bonus.floor() as u32
    }

    /// Score plus time bonus.
    #[must_use]
    pub fn final_score(&self, time_elapsed_ms: f64) -> u32 {
        self.score.saturating_add(self.time_bonus(time_elapsed_ms))
    }

    /// Stars earned by `final_score`, 0-3.
    #[must_use]
    pub fn star_rating(&self, final_score: u32, thresholds: &StarThresholds) -> u8 {
        if final_score >= thresholds.three_star {
            3
        } else if final_score >= thresholds.two_star {
            2
        } else if final_score >= thresholds.one_star {
            1
        } else {
            0
        }
    }

    /// Back to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
