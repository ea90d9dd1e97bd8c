//! Bounded weighted scoring for priority items.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value score clamped to `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(i16);

impl Score {
    /// Lowest representable score.
    pub const MIN: Self = Self(0);
    /// Highest representable score.
    pub const MAX: Self = Self(100);

    /// Creates a score, clamping the raw value into `0..=100`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is bounds-checked into 0..=100 before the narrowing cast"
    )]
    pub const fn clamped(raw: i64) -> Self {
        if raw < 0 {
            Self::MIN
        } else if raw > 100 {
            Self::MAX
        } else {
            Self(raw as i16)
        }
    }

    /// Computes a score from weighted inputs.
    ///
    /// The base value is adjusted by additive bonuses and subtractive
    /// penalties, then clamped into the valid range.
    #[must_use]
    pub const fn weigh(inputs: ScoreInputs) -> Self {
        let raw = inputs.base + inputs.affinity_bonus + inputs.reputation_bonus
            + inputs.context_bonus
            - inputs.decline_penalty
            - inputs.backlog_penalty;
        Self::clamped(raw)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(self) -> i16 {
        self.0
    }

    /// Reconstructs a score from its persisted value, clamping defensively.
    #[must_use]
    pub const fn from_persisted(value: i16) -> Self {
        Self::clamped(value as i64)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Weighted inputs for a score computation.
///
/// All members are expressed in score points. Callers map their domain
/// signals (bounty size, affinity match, counterpart reputation, context
/// richness, recent declines, backlog depth) onto these fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreInputs {
    /// Base value, typically derived from the bounty size.
    pub base: i64,
    /// Bonus for a strong affinity match between the parties.
    pub affinity_bonus: i64,
    /// Bonus for counterpart reputation.
    pub reputation_bonus: i64,
    /// Bonus for richer supporting context.
    pub context_bonus: i64,
    /// Penalty for recent declines by this user.
    pub decline_penalty: i64,
    /// Penalty for the depth of the user's existing backlog.
    pub backlog_penalty: i64,
}

#[cfg(test)]
mod tests {
    use super::{Score, ScoreInputs};

    #[test]
    fn weigh_clamps_into_bounds() {
        let high = Score::weigh(ScoreInputs {
            base: 90,
            affinity_bonus: 30,
            ..ScoreInputs::default()
        });
        assert_eq!(high, Score::MAX);

        let low = Score::weigh(ScoreInputs {
            base: 10,
            decline_penalty: 40,
            ..ScoreInputs::default()
        });
        assert_eq!(low, Score::MIN);
    }

    #[test]
    fn weigh_combines_bonuses_and_penalties() {
        let score = Score::weigh(ScoreInputs {
            base: 50,
            affinity_bonus: 10,
            reputation_bonus: 5,
            context_bonus: 5,
            decline_penalty: 15,
            backlog_penalty: 5,
        });
        assert_eq!(score.value(), 50);
    }
}
