//! The streak/XP engine.
//!
//! Pure arithmetic over an already-loaded task snapshot. All failure modes
//! (missing task, duplicate completion, permission checks) belong to the
//! completion pipeline in the API layer; nothing here can fail.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::difficulty::Difficulty;
use crate::types::Timestamp;

/// Streak bonus grows linearly at 5 XP per day and is hard-capped here.
const STREAK_BONUS_CAP: i64 = 100;

/// XP per consecutive streak day.
const STREAK_BONUS_PER_DAY: i64 = 5;

// ---------------------------------------------------------------------------
// Day boundary policy
// ---------------------------------------------------------------------------

/// Policy for truncating instants to calendar days.
///
/// Streak continuity and the one-completion-per-day guard both operate at
/// day granularity, so "which day is it" must be a single explicit decision
/// rather than an implicit local-midnight truncation scattered through the
/// code. The offset shifts the day boundary relative to UTC (e.g. `-300`
/// puts the boundary at 05:00 UTC).
#[derive(Debug, Clone, Copy)]
pub struct DayBoundary {
    offset_minutes: i32,
}

impl DayBoundary {
    /// UTC midnight boundary.
    pub const UTC: DayBoundary = DayBoundary { offset_minutes: 0 };

    pub fn new(offset_minutes: i32) -> Self {
        Self { offset_minutes }
    }

    /// The calendar day a given instant falls on under this policy.
    pub fn day_of(&self, at: Timestamp) -> NaiveDate {
        (at + Duration::minutes(i64::from(self.offset_minutes))).date_naive()
    }
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::UTC
    }
}

// ---------------------------------------------------------------------------
// Engine input / output
// ---------------------------------------------------------------------------

/// The slice of task state the engine needs.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub difficulty: Difficulty,
    pub current_streak: i32,
    pub longest_streak: i32,
    /// Day of the most recent completion, already truncated by the
    /// [`DayBoundary`] policy in force when it was recorded.
    pub last_completed_on: Option<NaiveDate>,
    pub requires_proof: bool,
}

/// Result of running the engine for one completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub new_streak: i32,
    pub longest_streak: i32,
    pub base_xp: i64,
    pub streak_bonus: i64,
    pub multiplier_bonus: i64,
    pub total_xp: i64,
    pub requires_verification: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compute the streak transition and XP breakdown for a completion on `today`.
///
/// `multiplier` is the reward multiplier of the task's owning community
/// (1.0 when the task has none); values outside `[1, 2]` are clamped.
///
/// Continuity is checked at day granularity: a completion on day N continues
/// a streak whose last completion was on day N-1 (or later the same day, in
/// which case the pipeline's duplicate guard has already fired). Anything
/// older resets the streak to 1, never 0 -- today's completion counts.
pub fn compute_completion(
    task: &TaskSnapshot,
    multiplier: f64,
    today: NaiveDate,
) -> CompletionOutcome {
    let yesterday = today - Duration::days(1);
    let continues = task
        .last_completed_on
        .is_some_and(|last| last >= yesterday);

    let new_streak = if continues {
        task.current_streak + 1
    } else {
        1
    };
    let longest_streak = task.longest_streak.max(new_streak);

    let base_xp = task.difficulty.base_xp();
    let streak_bonus = streak_bonus(new_streak);
    let multiplier_bonus = multiplier_bonus(base_xp, multiplier);

    CompletionOutcome {
        new_streak,
        longest_streak,
        base_xp,
        streak_bonus,
        multiplier_bonus,
        total_xp: base_xp + streak_bonus + multiplier_bonus,
        requires_verification: task.requires_proof,
    }
}

/// `min(streak * 5, 100)`, floored at zero for defensive inputs.
pub fn streak_bonus(streak: i32) -> i64 {
    (i64::from(streak) * STREAK_BONUS_PER_DAY)
        .min(STREAK_BONUS_CAP)
        .max(0)
}

/// Extra XP from a community reward multiplier in `[1, 2]`.
pub fn multiplier_bonus(base_xp: i64, multiplier: f64) -> i64 {
    let clamped = multiplier.clamp(1.0, 2.0);
    (base_xp as f64 * (clamped - 1.0)).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn snapshot(difficulty: Difficulty, streak: i32, last: Option<NaiveDate>) -> TaskSnapshot {
        TaskSnapshot {
            difficulty,
            current_streak: streak,
            longest_streak: streak,
            last_completed_on: last,
            requires_proof: false,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn completion_after_yesterday_continues_streak() {
        let task = snapshot(Difficulty::Easy, 3, Some(day(2025, 6, 9)));
        let outcome = compute_completion(&task, 1.0, day(2025, 6, 10));
        assert_eq!(outcome.new_streak, 4);
        assert_eq!(outcome.longest_streak, 4);
    }

    #[test]
    fn completion_after_gap_resets_to_one() {
        // Last completion two days ago: the streak breaks regardless of length.
        let task = snapshot(Difficulty::Easy, 45, Some(day(2025, 6, 8)));
        let outcome = compute_completion(&task, 1.0, day(2025, 6, 10));
        assert_eq!(outcome.new_streak, 1);
        // Longest is preserved from history, not recomputed.
        assert_eq!(outcome.longest_streak, 45);
    }

    #[test]
    fn first_ever_completion_starts_at_one() {
        let task = snapshot(Difficulty::Medium, 0, None);
        let outcome = compute_completion(&task, 1.0, day(2025, 6, 10));
        assert_eq!(outcome.new_streak, 1);
        assert_eq!(outcome.longest_streak, 1);
    }

    #[test]
    fn n_consecutive_days_yield_streak_n() {
        let mut task = snapshot(Difficulty::Easy, 0, None);
        let start = day(2025, 1, 1);
        for n in 0..30 {
            let today = start + Duration::days(n);
            let outcome = compute_completion(&task, 1.0, today);
            assert_eq!(outcome.new_streak, n as i32 + 1);
            assert!(outcome.longest_streak >= outcome.new_streak);
            task.current_streak = outcome.new_streak;
            task.longest_streak = outcome.longest_streak;
            task.last_completed_on = Some(today);
        }
    }

    #[test]
    fn streak_bonus_is_linear_with_hard_cap() {
        assert_eq!(streak_bonus(0), 0);
        assert_eq!(streak_bonus(1), 5);
        assert_eq!(streak_bonus(7), 35);
        assert_eq!(streak_bonus(20), 100);
        // Capped at 100, not 500.
        assert_eq!(streak_bonus(100), 100);
    }

    #[test]
    fn multiplier_bonus_floors_and_clamps() {
        assert_eq!(multiplier_bonus(100, 1.0), 0);
        assert_eq!(multiplier_bonus(100, 1.5), 50);
        assert_eq!(multiplier_bonus(25, 1.1), 2); // floor(2.5)
        // Out-of-range multipliers clamp to [1, 2].
        assert_eq!(multiplier_bonus(100, 0.5), 0);
        assert_eq!(multiplier_bonus(100, 3.0), 100);
    }

    #[test]
    fn hard_task_continuing_streak_of_six() {
        // hard (base 100), no multiplier, prior streak 6 continuing:
        // newStreak=7, bonus=35, total=135.
        let task = TaskSnapshot {
            difficulty: Difficulty::Hard,
            current_streak: 6,
            longest_streak: 6,
            last_completed_on: Some(day(2025, 6, 9)),
            requires_proof: false,
        };
        let outcome = compute_completion(&task, 1.0, day(2025, 6, 10));
        assert_eq!(outcome.new_streak, 7);
        assert_eq!(outcome.base_xp, 100);
        assert_eq!(outcome.streak_bonus, 35);
        assert_eq!(outcome.multiplier_bonus, 0);
        assert_eq!(outcome.total_xp, 135);
        assert!(!outcome.requires_verification);
    }

    #[test]
    fn proof_requirement_flows_through() {
        let mut task = snapshot(Difficulty::Hard, 6, Some(day(2025, 6, 9)));
        task.requires_proof = true;
        let outcome = compute_completion(&task, 1.0, day(2025, 6, 10));
        assert!(outcome.requires_verification);
        // The breakdown is still computed in full for deferred crediting.
        assert_eq!(outcome.total_xp, 135);
    }

    #[test]
    fn day_boundary_offset_shifts_the_day() {
        let boundary = DayBoundary::new(-300); // boundary at 05:00 UTC
        let early = Utc.with_ymd_and_hms(2025, 6, 10, 3, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 6, 10, 6, 0, 0).unwrap();
        assert_eq!(boundary.day_of(early), day(2025, 6, 9));
        assert_eq!(boundary.day_of(later), day(2025, 6, 10));

        assert_eq!(DayBoundary::UTC.day_of(early), day(2025, 6, 10));
    }
}
