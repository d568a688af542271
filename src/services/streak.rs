//! Writing-streak state machine.
//!
//! Four observable states: `no_entries`, `active_today`, `can_extend`,
//! `broken`. [`record_entry`] is the only transition; it fires once per
//! successful entry creation and never on edit, delete, or restore.
//! [`describe`] is a read-only projection for display.
//!
//! Both functions take `today` explicitly so tests control the clock.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::user::User;

/// Snapshot of a user's streak columns. Integer counters are normalized
/// from NULL to 0 when built from a row (accounts restored from older
/// backups carry NULLs).
#[derive(Debug, Clone, PartialEq)]
pub struct StreakCounters {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub streak_start_date: Option<NaiveDate>,
    pub last_entry_date: Option<NaiveDate>,
}

impl From<&User> for StreakCounters {
    fn from(user: &User) -> Self {
        Self {
            current_streak: user.current_streak.unwrap_or(0),
            longest_streak: user.longest_streak.unwrap_or(0),
            streak_start_date: user.streak_start_date,
            last_entry_date: user.last_entry_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    NoEntries,
    ActiveToday,
    CanExtend,
    Broken,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakInfo {
    pub current: i32,
    pub longest: i32,
    pub status: StreakStatus,
    pub message: String,
}

/// Advance the streak for an entry written on `today`.
///
/// Same-day repeats leave the counters alone; a consecutive day extends
/// the run and tracks the longest; anything else (a gap of two or more
/// days, or `today` before the last entry after a clock change) starts a
/// fresh run of 1. `longest_streak` is a historical maximum and never
/// decreases. `last_entry_date` always lands on `today`.
pub fn record_entry(counters: &mut StreakCounters, today: NaiveDate) {
    match counters.last_entry_date {
        None => {
            counters.current_streak = 1;
            counters.longest_streak = 1;
            counters.streak_start_date = Some(today);
        }
        Some(last) if today == last => {
            // Same-day entry, streak unchanged.
        }
        Some(last) if today == last + Duration::days(1) => {
            counters.current_streak += 1;
            if counters.current_streak > counters.longest_streak {
                counters.longest_streak = counters.current_streak;
            }
            // Only reachable when the stored counter was NULL (restored
            // account): the run restarts at 1 and needs a start date.
            if counters.current_streak == 1 {
                counters.streak_start_date = Some(today);
            }
        }
        Some(_) => {
            counters.current_streak = 1;
            counters.streak_start_date = Some(today);
        }
    }
    counters.last_entry_date = Some(today);
}

/// Project the counters into display form without mutating them.
pub fn describe(counters: &StreakCounters, today: NaiveDate) -> StreakInfo {
    let last = match counters.last_entry_date {
        None => {
            return StreakInfo {
                current: 0,
                longest: counters.longest_streak,
                status: StreakStatus::NoEntries,
                message: "Start writing to begin your streak!".to_string(),
            }
        }
        Some(last) => last,
    };

    if today == last {
        StreakInfo {
            current: counters.current_streak,
            longest: counters.longest_streak,
            status: StreakStatus::ActiveToday,
            message: format!(
                "Great! You've written today. Current streak: {} days!",
                counters.current_streak
            ),
        }
    } else if today == last + Duration::days(1) {
        StreakInfo {
            current: counters.current_streak,
            longest: counters.longest_streak,
            status: StreakStatus::CanExtend,
            message: format!(
                "Write today to extend your {}-day streak!",
                counters.current_streak
            ),
        }
    } else {
        let days_since = (today - last).num_days();
        StreakInfo {
            current: 0,
            longest: counters.longest_streak,
            status: StreakStatus::Broken,
            message: format!(
                "Your streak ended {} days ago. Start a new streak today!",
                days_since
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fresh() -> StreakCounters {
        StreakCounters {
            current_streak: 0,
            longest_streak: 0,
            streak_start_date: None,
            last_entry_date: None,
        }
    }

    #[test]
    fn first_entry_starts_streak_of_one() {
        let today = day(2024, 3, 10);
        let mut c = fresh();
        record_entry(&mut c, today);
        assert_eq!(c.current_streak, 1);
        assert_eq!(c.longest_streak, 1);
        assert_eq!(c.streak_start_date, Some(today));
        assert_eq!(c.last_entry_date, Some(today));
    }

    #[test]
    fn same_day_entries_change_nothing() {
        let today = day(2024, 3, 10);
        let mut c = fresh();
        record_entry(&mut c, today);
        let snapshot = c.clone();
        record_entry(&mut c, today);
        assert_eq!(c, snapshot);
    }

    #[test]
    fn consecutive_days_extend_and_track_longest() {
        let mut c = fresh();
        let start = day(2024, 3, 1);
        for offset in 0..5 {
            record_entry(&mut c, start + Duration::days(offset));
        }
        assert_eq!(c.current_streak, 5);
        assert_eq!(c.longest_streak, 5);
        assert_eq!(c.streak_start_date, Some(start));
        assert_eq!(c.last_entry_date, Some(day(2024, 3, 5)));
    }

    #[test]
    fn gap_resets_current_but_keeps_longest() {
        let mut c = fresh();
        record_entry(&mut c, day(2024, 3, 1));
        record_entry(&mut c, day(2024, 3, 2));
        record_entry(&mut c, day(2024, 3, 3));
        // Three days off.
        record_entry(&mut c, day(2024, 3, 7));
        assert_eq!(c.current_streak, 1);
        assert_eq!(c.longest_streak, 3);
        assert_eq!(c.streak_start_date, Some(day(2024, 3, 7)));
        assert_eq!(c.last_entry_date, Some(day(2024, 3, 7)));
    }

    #[test]
    fn clock_moving_backwards_counts_as_break() {
        let mut c = fresh();
        record_entry(&mut c, day(2024, 3, 10));
        record_entry(&mut c, day(2024, 3, 8));
        assert_eq!(c.current_streak, 1);
        assert_eq!(c.longest_streak, 1);
        assert_eq!(c.streak_start_date, Some(day(2024, 3, 8)));
        assert_eq!(c.last_entry_date, Some(day(2024, 3, 8)));
    }

    #[test]
    fn longest_is_never_lowered() {
        let mut c = fresh();
        for offset in 0..7 {
            record_entry(&mut c, day(2024, 1, 1) + Duration::days(offset));
        }
        assert_eq!(c.longest_streak, 7);
        record_entry(&mut c, day(2024, 2, 1));
        record_entry(&mut c, day(2024, 2, 2));
        assert_eq!(c.current_streak, 2);
        assert_eq!(c.longest_streak, 7);
    }

    #[test]
    fn extending_a_five_day_run_yields_six() {
        let mut c = StreakCounters {
            current_streak: 5,
            longest_streak: 5,
            streak_start_date: Some(day(2024, 3, 1)),
            last_entry_date: Some(day(2024, 3, 5)),
        };
        record_entry(&mut c, day(2024, 3, 6));
        assert_eq!(c.current_streak, 6);
        assert_eq!(c.longest_streak, 6);
        assert_eq!(c.streak_start_date, Some(day(2024, 3, 1)));
    }

    #[test]
    fn extending_does_not_lower_a_larger_longest() {
        let mut c = StreakCounters {
            current_streak: 2,
            longest_streak: 9,
            streak_start_date: Some(day(2024, 3, 4)),
            last_entry_date: Some(day(2024, 3, 5)),
        };
        record_entry(&mut c, day(2024, 3, 6));
        assert_eq!(c.current_streak, 3);
        assert_eq!(c.longest_streak, 9);
    }

    #[test]
    fn null_counters_restored_account_restarts_cleanly() {
        // A restored account: dates survived the backup, counters did not.
        let mut c = StreakCounters {
            current_streak: 0,
            longest_streak: 0,
            streak_start_date: None,
            last_entry_date: Some(day(2024, 3, 5)),
        };
        record_entry(&mut c, day(2024, 3, 6));
        assert_eq!(c.current_streak, 1);
        assert_eq!(c.longest_streak, 1);
        // The run restarted at 1, so the start date is set.
        assert_eq!(c.streak_start_date, Some(day(2024, 3, 6)));
    }

    #[test]
    fn counters_from_user_row_normalize_nulls() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "x".into(),
            created_at: chrono::Utc::now(),
            last_login: None,
            current_streak: None,
            longest_streak: None,
            streak_start_date: None,
            last_entry_date: Some(day(2024, 3, 5)),
        };
        let c = StreakCounters::from(&user);
        assert_eq!(c.current_streak, 0);
        assert_eq!(c.longest_streak, 0);
        assert_eq!(c.last_entry_date, Some(day(2024, 3, 5)));
    }

    #[test]
    fn describe_without_entries() {
        let info = describe(&fresh(), day(2024, 3, 10));
        assert_eq!(info.status, StreakStatus::NoEntries);
        assert_eq!(info.current, 0);
        assert_eq!(info.longest, 0);
        assert_eq!(info.message, "Start writing to begin your streak!");
    }

    #[test]
    fn describe_active_today() {
        let today = day(2024, 3, 10);
        let mut c = fresh();
        record_entry(&mut c, today - Duration::days(1));
        record_entry(&mut c, today);
        let info = describe(&c, today);
        assert_eq!(info.status, StreakStatus::ActiveToday);
        assert_eq!(info.current, 2);
        assert_eq!(
            info.message,
            "Great! You've written today. Current streak: 2 days!"
        );
    }

    #[test]
    fn describe_can_extend_yesterdays_run() {
        let today = day(2024, 3, 10);
        let mut c = fresh();
        record_entry(&mut c, today - Duration::days(2));
        record_entry(&mut c, today - Duration::days(1));
        let info = describe(&c, today);
        assert_eq!(info.status, StreakStatus::CanExtend);
        assert_eq!(info.current, 2);
        assert_eq!(info.message, "Write today to extend your 2-day streak!");
    }

    #[test]
    fn describe_broken_reports_days_since() {
        let today = day(2024, 3, 10);
        let mut c = fresh();
        record_entry(&mut c, day(2024, 3, 5));
        let info = describe(&c, today);
        assert_eq!(info.status, StreakStatus::Broken);
        assert_eq!(info.current, 0);
        assert_eq!(info.longest, 1);
        assert_eq!(
            info.message,
            "Your streak ended 5 days ago. Start a new streak today!"
        );
    }

    #[test]
    fn describe_leaves_counters_untouched() {
        let mut c = fresh();
        record_entry(&mut c, day(2024, 3, 9));
        let snapshot = c.clone();
        let _ = describe(&c, day(2024, 3, 10));
        assert_eq!(c, snapshot);
    }

    #[test]
    fn longest_at_least_current_across_random_walk() {
        let mut c = fresh();
        let dates = [
            day(2024, 1, 1),
            day(2024, 1, 2),
            day(2024, 1, 2),
            day(2024, 1, 5),
            day(2024, 1, 6),
            day(2024, 1, 7),
            day(2024, 1, 8),
            day(2024, 1, 3),
            day(2024, 1, 4),
        ];
        for d in dates {
            record_entry(&mut c, d);
            assert!(c.longest_streak >= c.current_streak);
            assert_eq!(c.last_entry_date, Some(d));
        }
    }
}
