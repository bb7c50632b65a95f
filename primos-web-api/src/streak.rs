use chrono::{DateTime, NaiveDate, Utc};

/// Streak thresholds (days) and their multipliers, highest first.
const MULTIPLIER_TIERS: [(i32, f64); 4] = [(29, 3.0), (22, 2.5), (15, 2.0), (8, 1.5)];
const BASE_MULTIPLIER: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Same UTC day as the previous check-in.
    AlreadyCheckedIn,
    /// New streak value and whether a previous streak was broken.
    Advance { streak: i32, broken: bool },
}

/// Computes the streak for a check-in at `now` from the stored last check-in.
/// Both instants are compared as UTC calendar days.
pub fn next_streak(
    last_check_in: Option<DateTime<Utc>>,
    current_streak: i32,
    now: DateTime<Utc>,
) -> StreakUpdate {
    let last_check_in = match last_check_in {
        Some(last) => last,
        None => {
            return StreakUpdate::Advance {
                streak: 1,
                broken: false,
            }
        }
    };

    let days = days_between(last_check_in.date_naive(), now.date_naive());
    if days <= 0 {
        // a stored check-in later than today means clock skew; treat it as today
        StreakUpdate::AlreadyCheckedIn
    } else if days == 1 {
        StreakUpdate::Advance {
            streak: current_streak.saturating_add(1),
            broken: false,
        }
    } else {
        StreakUpdate::Advance {
            streak: 1,
            broken: current_streak > 0,
        }
    }
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

pub fn multiplier(streak: i32) -> f64 {
    MULTIPLIER_TIERS
        .iter()
        .find(|(days, _)| streak >= *days)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(BASE_MULTIPLIER)
}

/// `round(base * multiplier)`, halves rounded up. Negative bases earn nothing.
pub fn points_earned(base_points: i64, multiplier: f64) -> i64 {
    if base_points <= 0 {
        return 0;
    }
    (base_points as f64 * multiplier).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn first_check_in_starts_at_one() {
        assert_eq!(
            next_streak(None, 0, at(2025, 3, 1, 10, 0)),
            StreakUpdate::Advance {
                streak: 1,
                broken: false
            }
        );
    }

    #[test]
    fn same_utc_day_is_rejected() {
        let last = at(2025, 3, 1, 0, 5);
        assert_eq!(
            next_streak(Some(last), 4, at(2025, 3, 1, 23, 59)),
            StreakUpdate::AlreadyCheckedIn
        );
    }

    #[test]
    fn next_utc_day_increments_even_minutes_apart() {
        let last = at(2025, 3, 1, 23, 59);
        assert_eq!(
            next_streak(Some(last), 7, at(2025, 3, 2, 0, 1)),
            StreakUpdate::Advance {
                streak: 8,
                broken: false
            }
        );
    }

    #[test]
    fn gap_resets_and_flags_broken_streak() {
        let last = at(2025, 2, 27, 12, 0);
        assert_eq!(
            next_streak(Some(last), 12, at(2025, 3, 1, 12, 0)),
            StreakUpdate::Advance {
                streak: 1,
                broken: true
            }
        );
    }

    #[test]
    fn month_boundary_counts_as_consecutive() {
        let last = at(2024, 2, 29, 18, 0);
        assert_eq!(
            next_streak(Some(last), 1, at(2024, 3, 1, 6, 0)),
            StreakUpdate::Advance {
                streak: 2,
                broken: false
            }
        );
    }

    #[test]
    fn future_last_check_in_is_treated_as_today() {
        let last = at(2025, 3, 2, 1, 0);
        assert_eq!(
            next_streak(Some(last), 3, at(2025, 3, 1, 23, 0)),
            StreakUpdate::AlreadyCheckedIn
        );
    }

    #[test]
    fn multiplier_tiers() {
        assert_eq!(multiplier(0), 1.0);
        assert_eq!(multiplier(7), 1.0);
        assert_eq!(multiplier(8), 1.5);
        assert_eq!(multiplier(14), 1.5);
        assert_eq!(multiplier(15), 2.0);
        assert_eq!(multiplier(22), 2.5);
        assert_eq!(multiplier(28), 2.5);
        assert_eq!(multiplier(29), 3.0);
        assert_eq!(multiplier(365), 3.0);
    }

    #[test]
    fn points_round_half_up() {
        assert_eq!(points_earned(0, 3.0), 0);
        assert_eq!(points_earned(7, 1.5), 11);
        assert_eq!(points_earned(13, 2.5), 33);
        assert_eq!(points_earned(31, 1.0), 31);
        assert_eq!(points_earned(-5, 2.0), 0);
    }
}
