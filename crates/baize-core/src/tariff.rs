//! # Tariff Resolver
//!
//! Computes what a table session costs by walking the play interval minute
//! by minute and charging each minute at whichever rate window is in effect.
//!
//! ## Resolution Per Minute
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Minute-by-Minute Rate Resolution                        │
//! │                                                                         │
//! │  Session: Friday 23:30 ──────────────────────────► Saturday 01:30      │
//! │                                                                         │
//! │  Catalog (priority desc, id asc):                                      │
//! │    #2  Fri  22:00-02:00  $90/h   (overnight: start > end)              │
//! │    #1  any  (all day)    $60/h                                         │
//! │                                                                         │
//! │  Friday 23:30-23:59   → #2 same-day branch   (23:30 >= 22:00)          │
//! │  Saturday 00:00-01:29 → #2 carry branch      (yesterday=Fri, <=02:00)  │
//! │                                                                         │
//! │  Each matched minute adds price_per_hour / 60 to the running total.    │
//! │  A minute no window covers falls back to the session's frozen rate,    │
//! │  then to zero. The resolver never fails.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Granularity
//! One minute is the club's actual billing resolution. Walking the interval
//! is O(minutes), which is fine for sessions bounded in hours; it handles
//! every window-boundary and midnight-wrap case a closed-form interval
//! computation would have to special-case.
//!
//! Pure computation: no shared state, no locking, safe to call concurrently.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::types::RateWindow;

/// Minutes billed for the half-open interval `[start_at, end_at)`.
///
/// One minute instant is billed for each whole or started minute of play;
/// `end_at <= start_at` bills nothing.
pub fn billable_minutes(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> i64 {
    if end_at <= start_at {
        return 0;
    }
    let millis = (end_at - start_at).num_milliseconds();
    (millis + 59_999) / 60_000
}

/// Total cost of a session over `[start_at, end_at)`.
///
/// For every minute instant, the highest-priority active window in effect
/// supplies the rate (ties go to the lowest window id); minutes nothing
/// covers fall back to `fallback_rate_per_hour` (the session's frozen
/// rate), then to zero. Returns `0.0` for zero or negative durations.
///
/// The windows slice does not need to be pre-sorted; the resolver orders
/// it internally so callers cannot break the tie-break rules.
pub fn calculate_session_cost(
    windows: &[RateWindow],
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    fallback_rate_per_hour: Option<f64>,
) -> f64 {
    if end_at <= start_at {
        return 0.0;
    }

    let ordered = ordered_windows(windows);
    let fallback = fallback_rate_per_hour.unwrap_or(0.0);

    let mut total = 0.0;
    let mut t = start_at;
    while t < end_at {
        let rate = rate_for_minute(&ordered, t).unwrap_or(fallback);
        total += rate / 60.0;
        t += Duration::minutes(1);
    }
    total
}

/// The rate in effect at a single instant, if any window covers it.
///
/// Used for point-in-time price display on an open session; `None` means
/// the caller should fall back to the session's frozen rate.
pub fn resolve_rate_at(windows: &[RateWindow], at: DateTime<Utc>) -> Option<f64> {
    rate_for_minute(&ordered_windows(windows), at)
}

// =============================================================================
// Matching Internals
// =============================================================================

/// Active windows in evaluation order: priority descending, then id
/// ascending (first-created wins among equal priority). Stable order, so
/// `rate_for_minute` can return on first match.
fn ordered_windows(windows: &[RateWindow]) -> Vec<&RateWindow> {
    let mut ordered: Vec<&RateWindow> = windows.iter().filter(|w| w.active).collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
    ordered
}

fn rate_for_minute(ordered: &[&RateWindow], at: DateTime<Utc>) -> Option<f64> {
    let day = at.weekday().num_days_from_sunday() as u8;
    let yesterday = (day + 6) % 7;
    let time_of_day = at.time();

    for window in ordered {
        if matches_same_day(window, day, time_of_day)
            || matches_overnight_carry(window, yesterday, time_of_day)
        {
            return Some(window.price_per_hour);
        }
    }
    None
}

/// The window applies today and the instant falls inside its range.
///
/// For an overnight window (`start > end`) this covers the evening leg:
/// any instant at or after `start` on the window's own day. A window with
/// `start == end` is a same-day window that matches only that exact
/// minute boundary - an accepted catalog quirk, kept as-is.
fn matches_same_day(window: &RateWindow, day: u8, time_of_day: NaiveTime) -> bool {
    if !window.days.contains_day(day) {
        return false;
    }
    match window.bounds() {
        None => true,
        Some((start, end)) if start <= end => start <= time_of_day && time_of_day <= end,
        Some((start, _)) => time_of_day >= start,
    }
}

/// The window applied *yesterday* and spans midnight; the instant falls in
/// the morning tail (`<= end`).
fn matches_overnight_carry(window: &RateWindow, yesterday: u8, time_of_day: NaiveTime) -> bool {
    if !window.days.contains_day(yesterday) || !window.is_overnight() {
        return false;
    }
    match window.bounds() {
        Some((_, end)) => time_of_day <= end,
        None => false,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DaySet;
    use chrono::TimeZone;

    const FRIDAY: u8 = 5;
    const SATURDAY: u8 = 6;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn window(
        id: i64,
        price_per_hour: f64,
        days: DaySet,
        bounds: Option<(&str, &str)>,
        priority: i64,
    ) -> RateWindow {
        RateWindow {
            id,
            table_type_id: "pool".to_string(),
            price_per_hour,
            days,
            start_time: bounds.map(|(s, _)| time(s)),
            end_time: bounds.map(|(_, e)| time(e)),
            priority,
            active: true,
            created_at: at(2024, 1, 1, 0, 0),
            updated_at: at(2024, 1, 1, 0, 0),
        }
    }

    #[test]
    fn test_zero_and_negative_duration_cost_nothing() {
        let windows = vec![window(1, 60.0, DaySet::ALL, None, 0)];
        let start = at(2024, 3, 8, 12, 0);

        assert_eq!(calculate_session_cost(&windows, start, start, Some(60.0)), 0.0);
        assert_eq!(
            calculate_session_cost(&windows, start, start - Duration::hours(1), Some(60.0)),
            0.0
        );
        assert_eq!(billable_minutes(start, start), 0);
        assert_eq!(billable_minutes(start, start - Duration::minutes(5)), 0);
    }

    #[test]
    fn test_single_all_day_window_prices_by_the_minute() {
        let windows = vec![window(1, 60.0, DaySet::ALL, None, 0)];
        // 2024-03-08 is a Friday
        let start = at(2024, 3, 8, 12, 0);
        let end = at(2024, 3, 8, 13, 30);

        let cost = calculate_session_cost(&windows, start, end, None);
        assert!((cost - 90.0).abs() < 1e-9); // 90 min at $1/min
    }

    #[test]
    fn test_fractional_hour_rate() {
        let windows = vec![window(1, 45.0, DaySet::ALL, None, 0)];
        let start = at(2024, 3, 8, 10, 0);
        let end = at(2024, 3, 8, 11, 20); // 80 minutes

        let cost = calculate_session_cost(&windows, start, end, None);
        assert!((cost - 45.0 * 80.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_overnight_window_covers_both_legs() {
        // Friday 22:00-02:00 at $90/h, nothing else in the catalog.
        let windows = vec![window(
            1,
            90.0,
            DaySet::from_days(&[FRIDAY]),
            Some(("22:00", "02:00")),
            0,
        )];

        // Friday 23:30 -> Saturday 01:30: 30 same-day minutes + 90 carry
        // minutes, all inside the window.
        let start = at(2024, 3, 8, 23, 30);
        let end = at(2024, 3, 9, 1, 30);

        let cost = calculate_session_cost(&windows, start, end, Some(0.0));
        assert!((cost - 180.0).abs() < 1e-9); // 2h at $90/h
        assert_eq!(billable_minutes(start, end), 120);
    }

    #[test]
    fn test_overnight_carry_without_same_day_leg() {
        // Session entirely inside Saturday morning; the only window is
        // Friday's overnight one, reached via the carry branch.
        let windows = vec![window(
            1,
            90.0,
            DaySet::from_days(&[FRIDAY]),
            Some(("22:00", "02:00")),
            0,
        )];
        let start = at(2024, 3, 9, 0, 30);
        let end = at(2024, 3, 9, 1, 30);

        let cost = calculate_session_cost(&windows, start, end, Some(0.0));
        assert!((cost - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_overnight_carry_stops_at_end_time() {
        // Saturday 01:30 -> 03:00 against Friday's 22:00-02:00 window:
        // minutes 01:30..=02:00 (31) carry at $60/h, the remaining 59
        // fall back to the frozen rate of $12/h.
        let windows = vec![window(
            1,
            60.0,
            DaySet::from_days(&[FRIDAY]),
            Some(("22:00", "02:00")),
            0,
        )];
        let start = at(2024, 3, 9, 1, 30);
        let end = at(2024, 3, 9, 3, 0);

        let cost = calculate_session_cost(&windows, start, end, Some(12.0));
        let expected = 31.0 * 60.0 / 60.0 + 59.0 * 12.0 / 60.0;
        assert!((cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_overnight_across_week_boundary() {
        // Saturday-only overnight window; Sunday morning minutes match via
        // the carry branch with yesterday = Saturday.
        let windows = vec![window(
            1,
            80.0,
            DaySet::from_days(&[SATURDAY]),
            Some(("23:00", "01:00")),
            0,
        )];
        // 2024-03-09 is a Saturday
        let start = at(2024, 3, 9, 23, 30);
        let end = at(2024, 3, 10, 0, 30);

        let cost = calculate_session_cost(&windows, start, end, Some(0.0));
        assert!((cost - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_higher_priority_wins_regardless_of_declaration_order() {
        let base = window(1, 50.0, DaySet::ALL, None, 0);
        let evening = window(2, 100.0, DaySet::ALL, Some(("18:00", "23:00")), 10);

        let start = at(2024, 3, 8, 19, 0);
        let end = at(2024, 3, 8, 20, 0);

        for windows in [
            vec![base.clone(), evening.clone()],
            vec![evening.clone(), base.clone()],
        ] {
            let cost = calculate_session_cost(&windows, start, end, None);
            assert!((cost - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_equal_priority_tie_breaks_on_lowest_id() {
        let first = window(3, 40.0, DaySet::ALL, None, 5);
        let second = window(7, 70.0, DaySet::ALL, None, 5);

        let start = at(2024, 3, 8, 12, 0);
        let end = at(2024, 3, 8, 13, 0);

        // Lowest id wins no matter the slice order.
        for windows in [
            vec![first.clone(), second.clone()],
            vec![second.clone(), first.clone()],
        ] {
            let cost = calculate_session_cost(&windows, start, end, None);
            assert!((cost - 40.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_day_filter_misses_fall_back_to_frozen_rate() {
        // Monday-only window; Friday session sees only the fallback.
        let windows = vec![window(1, 100.0, DaySet::from_days(&[1]), None, 0)];
        let start = at(2024, 3, 8, 12, 0);
        let end = at(2024, 3, 8, 13, 0);

        let cost = calculate_session_cost(&windows, start, end, Some(30.0));
        assert!((cost - 30.0).abs() < 1e-9);

        // No fallback either: zero, never an error.
        assert_eq!(calculate_session_cost(&windows, start, end, None), 0.0);
    }

    #[test]
    fn test_inactive_windows_are_ignored() {
        let mut w = window(1, 100.0, DaySet::ALL, None, 0);
        w.active = false;

        let start = at(2024, 3, 8, 12, 0);
        let end = at(2024, 3, 8, 13, 0);

        assert_eq!(calculate_session_cost(&[w], start, end, None), 0.0);
    }

    #[test]
    fn test_start_equals_end_matches_only_the_boundary_minute() {
        // 10:00-10:00 is a same-day window covering exactly one instant.
        let windows = vec![window(1, 120.0, DaySet::ALL, Some(("10:00", "10:00")), 0)];

        let start = at(2024, 3, 8, 9, 58);
        let end = at(2024, 3, 8, 10, 3);

        // 5 minutes walked; only the 10:00 instant hits the window.
        let cost = calculate_session_cost(&windows, start, end, Some(60.0));
        let expected = 1.0 * 120.0 / 60.0 + 4.0 * 60.0 / 60.0;
        assert!((cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_rate_at_point_in_time() {
        let windows = vec![
            window(1, 50.0, DaySet::ALL, None, 0),
            window(2, 100.0, DaySet::ALL, Some(("18:00", "23:00")), 10),
        ];

        assert_eq!(resolve_rate_at(&windows, at(2024, 3, 8, 12, 0)), Some(50.0));
        assert_eq!(resolve_rate_at(&windows, at(2024, 3, 8, 19, 0)), Some(100.0));

        let monday_only = vec![window(1, 50.0, DaySet::from_days(&[1]), None, 0)];
        assert_eq!(resolve_rate_at(&monday_only, at(2024, 3, 8, 12, 0)), None);
    }

    #[test]
    fn test_billable_minutes_rounds_started_minutes_up() {
        let start = at(2024, 3, 8, 12, 0);
        assert_eq!(billable_minutes(start, start + Duration::seconds(90)), 2);
        assert_eq!(billable_minutes(start, start + Duration::minutes(60)), 60);
        assert_eq!(billable_minutes(start, start + Duration::seconds(1)), 1);
    }

    #[test]
    fn test_cost_walk_agrees_with_billable_minutes() {
        // Sub-minute tails: the walk and the closed-form count must agree.
        let windows = vec![window(1, 60.0, DaySet::ALL, None, 0)];
        let start = at(2024, 3, 8, 12, 0);
        let end = start + Duration::seconds(150); // 2.5 minutes -> 3 billed

        let cost = calculate_session_cost(&windows, start, end, None);
        let minutes = billable_minutes(start, end);
        assert_eq!(minutes, 3);
        assert!((cost - minutes as f64 * 60.0 / 60.0).abs() < 1e-9);
    }
}
