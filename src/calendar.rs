//! Gregorian calendar arithmetic.
//!
//! Everything here is pure calendar math with no notion of time zone; the
//! finder calls into this module once it already knows which *local* civil
//! date and time it is asking about. Ticks are counted in 100-nanosecond
//! units since `0001-01-01T00:00:00`, matching the tick unit described in
//! the data model, but the actual Gregorian arithmetic is delegated to
//! `chrono::NaiveDate` rather than reimplemented.

use chrono::{Datelike, NaiveDate};

/// Ticks (100ns units) per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_PER_DAY: i64 = TICKS_PER_SECOND * 24 * 60 * 60;

/// Highest year the finder will ever return or search into.
pub const MAX_YEAR: i32 = 2499;

/// Number of days in `month` of `year`, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let this = NaiveDate::from_ymd_opt(year, month, 1).expect("valid year/month");
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("valid year/month");
    (next - this).num_days() as u32
}

/// Day of week for `(year, month, day)`: Sunday = 0 ... Saturday = 6.
pub fn day_of_week(year: i32, month: u32, day: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date").weekday().num_days_from_sunday()
}

/// Decompose a tick count into its calendar components.
///
/// Returns `(sec, min, hr, day, mon, yr)`.
pub fn fill_date_time_parts(ticks: i64) -> (u32, u32, u32, u32, u32, i32) {
    let days = ticks.div_euclid(TICKS_PER_DAY);
    let time_ticks = ticks.rem_euclid(TICKS_PER_DAY);
    let date = NaiveDate::from_num_days_from_ce_opt((days + 1) as i32).expect("tick in range");
    let total_secs = time_ticks / TICKS_PER_SECOND;
    let sec = (total_secs % 60) as u32;
    let min = (total_secs / 60 % 60) as u32;
    let hr = (total_secs / 3600) as u32;
    (sec, min, hr, date.day(), date.month(), date.year())
}

/// Compose calendar components back into a tick count.
pub fn date_time_to_ticks(year: i32, month: u32, day: u32, hr: u32, min: u32, sec: u32) -> i64 {
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid date");
    let days = (date.num_days_from_ce() - 1) as i64;
    let time_ticks = (hr as i64 * 3600 + min as i64 * 60 + sec as i64) * TICKS_PER_SECOND;
    days * TICKS_PER_DAY + time_ticks
}

/// Realize the `W` (nearest-weekday) modifier for a given day-of-month.
///
/// Never crosses a month boundary: a Saturday on the 1st resolves forward to
/// the 3rd (Monday), and a Sunday on the last day of the month resolves
/// backward to the Friday two days earlier.
pub fn move_to_nearest_week_day(year: i32, month: u32, day: u32) -> u32 {
    match day_of_week(year, month, day) {
        0 => {
            // Sunday -> Monday, unless that would cross into next month.
            if day + 1 > days_in_month(year, month) { day - 2 } else { day + 1 }
        }
        6 => {
            // Saturday -> Friday, unless that would cross into previous month.
            if day <= 1 { day + 2 } else { day - 1 }
        }
        _ => day,
    }
}

/// True iff `day` is the last occurrence of its weekday within the month.
pub fn is_last_day_of_week(year: i32, month: u32, day: u32) -> bool {
    day + 7 > days_in_month(year, month)
}

/// True iff `day` falls in the `n`-th occurrence of its weekday in the month.
pub fn is_nth_day_of_week(day: u32, n: u32) -> bool {
    day.div_ceil(7) == n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29); // divisible by 400
        assert_eq!(days_in_month(1900, 2), 28); // divisible by 100, not 400
        assert_eq!(days_in_month(2499, 2), 28);
    }

    #[test]
    fn days_in_month_december_wraps_year() {
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn day_of_week_known_dates() {
        // 2020-01-01 is a Wednesday.
        assert_eq!(day_of_week(2020, 1, 1), 3);
        // 2024-02-29 is a Thursday.
        assert_eq!(day_of_week(2024, 2, 29), 4);
    }

    #[test]
    fn ticks_round_trip() {
        let ticks = date_time_to_ticks(2020, 5, 10, 12, 7, 30);
        assert_eq!(fill_date_time_parts(ticks), (30, 7, 12, 10, 5, 2020));
    }

    #[test]
    fn ticks_round_trip_far_future() {
        let ticks = date_time_to_ticks(MAX_YEAR, 12, 31, 23, 59, 59);
        assert_eq!(fill_date_time_parts(ticks), (59, 59, 23, 31, 12, MAX_YEAR));
    }

    #[test]
    fn nearest_weekday_unchanged_on_weekday() {
        // 2020-07-15 is a Wednesday.
        assert_eq!(move_to_nearest_week_day(2020, 7, 15), 15);
    }

    #[test]
    fn nearest_weekday_saturday_goes_back() {
        // 2020-08-15 is a Saturday.
        assert_eq!(move_to_nearest_week_day(2020, 8, 15), 14);
    }

    #[test]
    fn nearest_weekday_sunday_goes_forward() {
        // 2020-08-16 is a Sunday.
        assert_eq!(move_to_nearest_week_day(2020, 8, 16), 17);
    }

    #[test]
    fn nearest_weekday_saturday_first_of_month_crosses_backward_so_forward() {
        // 2021-05-01 is a Saturday; day-1 would be April, so jump to Monday the 3rd.
        assert_eq!(move_to_nearest_week_day(2021, 5, 1), 3);
    }

    #[test]
    fn nearest_weekday_sunday_last_of_month_crosses_forward_so_backward() {
        // 2021-02-28 is the last day of February and a Sunday.
        assert_eq!(day_of_week(2021, 2, 28), 0);
        assert_eq!(move_to_nearest_week_day(2021, 2, 28), 26);
    }

    #[test]
    fn last_day_of_week_detection() {
        // 2024-02-29 is the last Thursday of February 2024.
        assert!(is_last_day_of_week(2024, 2, 29));
        assert!(!is_last_day_of_week(2024, 2, 22));
    }

    #[test]
    fn nth_day_of_week_detection() {
        assert!(is_nth_day_of_week(15, 3)); // 15th is the 3rd occurrence of its weekday
        assert!(is_nth_day_of_week(1, 1));
        assert!(is_nth_day_of_week(29, 5));
        assert!(!is_nth_day_of_week(15, 2));
    }
}
