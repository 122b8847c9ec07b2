//! The occurrence finder: backtracking UTC search plus a DST-aware zoned
//! driver around it.
//!
//! Field-by-field advance with wrap-as-carry, cross-checked against the
//! `TimeComponent` carry recursion in `croner-rust`, combined with this
//! codebase's `tz.rs` ambiguous/invalid branching, generalized to expose
//! both fall-back endpoints instead of collapsing to the earliest.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use log::trace;

use crate::bits;
use crate::calendar::{self, MAX_YEAR};
use crate::error::{CronError, Result};
use crate::expression::{CronExpression, DAY_OF_WEEK_MASK};
use crate::timezone::{self, Resolution};

/// Runs the backtracking calendar walk of §4.E.1, optionally bounded above
/// by `end` (inclusive) for the zoned driver's range-limited passes.
fn find_occurrence(expr: &CronExpression, ticks: i64, inclusive: bool, end: Option<i64>) -> Option<i64> {
    let ticks = if inclusive { ticks } else { ticks + 1 };
    if let Some(end) = end {
        if ticks > end {
            return None;
        }
    }

    let (start_sec, start_min, start_hr, start_day, start_mon, start_yr) = calendar::fill_date_time_parts(ticks);
    let (mut sec, mut min, mut hr, mut day, mut mon, mut yr) = (start_sec, start_min, start_hr, start_day, start_mon, start_yr);

    let flags = expr.flags();
    let min_matched_day = if flags.day_of_month_last { 1 } else { bits::first_set(expr.day_of_month_bits()) };

    if !bits::contains(expr.second_bits(), sec) {
        let (found, v) = bits::next(expr.second_bits(), sec);
        sec = v;
        if !found {
            min += 1;
        }
    }
    if !bits::contains(expr.minute_bits(), min) {
        let (found, v) = bits::next(expr.minute_bits(), min);
        min = v;
        if !found {
            hr += 1;
        }
    }
    if !bits::contains(expr.hour_bits(), hr) {
        let (found, v) = bits::next(expr.hour_bits(), hr);
        hr = v;
        if !found {
            day += 1;
        }
    }
    if flags.nearest_weekday {
        day = min_matched_day;
    }

    let mut needs_new_month = false;
    if !flags.day_of_month_last && !bits::contains(expr.day_of_month_bits(), day) {
        let (found, v) = bits::next(expr.day_of_month_bits(), day);
        day = v;
        if !found {
            needs_new_month = true;
        }
    }
    if !bits::contains(expr.month_bits(), mon) {
        needs_new_month = true;
    }

    'months: loop {
        if needs_new_month {
            advance_month(expr, &mut mon, &mut yr)?;
            day = min_matched_day;
            needs_new_month = false;
        }

        'days: loop {
            let last_day_of_month = calendar::days_in_month(yr, mon)
                - if flags.day_of_month_last { expr.last_month_offset() } else { 0 };

            if day > last_day_of_month {
                needs_new_month = true;
                continue 'months;
            }
            if flags.day_of_month_last {
                day = last_day_of_month;
            }
            let last_checked_day = day;
            let candidate_day =
                if flags.nearest_weekday { calendar::move_to_nearest_week_day(yr, mon, day) } else { day };

            if is_day_of_week_match(expr, yr, mon, candidate_day) {
                let (mut hh, mut mm, mut ss) = (hr, min, sec);
                if (yr, mon, candidate_day) > (start_yr, start_mon, start_day) {
                    hh = bits::first_set(expr.hour_bits());
                    mm = bits::first_set(expr.minute_bits());
                    ss = bits::first_set(expr.second_bits());
                } else if hh > start_hr {
                    mm = bits::first_set(expr.minute_bits());
                    ss = bits::first_set(expr.second_bits());
                } else if mm > start_min {
                    ss = bits::first_set(expr.second_bits());
                }
                let found = calendar::date_time_to_ticks(yr, mon, candidate_day, hh, mm, ss);
                if found >= ticks {
                    if let Some(end) = end {
                        if found > end {
                            return None;
                        }
                    }
                    return Some(found);
                }
            }

            day = last_checked_day;
            if flags.day_of_month_last {
                needs_new_month = true;
                continue 'months;
            }
            let (found, v) = bits::next(expr.day_of_month_bits(), day);
            day = v;
            if !found {
                needs_new_month = true;
                continue 'months;
            }
        }
    }
}

fn advance_month(expr: &CronExpression, mon: &mut u32, yr: &mut i32) -> Option<()> {
    let (found, v) = bits::next(expr.month_bits(), *mon);
    *mon = v;
    if !found {
        *yr += 1;
        if *yr > MAX_YEAR {
            trace!("occurrence search exhausted years through {MAX_YEAR}");
            return None;
        }
    }
    Some(())
}

fn is_day_of_week_match(expr: &CronExpression, yr: i32, mon: u32, day: u32) -> bool {
    let flags = expr.flags();
    let weekday = calendar::day_of_week(yr, mon, day);
    if flags.day_of_week_last {
        return calendar::is_last_day_of_week(yr, mon, day) && weekday_bit_matches(expr.day_of_week_bits(), weekday);
    }
    if flags.nth_day_of_week {
        return calendar::is_nth_day_of_week(day, expr.nth_day_of_week())
            && weekday_bit_matches(expr.day_of_week_bits(), weekday);
    }
    if expr.day_of_week_bits() == DAY_OF_WEEK_MASK {
        return true;
    }
    weekday_bit_matches(expr.day_of_week_bits(), weekday)
}

fn weekday_bit_matches(bits: u64, weekday: u32) -> bool {
    bits::contains(bits, weekday) || (weekday == 0 && bits::contains(bits, 7))
}

fn naive_to_ticks(dt: NaiveDateTime) -> i64 {
    calendar::date_time_to_ticks(dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second())
}

fn ticks_to_naive(ticks: i64) -> NaiveDateTime {
    let (sec, min, hr, day, mon, yr) = calendar::fill_date_time_parts(ticks);
    NaiveDate::from_ymd_opt(yr, mon, day).expect("tick in range").and_hms_opt(hr, min, sec).expect("valid time")
}

fn utc_to_ticks(dt: DateTime<Utc>) -> i64 {
    naive_to_ticks(dt.naive_utc())
}

fn ticks_to_utc(ticks: i64) -> DateTime<Utc> {
    Utc.from_utc_datetime(&ticks_to_naive(ticks))
}

fn build_zoned(tz: Tz, naive_local: NaiveDateTime, offset: FixedOffset) -> DateTime<Tz> {
    let utc_naive = naive_local - Duration::seconds(offset.local_minus_utc() as i64);
    tz.from_utc_datetime(&utc_naive)
}

fn normalize_sub_second(from: DateTime<Utc>, inclusive: bool) -> (DateTime<Utc>, bool) {
    if from.timestamp_subsec_nanos() != 0 {
        let floored = Utc.timestamp_opt(from.timestamp(), 0).single().expect("valid floored instant");
        (floored, false)
    } else {
        (from, inclusive)
    }
}

/// The DST-aware zoned driver of §4.E.2, returning the next occurrence in
/// `tz` without validating its inputs.
fn next_occurrence_in_zone(expr: &CronExpression, from: DateTime<Utc>, tz: Tz, inclusive: bool) -> Option<DateTime<Tz>> {
    let (from, inclusive) = normalize_sub_second(from, inclusive);

    if tz == Tz::UTC {
        let ticks = utc_to_ticks(from);
        let found = find_occurrence(expr, ticks, inclusive, None)?;
        return Some(ticks_to_utc(found).with_timezone(&tz));
    }

    let mut from_local = from.with_timezone(&tz).naive_local();
    let mut inclusive = inclusive;

    if let Resolution::Ambiguous { .. } = timezone::resolve(tz, from_local) {
        let current_offset = from.with_timezone(&tz).offset().fix();
        let standard_offset = timezone::get_utc_offset(tz, from_local);

        if current_offset != standard_offset {
            let daylight_end = timezone::get_daylight_time_end(tz, from_local);
            let start_ticks = naive_to_ticks(from_local);
            let end_ticks = naive_to_ticks(daylight_end) - 1;
            if let Some(found) = find_occurrence(expr, start_ticks, inclusive, Some(end_ticks)) {
                trace!("matched in the daylight half of a fall-back overlap");
                let offset = timezone::get_daylight_offset(tz, from_local);
                return Some(build_zoned(tz, ticks_to_naive(found), offset));
            }
            from_local = timezone::get_standard_time_start(tz, from_local);
            inclusive = true;
        }

        let ambiguous_end = timezone::get_ambiguous_interval_end(tz, from_local);
        if expr.has_interval() {
            let start_ticks = naive_to_ticks(from_local);
            let end_ticks = naive_to_ticks(ambiguous_end) - 1;
            if let Some(found) = find_occurrence(expr, start_ticks, inclusive, Some(end_ticks)) {
                trace!("matched in the standard half of a fall-back overlap");
                let offset = timezone::get_utc_offset(tz, from_local);
                return Some(build_zoned(tz, ticks_to_naive(found), offset));
            }
        }
        from_local = ambiguous_end;
        inclusive = true;
    }

    let ticks = naive_to_ticks(from_local);
    let found = find_occurrence(expr, ticks, inclusive, None)?;
    let naive = ticks_to_naive(found);

    match timezone::resolve(tz, naive) {
        Resolution::Invalid => {
            trace!("result falls in a spring-forward gap, snapping forward");
            Some(timezone::get_daylight_time_start(tz, naive))
        }
        Resolution::Ambiguous { daylight, .. } => Some(daylight),
        Resolution::Single(dt) => Some(dt),
    }
}

fn validate_year(label: &str, instant: DateTime<Utc>) -> Result<()> {
    if instant.year() > MAX_YEAR {
        return Err(CronError::argument(format!("{label} year {} exceeds the maximum of {MAX_YEAR}", instant.year())));
    }
    Ok(())
}

/// Single next match of `expr` at or after `from`, expressed in `tz`.
///
/// Returns `Ok(None)` when no occurrence exists before year 2499 — this is
/// not an error (§7). Returns `Err` only for invalid arguments.
pub fn get_next_occurrence(
    expr: &CronExpression,
    from: DateTime<Utc>,
    tz: Tz,
    inclusive: bool,
) -> Result<Option<DateTime<Tz>>> {
    validate_year("from", from)?;
    Ok(next_occurrence_in_zone(expr, from, tz, inclusive))
}

/// Lazy ascending sequence of occurrences in `[from, to)` (or closed/open
/// per `from_inclusive`/`to_inclusive`), expressed in `tz`.
pub fn get_occurrences(
    expr: &CronExpression,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    tz: Tz,
    from_inclusive: bool,
    to_inclusive: bool,
) -> Result<CronOccurrences<'_>> {
    if from > to {
        return Err(CronError::argument("from must not be after to"));
    }
    validate_year("from", from)?;
    validate_year("to", to)?;
    Ok(CronOccurrences {
        expr,
        tz,
        to,
        to_inclusive,
        cursor: Some(from),
        first: true,
        from_inclusive,
    })
}

/// A lazy, restartable sequence of occurrences, produced by repeatedly
/// re-invoking [`get_next_occurrence`] with `inclusive = false` after the
/// first step. Allocates nothing beyond the cursor itself.
pub struct CronOccurrences<'a> {
    expr: &'a CronExpression,
    tz: Tz,
    to: DateTime<Utc>,
    to_inclusive: bool,
    cursor: Option<DateTime<Utc>>,
    first: bool,
    from_inclusive: bool,
}

impl<'a> Iterator for CronOccurrences<'a> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        let inclusive = if self.first { self.from_inclusive } else { false };
        self.first = false;

        let found = next_occurrence_in_zone(self.expr, cursor, self.tz, inclusive)?;
        let found_utc = found.with_timezone(&Utc);

        let in_range = if self.to_inclusive { found_utc <= self.to } else { found_utc < self.to };
        if !in_range {
            return None;
        }

        self.cursor = Some(found_utc);
        Some(found)
    }
}
