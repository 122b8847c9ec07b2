//! The parsed cron expression data model.
//!
//! Mirrors this codebase's small, `Copy`, `Serialize`-able model types:
//! plain structs and enums, no interior mutability, structural equality.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::bits;
use crate::error::Result;
use crate::finder::{self, CronOccurrences};
use crate::parser;

/// Full-range bitmasks for each field.
pub const SECOND_MASK: u64 = bits::range_mask(0, 59);
pub const MINUTE_MASK: u64 = bits::range_mask(0, 59);
pub const HOUR_MASK: u64 = bits::range_mask(0, 23);
pub const DAY_OF_MONTH_MASK: u64 = bits::range_mask(1, 31);
pub const MONTH_MASK: u64 = bits::range_mask(1, 12);
/// Day-of-week mask spans bits 0..=7: 0 and 7 both denote Sunday.
pub const DAY_OF_WEEK_MASK: u64 = bits::range_mask(0, 7);

/// Sentinel second bitmap for the 5-field (no-seconds) grammar: "bit 0 only".
pub const SECOND_SENTINEL: u64 = 1;

/// The irregular day-of-month/day-of-week extensions a [`CronExpression`]
/// may carry. At most one of the day-of-month extensions and one of the
/// day-of-week extensions is ever set, per the data model's invariants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpressionFlags {
    /// Day-of-month field means "the last day of the month" (`L`/`L-n`).
    pub day_of_month_last: bool,
    /// Day-of-week field means "the last such weekday in the month" (`dL`).
    pub day_of_week_last: bool,
    /// Day-of-week field means "the n-th such weekday in the month" (`d#n`).
    pub nth_day_of_week: bool,
    /// Day-of-month field means "nearest weekday to this day" (`dW`).
    pub nearest_weekday: bool,
    /// At least one sub-hour field (second or minute) matches more than one
    /// value. Used only to decide whether the zoned driver needs to search
    /// the standard-offset half of a fall-back overlap in addition to the
    /// daylight-offset half; see [`CronExpression::has_interval`].
    pub interval: bool,
}

/// A fully parsed, immutable cron expression.
///
/// Every field bitmap is guaranteed non-empty (invariant 1 of the data
/// model). Equality and hashing are structural over every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CronExpression {
    pub(crate) second: u64,
    pub(crate) minute: u64,
    pub(crate) hour: u64,
    pub(crate) day_of_month: u64,
    pub(crate) month: u64,
    pub(crate) day_of_week: u64,
    /// 1..=5, meaningful only when `flags.nth_day_of_week` is set.
    pub(crate) nth_day_of_week: u32,
    /// Days before the last day of the month, meaningful only when
    /// `flags.day_of_month_last` is set.
    pub(crate) last_month_offset: u32,
    pub(crate) flags: ExpressionFlags,
}

impl CronExpression {
    /// Second bitmap. Equal to [`SECOND_SENTINEL`] for 5-field expressions.
    pub fn second_bits(&self) -> u64 {
        self.second
    }

    pub fn minute_bits(&self) -> u64 {
        self.minute
    }

    pub fn hour_bits(&self) -> u64 {
        self.hour
    }

    pub fn day_of_month_bits(&self) -> u64 {
        self.day_of_month
    }

    pub fn month_bits(&self) -> u64 {
        self.month
    }

    pub fn day_of_week_bits(&self) -> u64 {
        self.day_of_week
    }

    pub fn flags(&self) -> ExpressionFlags {
        self.flags
    }

    /// The n-th-weekday ordinal (1..=5), meaningful only when
    /// `flags().nth_day_of_week` is set.
    pub fn nth_day_of_week(&self) -> u32 {
        self.nth_day_of_week
    }

    /// Days before the last day of the month, meaningful only when
    /// `flags().day_of_month_last` is set.
    pub fn last_month_offset(&self) -> u32 {
        self.last_month_offset
    }

    /// True when the expression's seconds field is the 5-field sentinel
    /// (seconds implicitly fixed at `:00`), i.e. it was written without an
    /// explicit seconds column.
    pub fn is_five_field(&self) -> bool {
        self.second == SECOND_SENTINEL
    }

    /// Whether the zoned driver must search both halves of a fall-back
    /// overlap, per [`ExpressionFlags::interval`].
    pub fn has_interval(&self) -> bool {
        self.flags.interval
    }

    pub(crate) fn new(
        second: u64,
        minute: u64,
        hour: u64,
        day_of_month: u64,
        month: u64,
        day_of_week: u64,
        nth_day_of_week: u32,
        last_month_offset: u32,
        mut flags: ExpressionFlags,
    ) -> Self {
        flags.interval = second.count_ones() > 1 || minute.count_ones() > 1;
        CronExpression {
            second,
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
            nth_day_of_week,
            last_month_offset,
            flags,
        }
    }

    /// `0 0 1 1 *`: once a year, at midnight on January 1st.
    pub fn yearly() -> Self {
        Self::new(
            SECOND_SENTINEL,
            1,
            1,
            1 << 1,
            1 << 1,
            DAY_OF_WEEK_MASK,
            0,
            0,
            ExpressionFlags::default(),
        )
    }

    /// `0 0 * * 0`: once a week, at midnight on Sunday.
    pub fn weekly() -> Self {
        Self::new(
            SECOND_SENTINEL,
            1,
            1,
            DAY_OF_MONTH_MASK,
            MONTH_MASK,
            1, // bit 0: Sunday
            0,
            0,
            ExpressionFlags::default(),
        )
    }

    /// `0 0 1 * *`: once a month, at midnight on the 1st.
    pub fn monthly() -> Self {
        Self::new(
            SECOND_SENTINEL,
            1,
            1,
            1 << 1,
            MONTH_MASK,
            DAY_OF_WEEK_MASK,
            0,
            0,
            ExpressionFlags::default(),
        )
    }

    /// `0 0 * * *`: once a day, at midnight.
    pub fn daily() -> Self {
        Self::new(
            SECOND_SENTINEL,
            1,
            1,
            DAY_OF_MONTH_MASK,
            MONTH_MASK,
            DAY_OF_WEEK_MASK,
            0,
            0,
            ExpressionFlags::default(),
        )
    }

    /// `0 * * * *`: once an hour, on the hour.
    pub fn hourly() -> Self {
        Self::new(
            SECOND_SENTINEL,
            1,
            HOUR_MASK,
            DAY_OF_MONTH_MASK,
            MONTH_MASK,
            DAY_OF_WEEK_MASK,
            0,
            0,
            ExpressionFlags::default(),
        )
    }

    /// `* * * * *`: once a minute.
    pub fn every_minute() -> Self {
        Self::new(
            SECOND_SENTINEL,
            MINUTE_MASK,
            HOUR_MASK,
            DAY_OF_MONTH_MASK,
            MONTH_MASK,
            DAY_OF_WEEK_MASK,
            0,
            0,
            ExpressionFlags::default(),
        )
    }

    /// `* * * * * *`: once a second.
    pub fn every_second() -> Self {
        Self::new(
            SECOND_MASK,
            MINUTE_MASK,
            HOUR_MASK,
            DAY_OF_MONTH_MASK,
            MONTH_MASK,
            DAY_OF_WEEK_MASK,
            0,
            0,
            ExpressionFlags::default(),
        )
    }

    /// Parses a 5-field (or macro) cron expression. See [`parser::parse`].
    pub fn parse(input: &str) -> Result<Self> {
        parser::parse(input)
    }

    /// Like [`CronExpression::parse`], but collapses any parse error to
    /// `false` instead of returning it.
    pub fn try_parse(input: &str) -> bool {
        parser::parse(input).is_ok()
    }

    /// Single next match at or after `from`, expressed in `tz`. See
    /// [`finder::get_next_occurrence`].
    pub fn get_next_occurrence(&self, from: DateTime<Utc>, tz: Tz, inclusive: bool) -> Result<Option<DateTime<Tz>>> {
        finder::get_next_occurrence(self, from, tz, inclusive)
    }

    /// Lazy ascending sequence of occurrences in `[from, to)`, expressed in
    /// `tz`. See [`finder::get_occurrences`].
    pub fn get_occurrences(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        tz: Tz,
        from_inclusive: bool,
        to_inclusive: bool,
    ) -> Result<CronOccurrences<'_>> {
        finder::get_occurrences(self, from, to, tz, from_inclusive, to_inclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_field_builtins_use_second_sentinel() {
        assert!(CronExpression::daily().is_five_field());
        assert!(!CronExpression::every_second().is_five_field());
    }

    #[test]
    fn builtins_are_never_interval() {
        // None of these repeat within a single calendar minute, so none of
        // them need the fall-back overlap's second pass.
        for expr in [
            CronExpression::yearly(),
            CronExpression::weekly(),
            CronExpression::monthly(),
            CronExpression::daily(),
            CronExpression::hourly(),
        ] {
            assert!(!expr.has_interval());
        }
    }

    #[test]
    fn every_minute_and_every_second_are_interval() {
        assert!(CronExpression::every_minute().has_interval());
        assert!(CronExpression::every_second().has_interval());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(CronExpression::daily(), CronExpression::daily());
        assert_ne!(CronExpression::daily(), CronExpression::hourly());
    }

    #[test]
    fn serde_round_trip() {
        let expr = CronExpression::monthly();
        let json = serde_json::to_string(&expr).unwrap();
        let back: CronExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, back);
    }

    #[test]
    fn inherent_parse_matches_free_function() {
        assert_eq!(CronExpression::parse("@daily").unwrap(), CronExpression::daily());
        assert!(CronExpression::try_parse("@daily"));
        assert!(!CronExpression::try_parse("not a cron expression"));
    }

    #[test]
    fn inherent_occurrence_methods_delegate_to_finder() {
        use chrono::TimeZone;

        let expr = CronExpression::every_minute();
        let from = chrono::Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let next = expr.get_next_occurrence(from, chrono_tz::UTC, false).unwrap().unwrap();
        assert_eq!(next, chrono::Utc.with_ymd_and_hms(2020, 1, 1, 0, 1, 0).unwrap());

        let to = chrono::Utc.with_ymd_and_hms(2020, 1, 1, 0, 3, 0).unwrap();
        let occurrences: Vec<_> = expr.get_occurrences(from, to, chrono_tz::UTC, true, false).unwrap().collect();
        assert_eq!(occurrences.len(), 3);
    }
}
