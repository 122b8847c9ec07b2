//! # cronkit
//!
//! A cron expression parser and DST-aware occurrence finder.
//!
//! ## Features
//!
//! - **Standard and extended grammars**: 5-field (`min hour dom month dow`)
//!   and 6-field (`sec min hour dom month dow`) cron text, plus the usual
//!   `@yearly`/`@daily`/... macros.
//! - **Quartz-style extensions**: `L`, `L-n`, `W`, `LW`, `#n`, `dL`, `?`.
//! - **DST-correct occurrence search**: spring-forward gaps snap forward to
//!   the first valid instant; fall-back overlaps are enumerated correctly
//!   for both pointwise and interval expressions.
//! - **IANA timezones**: via `chrono-tz`.
//!
//! ## Example
//!
//! ```rust
//! use cronkit::prelude::*;
//! use chrono::TimeZone;
//!
//! let expr = CronExpression::parse("*/15 * * * *").unwrap();
//! let from = chrono::Utc.with_ymd_and_hms(2020, 5, 10, 12, 7, 0).unwrap();
//!
//! let next = expr.get_next_occurrence(from, chrono_tz::UTC, false).unwrap().unwrap();
//! println!("next occurrence: {next}");
//! ```

pub mod bits;
pub mod calendar;
pub mod error;
pub mod expression;
pub mod finder;
pub mod format;
pub mod parser;
pub mod timezone;

pub use error::{CronError, Result};
pub use expression::{CronExpression, ExpressionFlags};
pub use finder::{get_next_occurrence, get_occurrences, CronOccurrences};
pub use parser::{parse, parse_with_seconds};
pub use timezone::{parse_tz, Resolution};

/// Prelude module for convenient imports.
///
/// ```
/// use cronkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CronError, Result};
    pub use crate::expression::{CronExpression, ExpressionFlags};
    pub use crate::finder::{get_next_occurrence, get_occurrences, CronOccurrences};
    pub use crate::parser::{parse, parse_with_seconds};
    pub use crate::timezone::parse_tz;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn full_workflow_step_minutes() {
        let expr = parser::parse("*/15 * * * *").unwrap();
        let from = chrono::Utc.with_ymd_and_hms(2020, 5, 10, 12, 7, 0).unwrap();
        let next = finder::get_next_occurrence(&expr, from, chrono_tz::UTC, false).unwrap().unwrap();
        assert_eq!(next, chrono::Utc.with_ymd_and_hms(2020, 5, 10, 12, 15, 0).unwrap());
    }

    #[test]
    fn full_workflow_zoned_dst_gap() {
        let expr = parser::parse("0 30 2 * *").unwrap();
        let tz = timezone::parse_tz("Europe/Berlin").unwrap();
        let from = chrono::Utc.with_ymd_and_hms(2026, 3, 28, 12, 0, 0).unwrap();
        let next = finder::get_next_occurrence(&expr, from, tz, false).unwrap().unwrap();
        assert_eq!(next.naive_local().time(), chrono::NaiveTime::from_hms_opt(3, 0, 0).unwrap());
    }

    #[test]
    fn prelude_exports() {
        use crate::prelude::*;

        let expr: CronExpression = "@daily".parse().unwrap();
        assert_eq!(expr, CronExpression::daily());
        let _tz = parse_tz("UTC").unwrap();
    }
}
