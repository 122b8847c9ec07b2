//! Time-zone adapter.
//!
//! Wraps `chrono_tz::Tz` behind the uniform interface the occurrence finder
//! needs: ambiguous/invalid-time predicates and the handful of DST boundary
//! queries used by the zoned driver. This is the only module allowed to
//! know about host-tz quirks — everything above it sees a clean contract.
//!
//! Generalizes this codebase's `tz.rs` (`parse_tz`, `utc_to_local`,
//! `local_to_utc`), which resolves ambiguity by always taking the earliest
//! instant. The finder needs both endpoints and the boundary between them,
//! so this module exposes them explicitly via [`resolve`].

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::{OffsetComponents, Tz};

use crate::error::{CronError, Result};

/// How a local civil time resolves against a zone's transition history.
#[derive(Debug, Clone, Copy)]
pub enum Resolution {
    /// Exactly one UTC instant corresponds to this local time.
    Single(DateTime<Tz>),
    /// Two UTC instants correspond to this local time (a fall-back overlap).
    /// `daylight` is always the DST-active (earlier) endpoint; `standard` is
    /// the later, non-DST endpoint — regardless of how the host's own
    /// ordering happens to come back.
    Ambiguous { daylight: DateTime<Tz>, standard: DateTime<Tz> },
    /// No UTC instant corresponds to this local time (a spring-forward gap).
    Invalid,
}

/// Parse an IANA timezone name into a [`chrono_tz::Tz`].
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| CronError::argument(format!("unknown time zone '{name}'")))
}

/// Resolve a local civil time in `tz` against its transition history.
pub fn resolve(tz: Tz, local: NaiveDateTime) -> Resolution {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Resolution::Single(dt),
        LocalResult::Ambiguous(a, b) => {
            if a.offset().dst_offset() >= b.offset().dst_offset() {
                Resolution::Ambiguous { daylight: a, standard: b }
            } else {
                Resolution::Ambiguous { daylight: b, standard: a }
            }
        }
        LocalResult::None => Resolution::Invalid,
    }
}

/// True iff `local` occurs twice in `tz` (a fall-back overlap).
///
/// Per contract, the *earlier* wall-clock boundary of an overlap is always
/// the one reported ambiguous; [`resolve`] already normalizes for this by
/// identifying the DST-active endpoint via its offset components rather
/// than by arrival order.
pub fn is_ambiguous_time(tz: Tz, local: NaiveDateTime) -> bool {
    matches!(resolve(tz, local), Resolution::Ambiguous { .. })
}

/// True iff `local` occurs zero times in `tz` (a spring-forward gap).
pub fn is_invalid_time(tz: Tz, local: NaiveDateTime) -> bool {
    matches!(resolve(tz, local), Resolution::Invalid)
}

/// Standard (non-DST) offset applicable at `local`.
///
/// For a plain, unambiguous local time this is just its one offset,
/// whatever it is. For an ambiguous local time, this always returns the
/// later, standard-time endpoint's offset — matching the host tz-database
/// convention of resolving an ambiguous query to standard time.
pub fn get_utc_offset(tz: Tz, local: NaiveDateTime) -> FixedOffset {
    match resolve(tz, local) {
        Resolution::Single(dt) => dt.offset().fix(),
        Resolution::Ambiguous { standard, .. } => standard.offset().fix(),
        Resolution::Invalid => first_valid_on_or_after(tz, local).offset().fix(),
    }
}

/// DST-active offset applicable around `local`.
pub fn get_daylight_offset(tz: Tz, local: NaiveDateTime) -> FixedOffset {
    match resolve(tz, local) {
        Resolution::Single(dt) => dt.offset().fix(),
        Resolution::Ambiguous { daylight, .. } => daylight.offset().fix(),
        Resolution::Invalid => first_valid_on_or_after(tz, local).offset().fix(),
    }
}

/// First valid local instant at or after a spring-forward jump.
pub fn get_daylight_time_start(tz: Tz, invalid_local: NaiveDateTime) -> DateTime<Tz> {
    first_valid_on_or_after(tz, invalid_local)
}

/// The local instant strictly after which clocks in `tz` are unambiguous
/// again: the naive wall-clock value at which the repeated hour ends (e.g.
/// `03:00` for a `02:00`-repeating overlap). Both passes of the repeated
/// hour search up to this same naive bound.
pub fn get_ambiguous_interval_end(tz: Tz, ambiguous_local: NaiveDateTime) -> NaiveDateTime {
    window_end(tz, ambiguous_local)
}

/// The naive upper bound (exclusive) of the ongoing daylight-offset pass —
/// the same instant as [`get_ambiguous_interval_end`], from the early
/// half's point of view.
pub fn get_daylight_time_end(tz: Tz, ambiguous_local: NaiveDateTime) -> NaiveDateTime {
    window_end(tz, ambiguous_local)
}

/// The naive wall-clock value at which the repeated hour *begins* (e.g.
/// `02:00`), from which the standard-offset pass must be re-searched in
/// full — the query's starting instant may be mid-window, but every naive
/// value in the window, re-interpreted under the standard offset, is later
/// in absolute UTC terms than an original daylight-offset query, so the
/// standard pass cannot simply resume from `ambiguous_local`.
pub fn get_standard_time_start(tz: Tz, ambiguous_local: NaiveDateTime) -> NaiveDateTime {
    window_start(tz, ambiguous_local)
}

fn first_valid_on_or_after(tz: Tz, mut local: NaiveDateTime) -> DateTime<Tz> {
    loop {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(a, _) => return a,
            LocalResult::None => local += Duration::minutes(1),
        }
    }
}

fn window_end(tz: Tz, mut local: NaiveDateTime) -> NaiveDateTime {
    loop {
        local += Duration::minutes(1);
        match tz.from_local_datetime(&local) {
            LocalResult::Single(_) => return local,
            LocalResult::Ambiguous(..) => continue,
            LocalResult::None => return local,
        }
    }
}

fn window_start(tz: Tz, mut local: NaiveDateTime) -> NaiveDateTime {
    loop {
        let prev = local - Duration::minutes(1);
        match tz.from_local_datetime(&prev) {
            LocalResult::Ambiguous(..) => local = prev,
            _ => return local,
        }
    }
}
