//! Canonical textual rendering of a [`CronExpression`] (§4.F).
//!
//! Grounded on this codebase's small `format_rfc3339`/`format_rfc3339_utc`
//! free functions in `tz.rs`: plain string-building, no intermediate
//! formatter state, implemented here as a `Display` impl instead since the
//! output is a single self-contained line.

use std::fmt;

use crate::expression::{
    CronExpression, DAY_OF_MONTH_MASK, DAY_OF_WEEK_MASK, HOUR_MASK, MINUTE_MASK, MONTH_MASK, SECOND_MASK,
};

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_five_field() {
            write!(f, "{} ", render_field(self.second_bits(), SECOND_MASK))?;
        }
        write!(f, "{} ", render_field(self.minute_bits(), MINUTE_MASK))?;
        write!(f, "{} ", render_field(self.hour_bits(), HOUR_MASK))?;
        write!(f, "{} ", render_day_of_month(self))?;
        write!(f, "{} ", render_field(self.month_bits(), MONTH_MASK))?;
        write!(f, "{}", render_day_of_week(self))
    }
}

fn render_field(bits: u64, full_mask: u64) -> String {
    if bits == full_mask {
        return "*".to_string();
    }
    render_bits(bits)
}

fn render_bits(bits: u64) -> String {
    let mut values = Vec::new();
    let mut b = bits;
    while b != 0 {
        let i = b.trailing_zeros();
        values.push(i.to_string());
        b &= b - 1;
    }
    values.join(",")
}

fn render_day_of_month(expr: &CronExpression) -> String {
    let flags = expr.flags();
    let mut out = if flags.day_of_month_last {
        if expr.last_month_offset() > 0 { format!("L-{}", expr.last_month_offset()) } else { "L".to_string() }
    } else {
        render_field(expr.day_of_month_bits(), DAY_OF_MONTH_MASK)
    };
    if flags.nearest_weekday {
        out.push('W');
    }
    out
}

fn render_day_of_week(expr: &CronExpression) -> String {
    let flags = expr.flags();
    // Bit 7 and bit 0 both mean Sunday; canonicalize on bit 0 before rendering.
    let canonical = (expr.day_of_week_bits() & !(1u64 << 7)) | if expr.day_of_week_bits() & (1 << 7) != 0 { 1 } else { 0 };

    let mut out = render_field(canonical, DAY_OF_WEEK_MASK & !(1u64 << 7));
    if flags.day_of_week_last {
        out.push('L');
    } else if flags.nth_day_of_week {
        out.push('#');
        out.push_str(&expr.nth_day_of_week().to_string());
    }
    out
}
