//! Cron expression text parser.
//!
//! Converts cron text into a [`CronExpression`]. Error style (trim input,
//! map failures to a structured error variant with field context) follows
//! this codebase's `parse_epoch_ms`, generalized from a single epoch-millis
//! parser to six independent field grammars, plus the day-of-month/
//! day-of-week extension shapes (`L`, `W`, `#n`) common to cron parsers.

use std::str::FromStr;

use crate::error::{CronError, Result};
use crate::expression::{CronExpression, ExpressionFlags, DAY_OF_MONTH_MASK, DAY_OF_WEEK_MASK, SECOND_SENTINEL};

const MONTH_NAMES: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const DAY_NAMES: [(&str, u32); 7] =
    [("sun", 0), ("mon", 1), ("tue", 2), ("wed", 3), ("thu", 4), ("fri", 5), ("sat", 6)];

/// Parse a 5-field (`min hour dom month dow`) cron expression, or an
/// `@...` macro.
pub fn parse(input: &str) -> Result<CronExpression> {
    parse_fields(input, false)
}

/// Parse a 6-field (`sec min hour dom month dow`) cron expression, or an
/// `@...` macro.
pub fn parse_with_seconds(input: &str) -> Result<CronExpression> {
    parse_fields(input, true)
}

impl FromStr for CronExpression {
    type Err = CronError;

    /// Parses the 5-field grammar. Use [`parse_with_seconds`] for the
    /// 6-field form.
    fn from_str(input: &str) -> Result<Self> {
        parse(input)
    }
}

fn parse_fields(input: &str, include_seconds: bool) -> Result<CronExpression> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CronError::parse("expression", "empty input", 0));
    }
    if trimmed.starts_with('@') {
        return expand_macro(trimmed);
    }

    let expected = if include_seconds { 6 } else { 5 };
    let fields = split_fields(input);
    if fields.len() != expected {
        return Err(CronError::parse(
            "expression",
            format!("expected {expected} whitespace-separated fields, found {}", fields.len()),
            fields.first().map(|(p, _)| *p).unwrap_or(0),
        ));
    }

    let mut fields = fields.into_iter();
    let second = if include_seconds {
        let (pos, text) = fields.next().unwrap();
        parse_field(text, pos, "second", 0, 59, &[])?
    } else {
        SECOND_SENTINEL
    };

    let (pos, text) = fields.next().unwrap();
    let minute = parse_field(text, pos, "minute", 0, 59, &[])?;
    let (pos, text) = fields.next().unwrap();
    let hour = parse_field(text, pos, "hour", 0, 23, &[])?;
    let (pos, text) = fields.next().unwrap();
    let dom = parse_day_of_month_field(text, pos)?;
    let (pos, text) = fields.next().unwrap();
    let month = parse_field(text, pos, "month", 1, 12, &MONTH_NAMES)?;
    let (pos, text) = fields.next().unwrap();
    let dow = parse_day_of_week_field(text, pos)?;

    validate(&dom, &dow)?;

    Ok(CronExpression::new(
        second,
        minute,
        hour,
        dom.bits,
        month,
        dow.bits,
        dow.nth.unwrap_or(0),
        dom.last_offset,
        ExpressionFlags {
            day_of_month_last: dom.last,
            day_of_week_last: dow.last,
            nth_day_of_week: dow.nth.is_some(),
            nearest_weekday: dom.nearest_weekday,
            interval: false,
        },
    ))
}

fn expand_macro(text: &str) -> Result<CronExpression> {
    match text.to_ascii_lowercase().as_str() {
        "@yearly" | "@annually" => Ok(CronExpression::yearly()),
        "@monthly" => Ok(CronExpression::monthly()),
        "@weekly" => Ok(CronExpression::weekly()),
        "@daily" | "@midnight" => Ok(CronExpression::daily()),
        "@hourly" => Ok(CronExpression::hourly()),
        "@every_second" => Ok(CronExpression::every_second()),
        other => Err(CronError::parse("macro", format!("unknown macro '{other}'"), 0)),
    }
}

struct DomField {
    bits: u64,
    last: bool,
    last_offset: u32,
    nearest_weekday: bool,
}

fn parse_day_of_month_field(text: &str, pos: usize) -> Result<DomField> {
    if text == "*" || text == "?" {
        return Ok(DomField { bits: DAY_OF_MONTH_MASK, last: false, last_offset: 0, nearest_weekday: false });
    }
    let upper = text.to_ascii_uppercase();
    if upper == "L" {
        return Ok(DomField { bits: 0, last: true, last_offset: 0, nearest_weekday: false });
    }
    if upper == "LW" {
        return Ok(DomField { bits: 0, last: true, last_offset: 0, nearest_weekday: true });
    }
    if let Some(rest) = upper.strip_prefix("L-") {
        let offset: u32 = rest
            .parse()
            .map_err(|_| CronError::parse("day-of-month", format!("invalid last-day offset '{text}'"), pos))?;
        return Ok(DomField { bits: 0, last: true, last_offset: offset, nearest_weekday: false });
    }
    if let Some(day_text) = upper.strip_suffix('W') {
        let day = parse_value(day_text, pos, "day-of-month", 1, 31, &[])?;
        return Ok(DomField { bits: 1u64 << day, last: false, last_offset: 0, nearest_weekday: true });
    }
    let bits = parse_field(text, pos, "day-of-month", 1, 31, &[])?;
    Ok(DomField { bits, last: false, last_offset: 0, nearest_weekday: false })
}

struct DowField {
    bits: u64,
    last: bool,
    nth: Option<u32>,
}

fn parse_day_of_week_field(text: &str, pos: usize) -> Result<DowField> {
    if text == "*" || text == "?" {
        return Ok(DowField { bits: DAY_OF_WEEK_MASK, last: false, nth: None });
    }
    let upper = text.to_ascii_uppercase();
    if let Some(day_text) = upper.strip_suffix('L') {
        let day = parse_value(day_text, pos, "day-of-week", 0, 7, &DAY_NAMES)?;
        return Ok(DowField { bits: 1u64 << day, last: true, nth: None });
    }
    if let Some((day_text, nth_text)) = text.split_once('#') {
        let day = parse_value(day_text, pos, "day-of-week", 0, 7, &DAY_NAMES)?;
        let nth: u32 = nth_text
            .parse()
            .map_err(|_| CronError::parse("day-of-week", format!("invalid nth '{nth_text}'"), pos))?;
        if !(1..=5).contains(&nth) {
            return Err(CronError::parse("day-of-week", format!("nth '{nth}' out of range 1..=5"), pos));
        }
        return Ok(DowField { bits: 1u64 << day, last: false, nth: Some(nth) });
    }
    let bits = parse_field(text, pos, "day-of-week", 0, 7, &DAY_NAMES)?;
    Ok(DowField { bits, last: false, nth: None })
}

fn validate(dom: &DomField, dow: &DowField) -> Result<()> {
    if dom.nearest_weekday && (dow.last || dow.nth.is_some()) {
        return Err(CronError::parse(
            "expression",
            "a nearest-weekday day-of-month cannot combine with a day-of-week extension",
            0,
        ));
    }
    Ok(())
}

fn parse_field(text: &str, base: usize, field: &str, lo: u32, hi: u32, names: &[(&str, u32)]) -> Result<u64> {
    let mut bits = 0u64;
    for (offset, part) in split_commas(text) {
        bits |= parse_field_part(part, base + offset, field, lo, hi, names)?;
    }
    if bits == 0 {
        return Err(CronError::parse(field, "field matches no values", base));
    }
    Ok(bits)
}

fn parse_field_part(part: &str, pos: usize, field: &str, lo: u32, hi: u32, names: &[(&str, u32)]) -> Result<u64> {
    let (range_part, step) = match part.split_once('/') {
        Some((r, s)) => {
            let step: u32 =
                s.parse().map_err(|_| CronError::parse(field, format!("invalid step '{s}'"), pos))?;
            if step == 0 {
                return Err(CronError::parse(field, "step cannot be zero", pos));
            }
            (r, Some(step))
        }
        None => (part, None),
    };

    let (start, end) = if range_part == "*" {
        (lo, hi)
    } else if let Some((a, b)) = range_part.split_once('-') {
        let a = parse_value(a, pos, field, lo, hi, names)?;
        let b = parse_value(b, pos, field, lo, hi, names)?;
        if a > b {
            return Err(CronError::parse(field, format!("range '{a}-{b}' is out of order"), pos));
        }
        (a, b)
    } else if step.is_some() {
        return Err(CronError::parse(field, format!("'{part}' step requires '*' or a range before '/'"), pos));
    } else {
        let v = parse_value(range_part, pos, field, lo, hi, names)?;
        (v, v)
    };

    let stride = step.unwrap_or(1);
    let mut bits = 0u64;
    let mut v = start;
    while v <= end {
        bits |= 1u64 << v;
        v += stride;
    }
    Ok(bits)
}

fn parse_value(text: &str, pos: usize, field: &str, lo: u32, hi: u32, names: &[(&str, u32)]) -> Result<u32> {
    let lower = text.to_ascii_lowercase();
    if let Some((_, v)) = names.iter().find(|(name, _)| *name == lower) {
        return Ok(*v);
    }
    let v: u32 = text.parse().map_err(|_| CronError::parse(field, format!("'{text}' is not a valid value"), pos))?;
    if v < lo || v > hi {
        return Err(CronError::parse(field, format!("value {v} out of range {lo}..={hi}"), pos));
    }
    Ok(v)
}

/// Splits whitespace-separated fields out of a cron line, tracking each
/// field's byte offset in the original input for diagnostics.
fn split_fields(input: &str) -> Vec<(usize, &str)> {
    let mut fields = Vec::new();
    let mut chars = input.char_indices().peekable();
    loop {
        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace()) {
            chars.next();
        }
        let Some(&(start, _)) = chars.peek() else { break };
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        fields.push((start, &input[start..end]));
    }
    fields
}

/// Splits a single field's comma list, tracking each item's byte offset
/// relative to the field's own start.
fn split_commas(text: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == ',' {
            parts.push((start, &text[start..i]));
            start = i + 1;
        }
    }
    parts.push((start, &text[start..]));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_minute() {
        let expr = parse("* * * * *").unwrap();
        assert_eq!(expr, CronExpression::every_minute());
    }

    #[test]
    fn parses_step_field() {
        let expr = parse("*/15 * * * *").unwrap();
        assert_eq!(expr.minute_bits(), (0..60).step_by(15).fold(0u64, |acc, m| acc | 1 << m));
    }

    #[test]
    fn parses_names_case_insensitively() {
        let by_name = parse("0 0 1 jan,mar *").unwrap();
        let by_number = parse("0 0 1 1,3 *").unwrap();
        assert_eq!(by_name, by_number);
    }

    #[test]
    fn parses_day_of_week_range_by_name() {
        let expr = parse("0 9 * * mon-fri").unwrap();
        assert_eq!(expr.day_of_week_bits(), 0b0111110);
    }

    #[test]
    fn parses_last_day_of_month() {
        let expr = parse("0 0 L * *").unwrap();
        assert!(expr.flags().day_of_month_last);
        assert_eq!(expr.day_of_month_bits(), 0);
    }

    #[test]
    fn parses_last_day_of_month_with_offset() {
        let expr = parse("0 0 L-2 * *").unwrap();
        assert!(expr.flags().day_of_month_last);
    }

    #[test]
    fn parses_nearest_weekday() {
        let expr = parse("0 0 15W * *").unwrap();
        assert!(expr.flags().nearest_weekday);
        assert_eq!(expr.day_of_month_bits(), 1 << 15);
    }

    #[test]
    fn parses_last_weekday_of_month() {
        let expr = parse("0 0 LW * *").unwrap();
        assert!(expr.flags().day_of_month_last);
        assert!(expr.flags().nearest_weekday);
    }

    #[test]
    fn parses_nth_day_of_week() {
        let expr = parse("0 0 * * fri#3").unwrap();
        assert!(expr.flags().nth_day_of_week);
        assert_eq!(expr.day_of_week_bits(), 1 << 5);
    }

    #[test]
    fn parses_last_day_of_week() {
        let expr = parse("0 0 * * 5L").unwrap();
        assert!(expr.flags().day_of_week_last);
        assert_eq!(expr.day_of_week_bits(), 1 << 5);
    }

    #[test]
    fn question_mark_is_synonym_for_star_in_day_fields() {
        let expr = parse("0 0 ? * ?").unwrap();
        assert_eq!(expr, CronExpression::daily());
    }

    #[test]
    fn six_field_form_parses_seconds() {
        let expr = parse_with_seconds("30 0 0 * * *").unwrap();
        assert_eq!(expr.second_bits(), 1 << 30);
        assert!(!expr.is_five_field());
    }

    #[test]
    fn macros_expand_to_builtins() {
        assert_eq!(parse("@yearly").unwrap(), CronExpression::yearly());
        assert_eq!(parse("@annually").unwrap(), CronExpression::yearly());
        assert_eq!(parse("@weekly").unwrap(), CronExpression::weekly());
        assert_eq!(parse("@daily").unwrap(), CronExpression::daily());
        assert_eq!(parse("@midnight").unwrap(), CronExpression::daily());
        assert_eq!(parse("@hourly").unwrap(), CronExpression::hourly());
        assert_eq!(parse("@every_second").unwrap(), CronExpression::every_second());
    }

    #[test]
    fn unknown_macro_errors() {
        assert!(parse("@fortnightly").is_err());
    }

    #[test]
    fn wrong_field_count_errors() {
        assert!(parse("* * * *").is_err());
        assert!(parse_with_seconds("* * * * *").is_err());
    }

    #[test]
    fn out_of_range_value_errors() {
        match parse("0 0 1 13 *") {
            Err(CronError::Parse { field, .. }) => assert_eq!(field, "month"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn zero_step_errors() {
        assert!(parse("*/0 * * * *").is_err());
    }

    #[test]
    fn malformed_range_errors() {
        assert!(parse("10-5 * * * *").is_err());
    }

    #[test]
    fn empty_input_errors() {
        assert!(parse("").is_err());
    }

    #[test]
    fn from_str_matches_parse() {
        let expr: CronExpression = "0 0 * * *".parse().unwrap();
        assert_eq!(expr, CronExpression::daily());
    }
}
