use std::borrow::Cow;

use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime,
    Time,
};

const DAY_FIRST: &[BorrowedFormatItem<'static>] =
    format_description!("[day padding:none]/[month padding:none]/[year]");
const YEAR_FIRST: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month padding:none]/[day padding:none]");
const MONTH_FIRST: &[BorrowedFormatItem<'static>] =
    format_description!("[month padding:none]/[day padding:none]/[year]");

const CLOCK_24: &[BorrowedFormatItem<'static>] = format_description!(
    "[hour padding:none]:[minute][optional [:[second][optional [.[subsecond]]]]]"
);
const CLOCK_12: &[BorrowedFormatItem<'static>] = format_description!(
    "[hour repr:12 padding:none]:[minute][optional [:[second][optional [.[subsecond]]]]] [period case_sensitive:false]"
);
const CLOCK_12_COMPACT: &[BorrowedFormatItem<'static>] = format_description!(
    "[hour repr:12 padding:none]:[minute][optional [:[second][optional [.[subsecond]]]]][period case_sensitive:false]"
);

/// Two-digit years below this land in the 2000s, the rest in the 1900s.
const TWO_DIGIT_YEAR_PIVOT: u16 = 69;

/// Rewrites a trailing two-digit year (`18/06/24`) to four digits.
fn expand_two_digit_year(date: &str) -> Cow<'_, str> {
    if let [first, second, yy] = date.split('/').collect::<Vec<_>>().as_slice() {
        if first.len() <= 2 && yy.len() == 2 && yy.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = yy.parse::<u16>() {
                let century = if n < TWO_DIGIT_YEAR_PIVOT { 2000 } else { 1900 };
                return Cow::Owned(format!("{first}/{second}/{}", century + n));
            }
        }
    }
    Cow::Borrowed(date)
}

/// Drops a UTC offset (`+00:00`, `-0300`) and keeps the wall-clock time.
fn strip_offset(clock: &str) -> &str {
    match clock.rfind(['+', '-']) {
        Some(idx) if idx > 0 => clock[..idx].trim_end(),
        _ => clock,
    }
}

fn parse_date(date: &str) -> Option<Date> {
    [DAY_FIRST, YEAR_FIRST, MONTH_FIRST]
        .iter()
        .find_map(|fmt| Date::parse(date, *fmt).ok())
}

fn parse_clock(clock: &str) -> Option<Time> {
    [CLOCK_24, CLOCK_12, CLOCK_12_COMPACT]
        .iter()
        .find_map(|fmt| Time::parse(clock, *fmt).ok())
}

/// Parses an export timestamp, preferring day-first order.
///
/// Accepted date separators are `/`, `-` and `.`, with a two- or four-digit
/// year. The time part is optional, may be separated by a space or `T`, and
/// may use a 12-hour clock with AM/PM. A trailing `Z` or UTC offset is
/// ignored. A year-first date (ISO style) is recognised by its four-digit
/// leading field. When the day-first reading is not a valid calendar date
/// the month-first reading is tried, so `06/18/2024` still resolves to June
/// 18th.
pub fn parse_day_first(raw: &str) -> Option<PrimitiveDateTime> {
    let s = raw.trim().trim_end_matches('Z');
    if s.is_empty() {
        return None;
    }

    let (date_part, time_part) = match s.find([' ', 'T']) {
        Some(idx) => (&s[..idx], s[idx + 1..].trim()),
        None => (s, ""),
    };
    let date_part = date_part.replace(['-', '.'], "/");
    let date = parse_date(&expand_two_digit_year(&date_part))?;

    if time_part.is_empty() {
        return Some(date.midnight());
    }

    let time = parse_clock(strip_offset(time_part))?;
    Some(PrimitiveDateTime::new(date, time))
}
