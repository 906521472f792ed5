use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

/// Alternation matching English month names, full or abbreviated
const MONTHS: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

// 2021-03-04, 2021.03.04, 2021_3_4, 2021/03/04
static YEAR_FIRST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})[-._/](\d{1,2})[-._/](\d{1,2})(?:\D|$)").unwrap()
});

// 20210304
static COMPACT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4})(\d{2})(\d{2})(?:\D|$)").unwrap());

// 03-04-2021, 4.3.2021, 03/04/2021
static YEAR_LAST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{1,2})[-./](\d{1,2})[-./](\d{4})(?:\D|$)").unwrap()
});

// 4 March 2021, 4th mar. 2021
static DAY_MONTH_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?[\s.,_-]*{MONTHS}\.?[\s.,_-]*(\d{{4}})\b"
    ))
    .unwrap()
});

// March 4, 2021
static MONTH_DAY_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTHS}\.?[\s.,_-]*(\d{{1,2}})(?:st|nd|rd|th)?[\s.,_-]+(\d{{4}})\b"
    ))
    .unwrap()
});

// March 2021
static MONTH_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b{MONTHS}\.?[\s.,_-]*(\d{{4}})\b")).unwrap()
});

// 14:30, 9:05:12
static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\D|$)").unwrap()
});

/// Compact dates outside this range are treated as plain numbers
const COMPACT_YEARS: std::ops::RangeInclusive<i32> = 1900..=2099;

/// Find a date (and optionally a time of day) embedded anywhere in `text`.
///
/// Non-date words are ignored. Returns `None` when no complete, valid
/// calendar date is present; a lone number is never read as a date.
pub fn parse_fuzzy(text: &str) -> Option<NaiveDateTime> {
    let date = find_date(text)?;
    let time = find_time(text).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

fn find_date(text: &str) -> Option<NaiveDate> {
    first_valid(&YEAR_FIRST_PATTERN, text, |c| {
        ymd(number(c, 1), number(c, 2), number(c, 3))
    })
    .or_else(|| {
        first_valid(&COMPACT_PATTERN, text, |c| {
            let year = number::<i32>(c, 1).filter(|y| COMPACT_YEARS.contains(y))?;
            ymd(Some(year), number(c, 2), number(c, 3))
        })
    })
    .or_else(|| {
        first_valid(&DAY_MONTH_YEAR_PATTERN, text, |c| {
            ymd(number(c, 3), month(c, 2), number(c, 1))
        })
    })
    .or_else(|| {
        first_valid(&MONTH_DAY_YEAR_PATTERN, text, |c| {
            ymd(number(c, 3), month(c, 1), number(c, 2))
        })
    })
    .or_else(|| {
        first_valid(&MONTH_YEAR_PATTERN, text, |c| {
            ymd(number(c, 2), month(c, 1), Some(1))
        })
    })
    .or_else(|| {
        first_valid(&YEAR_LAST_PATTERN, text, |c| {
            let (first, second) = (number::<u32>(c, 1)?, number::<u32>(c, 2)?);
            // Month first, unless the first number cannot be a month.
            let (month, day) = if first > 12 {
                (second, first)
            } else {
                (first, second)
            };
            ymd(number(c, 3), Some(month), Some(day))
        })
    })
}

fn find_time(text: &str) -> Option<NaiveTime> {
    first_valid(&TIME_PATTERN, text, |c| {
        let seconds = c.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
        NaiveTime::from_hms_opt(number(c, 1)?, number(c, 2)?, seconds)
    })
}

/// First match of `pattern` that `build` accepts.
///
/// After a rejected match the search resumes one character past its start,
/// so a candidate sharing a separator with the rejected one is still seen.
fn first_valid<T>(
    pattern: &Regex,
    text: &str,
    build: impl Fn(&Captures) -> Option<T>,
) -> Option<T> {
    let mut start = 0;
    while let Some(captures) = pattern.captures_at(text, start) {
        if let Some(value) = build(&captures) {
            return Some(value);
        }
        let matched = captures.get(0)?;
        let step = text[matched.start()..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        start = matched.start() + step;
    }
    None
}

fn number<T: std::str::FromStr>(captures: &Captures, index: usize) -> Option<T> {
    captures.get(index)?.as_str().parse().ok()
}

fn month(captures: &Captures, index: usize) -> Option<u32> {
    let name = captures.get(index)?.as_str().to_ascii_lowercase();
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn ymd(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year?, month?, day?)
}
