//! Date parsing rules used by the publish-date cascade.
//!
//! Each rule is a separate function so the cascade in the field extractor
//! stays auditable. Naive values are taken as UTC.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").expect("valid regex"));
static DAY_FIRST_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})").expect("valid regex"));
static DAY_MONTH_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?:er|st|nd|rd|th)?\s+(\p{L}+)\.?,?\s+(\d{4})").expect("valid regex")
});
static MONTH_NAME_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\p{L}+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})").expect("valid regex")
});
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s*[:hH]\s*(\d{2})\b").expect("valid regex"));
static URL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{4})/(\d{1,2})(?:/(\d{1,2}))?/").expect("valid regex"));

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Parse a machine-readable timestamp: RFC 3339, RFC 2822, common ISO
/// variants with or without offset, or a bare `YYYY-MM-DD`.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| at_time(d, None))
}

/// Parse human-written date text such as "15 novembre 2024",
/// "1er août 2024 à 14h30", "May 12, 2024" or "12/05/2024".
/// Numeric dates with the day first follow the French convention.
pub fn parse_fuzzy_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Some(dt) = parse_datetime(text) {
        return Some(dt);
    }

    let (date, rest) = find_date(text)?;
    let time = CLOCK_TIME.captures(rest).and_then(|caps| {
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        NaiveTime::from_hms_opt(hour, minute, 0)
    });
    at_time(date, time)
}

/// Find the first recognizable calendar date; returns it with the text
/// that follows the match.
fn find_date(text: &str) -> Option<(NaiveDate, &str)> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let date = ymd(&caps[1], &caps[2], &caps[3]);
        if let Some(date) = date {
            return Some((date, &text[caps.get(0)?.end()..]));
        }
    }
    if let Some(caps) = DAY_FIRST_DATE.captures(text) {
        if let Some(date) = ymd(&caps[3], &caps[2], &caps[1]) {
            return Some((date, &text[caps.get(0)?.end()..]));
        }
    }
    for caps in DAY_MONTH_NAME.captures_iter(text) {
        if let Some(month) = month_from_name(&caps[2]) {
            if let Some(date) = ymd(&caps[3], &month.to_string(), &caps[1]) {
                return Some((date, &text[caps.get(0)?.end()..]));
            }
        }
    }
    for caps in MONTH_NAME_DAY.captures_iter(text) {
        if let Some(month) = month_from_name(&caps[1]) {
            if let Some(date) = ymd(&caps[3], &month.to_string(), &caps[2]) {
                return Some((date, &text[caps.get(0)?.end()..]));
            }
        }
    }
    None
}

/// Extract a `/YYYY/MM[/DD]/` date from a URL path. Missing day means the 1st.
pub fn date_from_url(url: &str) -> Option<DateTime<Utc>> {
    let caps = URL_DATE.captures(url)?;
    let day = caps.get(3).map_or("1", |m| m.as_str());
    let date = ymd(&caps[1], &caps[2], day)?;
    at_time(date, None)
}

/// Month number for a French or English month name or abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let folded: String = lower
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'û' | 'ù' | 'ü' => 'u',
            'à' | 'â' => 'a',
            'ô' => 'o',
            'î' | 'ï' => 'i',
            'ç' => 'c',
            other => other,
        })
        .collect();

    let month = match folded.as_str() {
        "janvier" | "janv" | "january" | "jan" => 1,
        "fevrier" | "fevr" | "fev" | "february" | "feb" => 2,
        "mars" | "march" | "mar" => 3,
        "avril" | "avr" | "april" | "apr" => 4,
        "mai" | "may" => 5,
        "juin" | "june" | "jun" => 6,
        "juillet" | "juil" | "july" | "jul" => 7,
        "aout" | "august" | "aug" => 8,
        "septembre" | "sept" | "september" | "sep" => 9,
        "octobre" | "oct" | "october" => 10,
        "novembre" | "nov" | "november" => 11,
        "decembre" | "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    if !(1990..=2100).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn at_time(date: NaiveDate, time: Option<NaiveTime>) -> Option<DateTime<Utc>> {
    let time = time.or_else(|| NaiveTime::from_hms_opt(0, 0, 0))?;
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}
