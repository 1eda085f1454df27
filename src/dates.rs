use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

struct DatePatterns {
    day_mon_year: Regex,
    slash_dmy: Regex,
    dash_dmy: Regex,
    month_name: Regex,
    iso: Regex,
}

fn patterns() -> &'static DatePatterns {
    static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DatePatterns {
        day_mon_year: Regex::new(r"^(\d{1,2})-([a-zA-Z]{3})-(\d{4})").expect("valid regex"),
        slash_dmy: Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid regex"),
        dash_dmy: Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})").expect("valid regex"),
        month_name: Regex::new(r"^([a-zA-Z]+)\s+(\d{1,2}),\s+(\d{4})").expect("valid regex"),
        iso: Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})").expect("valid regex"),
    })
}

/// Month number from a name or abbreviation (`Jan`, `january`, `SEPT`).
fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as u32 + 1)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<String> {
    let y: i32 = year.parse().ok()?;
    let d: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(y, month, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn try_normalize(s: &str) -> Option<String> {
    let p = patterns();
    if let Some(c) = p.day_mon_year.captures(s) {
        return ymd(&c[3], month_number(&c[2])?, &c[1]);
    }
    if let Some(c) = p.slash_dmy.captures(s).or_else(|| p.dash_dmy.captures(s)) {
        return ymd(&c[3], c[2].parse().ok()?, &c[1]);
    }
    if let Some(c) = p.month_name.captures(s) {
        return ymd(&c[3], month_number(&c[1])?, &c[2]);
    }
    if let Some(c) = p.iso.captures(s) {
        return ymd(&c[1], c[2].parse().ok()?, &c[3]);
    }
    None
}

/// Normalize a document date to `YYYY-MM-DD`.
///
/// Recognised forms are `01-Jan-2024`, `05/12/2025` and `05-12-2025` (day
/// first), `Dec 31, 2023` and `2024-05-20` (any trailing time is ignored).
/// Text that matches none of them, or that names an impossible calendar date,
/// comes back trimmed but otherwise untouched so nothing read off a document
/// is lost. Blank input yields `None`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    Some(try_normalize(s).unwrap_or_else(|| s.to_string()))
}
