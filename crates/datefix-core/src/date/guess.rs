use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use crate::media::split_filename;

/// `YYYY<s>MM<s>DD` optionally followed by `HH<t>MM<t>SS`.
/// The regex crate has no backreferences, so each separator is captured on
/// its own and the "same separator twice" rule is checked afterwards.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<year>(?:19|20)\d{2})(?P<s1>[-.:_ ]?)(?P<month>0[1-9]|1[0-2])(?P<s2>[-.:_ ]?)(?P<day>0[1-9]|[12]\d|3[01])",
        r"(?:[-.:_T ]?(?P<hour>[01]\d|2[0-3])(?P<t1>[-.:_ ]?)(?P<minute>[0-5]\d)(?P<t2>[-.:_ ]?)(?P<second>[0-5]\d))?",
    ))
    .unwrap()
});

/// Date found in a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessedDate {
    pub datetime: NaiveDateTime,
    /// No time of day was found; `datetime` is at midnight.
    pub date_only: bool,
}

/// Best-effort scan of a file name for an embedded date.
///
/// Everything before and after the match is ignored. Eight-digit numbers that
/// happen to look like a date are picked up too.
pub fn guess_date_from_filename(filename: &str) -> Option<GuessedDate> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    let (stem, _) = split_filename(basename);

    let mut start = 0;
    while let Some(caps) = DATE_RE.captures_at(stem, start) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        if let Some(guess) = parse_match(&caps) {
            return Some(guess);
        }
        // Matches always start on an ASCII digit
        start = whole.start() + 1;
    }

    None
}

fn parse_match(caps: &Captures) -> Option<GuessedDate> {
    if group(caps, "s1") != group(caps, "s2") {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        group(caps, "year").parse().ok()?,
        group(caps, "month").parse().ok()?,
        group(caps, "day").parse().ok()?,
    )?;

    let time = caps
        .name("hour")
        .filter(|_| group(caps, "t1") == group(caps, "t2"))
        .and_then(|hour| {
            NaiveTime::from_hms_opt(
                hour.as_str().parse().ok()?,
                group(caps, "minute").parse().ok()?,
                group(caps, "second").parse().ok()?,
            )
        });

    Some(match time {
        Some(time) => GuessedDate {
            datetime: date.and_time(time),
            date_only: false,
        },
        None => GuessedDate {
            datetime: date.and_time(NaiveTime::MIN),
            date_only: true,
        },
    })
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map_or("", |m| m.as_str())
}
