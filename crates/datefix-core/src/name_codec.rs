//! Canonical media file names: `YYYY-MM-dd_HH-mm-ss[_NN].<ext>`.
//!
//! `NN` is a two digit collision counter (`01`..=`99`) present only when the
//! plain name is taken, and the extension is always lowercase. Older names
//! used a `-N` counter; [`migrate_legacy_suffix`] converts those.

use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::media::split_filename;

/// chrono format of the date token.
pub const DATE_TOKEN_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Length of the date token in bytes.
pub const DATE_TOKEN_LEN: usize = 19;

/// Largest collision counter.
pub const MAX_COUNTER: u32 = 99;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$").unwrap());
static LEGACY_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-(?P<n>\d{1,2})$").unwrap());
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^_(?P<n>\d{2})$").unwrap());

/// How a normalized name spells its collision counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStyle {
    /// `_NN`
    Current,
    /// `-N` / `-NN`
    Legacy,
}

/// A successfully decoded canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedName {
    pub date: NaiveDateTime,
    pub counter: Option<(u32, CounterStyle)>,
}

/// Result of [`encode_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The file already carries the name it would get.
    AlreadyNamed,
    NewName(String),
}

/// Format the canonical name for `date`, with an optional counter.
pub fn format_name(date: NaiveDateTime, counter: Option<u32>, extension: Option<&str>) -> String {
    let mut name = date.format(DATE_TOKEN_FORMAT).to_string();
    if let Some(n) = counter {
        name.push_str(&format!("_{:02}", n));
    }
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(&ext.to_ascii_lowercase());
    }
    name
}

/// Pick the canonical name for a file currently called `current`.
///
/// `name_taken` is asked about each candidate in order (plain, `_01`, ...
/// `_99`) and must reflect the directory as it is now. Reaching the
/// file's own name means it is already correctly named.
pub fn encode_name<F>(current: &str, date: NaiveDateTime, mut name_taken: F) -> Result<EncodeOutcome>
where
    F: FnMut(&str) -> std::io::Result<bool>,
{
    let (_, extension) = split_filename(current);

    for counter in std::iter::once(None).chain((1..=MAX_COUNTER).map(Some)) {
        let candidate = format_name(date, counter, extension);
        if candidate == current {
            return Ok(EncodeOutcome::AlreadyNamed);
        }
        if !name_taken(&candidate)? {
            return Ok(EncodeOutcome::NewName(candidate));
        }
    }

    Err(Error::CollisionExhausted {
        base: format_name(date, None, extension),
        max: MAX_COUNTER,
    })
}

/// Decode a canonical name. `None` for anything else.
pub fn parse_normalized(filename: &str) -> Option<NormalizedName> {
    let (stem, extension) = split_filename(filename);
    if let Some(ext) = extension {
        if ext.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
    }

    let date = parse_token(stem)?;
    let tail = &stem[DATE_TOKEN_LEN..];
    let counter = if tail.is_empty() {
        None
    } else if let Some(caps) = SUFFIX_RE.captures(tail) {
        Some((counter_value(&caps["n"])?, CounterStyle::Current))
    } else if let Some(caps) = LEGACY_SUFFIX_RE.captures(tail) {
        Some((counter_value(&caps["n"])?, CounterStyle::Legacy))
    } else {
        return None;
    };

    Some(NormalizedName { date, counter })
}

/// Whether `filename` is a canonical name for any date.
pub fn is_normalized(filename: &str) -> bool {
    parse_normalized(filename).is_some()
}

/// Whether `filename` is a canonical name for exactly `date`.
pub fn is_normalized_for(filename: &str, date: NaiveDateTime) -> bool {
    parse_normalized(filename).is_some_and(|n| n.date == date)
}

/// Rewrite a legacy `-N` counter to `_NN`. Returns `None` for names that
/// are not canonical-with-legacy-counter, including already migrated ones.
pub fn migrate_legacy_suffix(filename: &str) -> Option<String> {
    let normalized = parse_normalized(filename)?;
    let (n, CounterStyle::Legacy) = normalized.counter? else {
        return None;
    };
    let (_, extension) = split_filename(filename);
    Some(format_name(normalized.date, Some(n), extension))
}

fn parse_token(stem: &str) -> Option<NaiveDateTime> {
    let token = stem.get(..DATE_TOKEN_LEN)?;
    if !TOKEN_RE.is_match(token) {
        return None;
    }
    NaiveDateTime::parse_from_str(token, DATE_TOKEN_FORMAT)
        .ok()
        .filter(|dt| !is_leap_second(dt))
}

/// chrono's `%S` accepts `60`, kept as an extra second in the nanoseconds.
pub(crate) fn is_leap_second(dt: &NaiveDateTime) -> bool {
    dt.nanosecond() >= 1_000_000_000
}

fn counter_value(digits: &str) -> Option<u32> {
    digits
        .parse()
        .ok()
        .filter(|n| (1..=MAX_COUNTER).contains(n))
}
