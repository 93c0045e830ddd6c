use chrono::{Days, Months, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Folder name grammar: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `YYYY-MM-DD(Nd)`.
/// `j` (jours) is accepted as an alternate day unit.
static FOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>(?:19|20)\d{2})(?:-(?P<month>0[1-9]|1[0-2])(?:-(?P<day>0[1-9]|[12]\d|3[01])(?:\((?P<days>\d+)[dj]\))?)?)?",
    )
    .unwrap()
});

/// Text following a date token must not look like more of the grammar.
static CONTINUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d|-\d|\(\d)").unwrap());

/// Precision of the date encoded in a folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FolderGranularity {
    None,
    Year,
    Month,
    Day,
    DayRange,
}

impl FolderGranularity {
    /// Whether every day of the interval must be covered.
    pub fn requires_full_coverage(self) -> bool {
        matches!(self, FolderGranularity::Day | FolderGranularity::DayRange)
    }
}

/// Half-open date interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateInterval {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateInterval {
    pub fn new(min: NaiveDate, max: NaiveDate) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date < self.max
    }

    /// `other` lies entirely inside this interval.
    pub fn covers(&self, other: &DateInterval) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min == self.max
    }

    pub fn num_days(&self) -> i64 {
        (self.max - self.min).num_days()
    }
}

/// Date range resolved from a folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FolderRange {
    pub interval: Option<DateInterval>,
    pub granularity: FolderGranularity,
}

impl FolderRange {
    pub const NONE: FolderRange = FolderRange {
        interval: None,
        granularity: FolderGranularity::None,
    };

    fn new(min: NaiveDate, max: NaiveDate, granularity: FolderGranularity) -> Self {
        match DateInterval::new(min, max).filter(|i| !i.is_empty()) {
            Some(interval) => Self {
                interval: Some(interval),
                granularity,
            },
            None => Self::NONE,
        }
    }
}

/// Resolve the date interval encoded in a folder's name (last path segment).
/// Names that do not encode a date give [`FolderRange::NONE`].
pub fn resolve_folder_range(name: &str) -> FolderRange {
    resolve(name).unwrap_or(FolderRange::NONE)
}

fn resolve(name: &str) -> Option<FolderRange> {
    let caps = FOLDER_RE.captures(name)?;
    let whole = caps.get(0)?;
    if CONTINUATION_RE.is_match(&name[whole.end()..]) {
        return None;
    }

    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    let Some(month) = caps.name("month") else {
        let min = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let max = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
        return Some(FolderRange::new(min, max, FolderGranularity::Year));
    };
    let month: u32 = month.as_str().parse().ok()?;
    let Some(day) = caps.name("day") else {
        let min = NaiveDate::from_ymd_opt(year, month, 1)?;
        let max = min.checked_add_months(Months::new(1))?;
        return Some(FolderRange::new(min, max, FolderGranularity::Month));
    };
    let day: u32 = day.as_str().parse().ok()?;
    let min = NaiveDate::from_ymd_opt(year, month, day)?;

    match caps.name("days") {
        None => {
            let max = min.checked_add_days(Days::new(1))?;
            Some(FolderRange::new(min, max, FolderGranularity::Day))
        }
        Some(days) => {
            let days: u64 = days.as_str().parse().ok()?;
            if days == 0 {
                return None;
            }
            let max = min.checked_add_days(Days::new(days))?;
            Some(FolderRange::new(min, max, FolderGranularity::DayRange))
        }
    }
}
