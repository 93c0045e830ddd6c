//! Per-folder comparison of every date source against the date range in the
//! folder's name.
//!
//! For each configured source the engine counts present dates, dates outside
//! the folder interval and days of the interval the source leaves uncovered.
//! The source with the most in-range dates becomes the folder's reference,
//! and every other source is checked for agreement with it.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::folder_classify::{resolve_folder_range, DateInterval, FolderRange};
use crate::media::{MediaItem, SourceId};

/// Default tolerance, in seconds, for two dates to count as identical.
pub const DEFAULT_TOLERANCE_SECS: i64 = 2;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Sources to evaluate, highest priority first.
    pub sources: Vec<SourceId>,
    /// Maximum distance between two dates considered identical.
    pub tolerance: TimeDelta,
    /// Use this source as reference instead of picking one.
    pub reference: Option<SourceId>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            sources: SourceId::ALL.to_vec(),
            tolerance: TimeDelta::seconds(DEFAULT_TOLERANCE_SECS),
            reference: None,
        }
    }
}

/// Aggregate of one source over one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceResult {
    pub source: SourceId,
    /// Items having a date from this source
    pub nb_dates: usize,
    /// Dates outside the folder interval (all of them without an interval)
    pub nb_out_of_range: usize,
    /// First day covered by this source's dates
    pub min_date: Option<NaiveDate>,
    /// Day after the last day covered (exclusive)
    pub max_date: Option<NaiveDate>,
    /// Folder days not covered, only when the span lies inside the folder
    pub nb_days_missing: Option<i64>,
    pub is_reference: bool,
    /// Items whose date agrees with the reference within the tolerance
    pub nb_dates_eq_ref: usize,
    pub ok: bool,
    #[serde(skip)]
    nb_in_range: usize,
}

impl SourceResult {
    fn span(&self) -> Option<DateInterval> {
        DateInterval::new(self.min_date?, self.max_date?)
    }
}

/// Outcome of one analysis pass over a folder.
#[derive(Debug, Clone, Serialize)]
pub struct FolderReport {
    pub folder: PathBuf,
    pub range: FolderRange,
    pub nb_items: usize,
    pub nb_subfolders: usize,
    /// One entry per configured source, in priority order
    pub sources: Vec<SourceResult>,
    pub reference: Option<SourceId>,
    pub ok: bool,
}

impl FolderReport {
    pub fn source(&self, source: SourceId) -> Option<&SourceResult> {
        self.sources.iter().find(|r| r.source == source)
    }

    /// Sources whose verdict is ok.
    pub fn ok_sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().filter(|r| r.ok).map(|r| r.source)
    }
}

/// Analyze the items of `folder` against the range in its name.
pub fn reconcile(
    folder: &Path,
    items: &[MediaItem],
    nb_subfolders: usize,
    options: &ReconcileOptions,
) -> FolderReport {
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let range = resolve_folder_range(&name);

    let mut sources: Vec<SourceResult> = options
        .sources
        .iter()
        .map(|&source| source_counts(source, items, range.interval))
        .collect();

    let reference = options
        .reference
        .or_else(|| select_reference(&sources, range.interval));

    for result in &mut sources {
        result.is_reference = Some(result.source) == reference;
        result.nb_dates_eq_ref = match reference {
            _ if result.is_reference => result.nb_dates,
            Some(reference) => count_identical(items, result.source, reference, options.tolerance),
            None => 0,
        };
        result.ok = verdict(result, items.len(), &range, reference.is_some());
    }

    let ok = if items.is_empty() && nb_subfolders > 0 {
        true
    } else {
        sources.iter().any(|r| r.ok)
    };

    tracing::debug!(
        folder = %folder.display(),
        granularity = ?range.granularity,
        items = items.len(),
        reference = ?reference,
        ok,
        "folder reconciled"
    );

    FolderReport {
        folder: folder.to_path_buf(),
        range,
        nb_items: items.len(),
        nb_subfolders,
        sources,
        reference,
        ok,
    }
}

fn source_counts(source: SourceId, items: &[MediaItem], interval: Option<DateInterval>) -> SourceResult {
    let dates: Vec<NaiveDateTime> = items.iter().filter_map(|item| item.date(source)).collect();

    let nb_in_range = match interval {
        Some(interval) => dates.iter().filter(|d| interval.contains(d.date())).count(),
        None => 0,
    };

    let min_date = dates.iter().map(|d| d.date()).min();
    let max_date = dates
        .iter()
        .map(|d| d.date())
        .max()
        .and_then(|d| d.succ_opt());

    let mut result = SourceResult {
        source,
        nb_dates: dates.len(),
        nb_out_of_range: dates.len() - nb_in_range,
        min_date,
        max_date,
        nb_days_missing: None,
        is_reference: false,
        nb_dates_eq_ref: 0,
        ok: false,
        nb_in_range,
    };

    if let (Some(folder), Some(span)) = (interval, result.span()) {
        if folder.covers(&span) {
            result.nb_days_missing =
                Some((span.min - folder.min).num_days() + (folder.max - span.max).num_days());
        }
    }

    result
}

/// Source with the most in-range dates; earlier sources win ties.
fn select_reference(sources: &[SourceResult], interval: Option<DateInterval>) -> Option<SourceId> {
    if interval.is_none() {
        return None;
    }
    let mut best: Option<&SourceResult> = None;
    for result in sources.iter().filter(|r| r.nb_in_range > 0) {
        if best.map_or(true, |b| result.nb_in_range > b.nb_in_range) {
            best = Some(result);
        }
    }
    best.map(|r| r.source)
}

fn count_identical(items: &[MediaItem], source: SourceId, reference: SourceId, tolerance: TimeDelta) -> usize {
    items
        .iter()
        .filter(|item| match (item.date(source), item.date(reference)) {
            (Some(a), Some(b)) => (a - b).abs() <= tolerance,
            _ => false,
        })
        .count()
}

fn verdict(result: &SourceResult, nb_items: usize, range: &FolderRange, has_reference: bool) -> bool {
    if result.nb_dates != nb_items || result.nb_out_of_range != 0 {
        return false;
    }
    if range.granularity.requires_full_coverage() && result.nb_days_missing != Some(0) {
        return false;
    }
    !has_reference || result.nb_dates_eq_ref == result.nb_dates
}
