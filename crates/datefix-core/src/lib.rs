pub mod date;
pub mod error;
pub mod folder_classify;
pub mod media;
pub mod name_codec;
pub mod planner;
pub mod reconcile;
pub mod report;
pub mod scan;
pub mod settings;
pub mod writer;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

pub use date::{MetadataDates, MetadataProvider};
pub use error::{Error, Result};
pub use media::{MediaItem, SourceId, TimestampCandidate};
pub use planner::RenameVerdict;
pub use reconcile::{FolderReport, SourceResult};
pub use settings::{ProviderKind, Settings};
pub use writer::{FsMutator, RenameError, StdFs};

/// Why a file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SkipReason {
    NoReferenceDate,
    AlreadyCorrect,
    AlreadyNormalized,
    /// Migration only: the name has no legacy `-N` counter
    NotLegacyName,
}

/// A file or folder that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch: every file is counted exactly once as succeeded,
/// skipped or failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: u64,
    pub skipped: BTreeMap<SkipReason, u64>,
    pub failed: u64,
    pub failures: Vec<Failure>,
    /// Subfolders whose analysis failed as a whole (recursive runs)
    pub failed_folders: Vec<Failure>,
}

impl BatchSummary {
    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    fn fail(&mut self, path: &Path, error: &Error) {
        tracing::warn!(path = %path.display(), %error, "file failed");
        self.failed += 1;
        self.failures.push(Failure {
            path: path.to_path_buf(),
            error: error.to_string(),
        });
    }
}

/// How the rename reference is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferenceMode {
    /// The reference the reconciliation picks for each folder
    #[default]
    Auto,
    /// Always this source
    Source(SourceId),
    /// Per file, the first configured source having a date
    Priority,
}

#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    pub reference: ReferenceMode,
    /// Also rename files already named after a different date
    pub force: bool,
    /// Descend into subfolders
    pub recursive: bool,
}

/// Reports of a recursive analysis.
#[derive(Debug, Default)]
pub struct TreeAnalysis {
    /// Root first, then subfolders depth-first in name order
    pub reports: Vec<FolderReport>,
    /// Folders whose analysis failed
    pub errors: Vec<(PathBuf, String)>,
}

/// Type alias for progress callback: (stage, current, total, message)
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + 'a;

/// Throttled progress reporter: emits at most every 200ms, or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Cell<Option<Instant>>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Cell::new(None),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            if let Some(last) = self.last_emit.get() {
                if last.elapsed() < Duration::from_millis(200) {
                    return;
                }
            }
            self.last_emit.set(Some(Instant::now()));
        }
        (self.inner)(stage, current, total, message);
    }
}

/// Progress callback that ignores everything.
pub fn no_progress(_: &str, _: u64, _: u64, _: &str) {}

/// Build the media items of one folder, querying the provider once.
pub fn load_items(
    files: &[PathBuf],
    settings: &Settings,
    provider: &dyn MetadataProvider,
) -> Result<Vec<MediaItem>> {
    let metadata = if settings.sources.iter().any(|s| s.is_metadata()) && !files.is_empty() {
        let dates = provider.read_dates(files)?;
        if dates.len() != files.len() {
            return Err(Error::Metadata(format!(
                "{} returned {} entries for {} files",
                provider.name(),
                dates.len(),
                files.len()
            )));
        }
        dates
    } else {
        vec![MetadataDates::default(); files.len()]
    };

    Ok(files
        .iter()
        .zip(metadata.iter())
        .map(|(path, meta)| {
            MediaItem::new(path.clone(), date::collect_dates(path, meta, &settings.sources))
        })
        .collect())
}

fn check_inputs(settings: &Settings, reference: Option<SourceId>) -> Result<()> {
    settings.validate()?;
    if let Some(reference) = reference {
        if !settings.sources.contains(&reference) {
            return Err(Error::UnsupportedSource(format!(
                "{} is not among the configured sources",
                reference
            )));
        }
    }
    Ok(())
}

/// Analyze one folder (not its subfolders).
pub fn analyze_folder(
    dir: &Path,
    settings: &Settings,
    provider: &dyn MetadataProvider,
    reference: Option<SourceId>,
) -> Result<FolderReport> {
    check_inputs(settings, reference)?;
    let listing = scan::scan_folder(dir)?;
    let items = load_items(&listing.media, settings, provider)?;
    Ok(reconcile::reconcile(
        dir,
        &items,
        listing.subfolders.len(),
        &settings.reconcile_options(reference),
    ))
}

/// Analyze `root` and every folder below it.
///
/// A subfolder whose analysis fails is listed in [`TreeAnalysis::errors`]
/// and its own subfolders are skipped; a failure on `root` is returned.
pub fn analyze_tree(
    root: &Path,
    settings: &Settings,
    provider: &dyn MetadataProvider,
    reference: Option<SourceId>,
    progress: &ProgressCallback,
) -> Result<TreeAnalysis> {
    check_inputs(settings, reference)?;
    let tp = ThrottledProgress::new(progress);
    let options = settings.reconcile_options(reference);
    let mut analysis = TreeAnalysis::default();

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        // The total grows as subfolders are discovered
        let done = (analysis.reports.len() + analysis.errors.len()) as u64;
        tp.report("analyze", done, done + 1 + pending.len() as u64, &dir.display().to_string());

        let result = scan::scan_folder(&dir).and_then(|listing| {
            let items = load_items(&listing.media, settings, provider)?;
            Ok((listing, items))
        });
        let (listing, items) = match result {
            Ok(ok) => ok,
            Err(e) if dir != root => {
                tracing::warn!(folder = %dir.display(), error = %e, "analysis failed");
                analysis.errors.push((dir, e.to_string()));
                continue;
            }
            Err(e) => return Err(e),
        };

        let report = reconcile::reconcile(&dir, &items, listing.subfolders.len(), &options);
        tracing::info!(folder = %dir.display(), ok = report.ok, items = report.nb_items, "folder analyzed");
        analysis.reports.push(report);

        pending.extend(listing.subfolders.into_iter().rev());
    }

    Ok(analysis)
}

/// Rename the media files of `dir` after their reference date.
pub fn rename_folder(
    dir: &Path,
    settings: &Settings,
    options: &RenameOptions,
    provider: &dyn MetadataProvider,
    mutator: &dyn FsMutator,
    progress: &ProgressCallback,
) -> Result<BatchSummary> {
    let override_ref = match options.reference {
        ReferenceMode::Source(source) => Some(source),
        _ => None,
    };
    check_inputs(settings, override_ref)?;
    let tp = ThrottledProgress::new(progress);
    let mut summary = BatchSummary::default();

    let mut pending = vec![dir.to_path_buf()];
    while let Some(folder) = pending.pop() {
        let result = scan::scan_folder(&folder).and_then(|listing| {
            let items = load_items(&listing.media, settings, provider)?;
            Ok((listing, items))
        });
        let (listing, items) = match result {
            Ok(ok) => ok,
            Err(e) if folder != dir => {
                tracing::warn!(folder = %folder.display(), error = %e, "folder skipped");
                summary.failed_folders.push(Failure {
                    path: folder,
                    error: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let references: Vec<SourceId> = match options.reference {
            ReferenceMode::Source(source) => vec![source],
            ReferenceMode::Priority => settings.sources.clone(),
            ReferenceMode::Auto => {
                let report = reconcile::reconcile(
                    &folder,
                    &items,
                    listing.subfolders.len(),
                    &settings.reconcile_options(None),
                );
                report.reference.into_iter().collect()
            }
        };
        tracing::info!(folder = %folder.display(), references = ?references, items = items.len(), "renaming");

        rename_items(&items, &references, options.force, mutator, &tp, &mut summary);

        if options.recursive {
            pending.extend(listing.subfolders.into_iter().rev());
        }
    }

    Ok(summary)
}

fn rename_items(
    items: &[MediaItem],
    references: &[SourceId],
    force: bool,
    mutator: &dyn FsMutator,
    tp: &ThrottledProgress,
    summary: &mut BatchSummary,
) {
    let total = items.len() as u64;
    for (i, item) in items.iter().enumerate() {
        tp.report("rename", i as u64, total, &item.filename);
        match planner::plan_rename(item, references, force) {
            RenameVerdict::SkipNoReferenceDate => summary.skip(SkipReason::NoReferenceDate),
            RenameVerdict::SkipAlreadyCorrect => summary.skip(SkipReason::AlreadyCorrect),
            RenameVerdict::SkipAlreadyNormalized => summary.skip(SkipReason::AlreadyNormalized),
            RenameVerdict::RenameToReferenceDate { date, .. } => {
                match planner::apply_rename(item, date, mutator) {
                    Ok(Some(_)) => summary.succeeded += 1,
                    Ok(None) => summary.skip(SkipReason::AlreadyCorrect),
                    Err(e) => summary.fail(&item.path, &e),
                }
            }
        }
    }
}

/// Rewrite legacy `-N` collision counters in `dir` to `_NN`.
pub fn migrate_folder(
    dir: &Path,
    recursive: bool,
    mutator: &dyn FsMutator,
    progress: &ProgressCallback,
) -> Result<BatchSummary> {
    let tp = ThrottledProgress::new(progress);
    let mut summary = BatchSummary::default();

    let mut pending = vec![dir.to_path_buf()];
    while let Some(folder) = pending.pop() {
        let listing = match scan::scan_folder(&folder) {
            Ok(listing) => listing,
            Err(e) if folder != dir => {
                summary.failed_folders.push(Failure {
                    path: folder,
                    error: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        let total = listing.media.len() as u64;
        for (i, path) in listing.media.iter().enumerate() {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            tp.report("migrate", i as u64, total, &filename);

            let Some(new_name) = name_codec::migrate_legacy_suffix(&filename) else {
                summary.skip(SkipReason::NotLegacyName);
                continue;
            };
            match mutator.rename(path, &new_name) {
                Ok(dest) => {
                    tracing::debug!(from = %path.display(), to = %dest.display(), "migrated");
                    summary.succeeded += 1;
                }
                Err(e) => summary.fail(path, &Error::from(e)),
            }
        }

        if recursive {
            pending.extend(listing.subfolders.into_iter().rev());
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::HashMap;
    use std::fs::{self, File};
    use tempfile::tempdir;

    /// Provider answering from a fixed map keyed by file name.
    struct StubProvider(HashMap<String, MetadataDates>);

    impl StubProvider {
        fn new(entries: &[(&str, NaiveDateTime)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(name, dt)| {
                        (
                            name.to_string(),
                            MetadataDates {
                                primary: Some(*dt),
                                secondary: None,
                            },
                        )
                    })
                    .collect(),
            )
        }
    }

    impl MetadataProvider for StubProvider {
        fn read_dates(&self, files: &[PathBuf]) -> Result<Vec<MetadataDates>> {
            Ok(files
                .iter()
                .map(|p| {
                    let name = p.file_name().unwrap().to_string_lossy().into_owned();
                    self.0.get(&name).copied().unwrap_or_default()
                })
                .collect())
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    struct FailingProvider;

    impl MetadataProvider for FailingProvider {
        fn read_dates(&self, _files: &[PathBuf]) -> Result<Vec<MetadataDates>> {
            Err(Error::Metadata("boom".to_string()))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn metadata_and_filename() -> Settings {
        Settings {
            sources: vec![SourceId::PrimaryMetadataDate, SourceId::FilenameDate],
            ..Settings::default()
        }
    }

    #[test]
    fn test_analyze_folder_scenario_a() {
        let root = tempdir().unwrap();
        let dir = root.path().join("2023-11");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "a.jpg");
        touch(&dir, "b.jpg");
        touch(&dir, "IMG_20231120_101010.jpg");
        let provider = StubProvider::new(&[
            ("a.jpg", dt(2023, 11, 3, 10, 0, 0)),
            ("b.jpg", dt(2023, 11, 4, 10, 0, 0)),
        ]);

        let report = analyze_folder(&dir, &metadata_and_filename(), &provider, None).unwrap();
        assert_eq!(report.nb_items, 3);
        assert_eq!(report.reference, Some(SourceId::PrimaryMetadataDate));
        assert_eq!(report.source(SourceId::PrimaryMetadataDate).unwrap().nb_dates, 2);
        assert_eq!(report.source(SourceId::FilenameDate).unwrap().nb_dates, 1);
        assert!(!report.ok);
    }

    #[test]
    fn test_analyze_folder_scenario_b() {
        let root = tempdir().unwrap();
        let dir = root.path().join("2023-11-05(2d) Weekend");
        fs::create_dir(&dir).unwrap();
        for name in [
            "IMG_20231105_090000.jpg",
            "IMG_20231105_180000.jpg",
            "IMG_20231106_070000.jpg",
            "VID_20231106_235959.mp4",
        ] {
            touch(&dir, name);
        }

        let report =
            analyze_folder(&dir, &metadata_and_filename(), &StubProvider::new(&[]), None).unwrap();
        let filename = report.source(SourceId::FilenameDate).unwrap();
        assert_eq!(filename.nb_dates, 4);
        assert_eq!(filename.nb_out_of_range, 0);
        assert_eq!(filename.nb_days_missing, Some(0));
        assert_eq!(report.reference, Some(SourceId::FilenameDate));
        assert!(report.ok);
    }

    #[test]
    fn test_invalid_inputs_fail_early() {
        let root = tempdir().unwrap();
        let provider = StubProvider::new(&[]);
        assert!(matches!(
            analyze_folder(&root.path().join("missing"), &Settings::default(), &provider, None),
            Err(Error::InvalidDirectory(_))
        ));
        assert!(matches!(
            analyze_folder(
                root.path(),
                &metadata_and_filename(),
                &provider,
                Some(SourceId::FilesystemModifiedDate)
            ),
            Err(Error::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_provider_failure() {
        let root = tempdir().unwrap();
        touch(root.path(), "a.jpg");
        let sub = root.path().join("2023");
        fs::create_dir(&sub).unwrap();
        touch(&sub, "b.jpg");

        assert!(matches!(
            analyze_folder(root.path(), &Settings::default(), &FailingProvider, None),
            Err(Error::Metadata(_))
        ));

        // Without metadata sources the provider is never asked
        let settings = Settings {
            sources: vec![SourceId::FilenameDate],
            ..Settings::default()
        };
        let analysis = analyze_tree(root.path(), &settings, &FailingProvider, None, &no_progress).unwrap();
        assert_eq!(analysis.reports.len(), 2);
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn test_analyze_tree_order() {
        let root = tempdir().unwrap();
        for sub in ["2023/2023-02", "2023/2023-01", "2022"] {
            fs::create_dir_all(root.path().join(sub)).unwrap();
        }
        let analysis = analyze_tree(
            root.path(),
            &Settings::default(),
            &StubProvider::new(&[]),
            None,
            &no_progress,
        )
        .unwrap();
        let folders: Vec<PathBuf> = analysis.reports.iter().map(|r| r.folder.clone()).collect();
        assert_eq!(
            folders,
            vec![
                root.path().to_path_buf(),
                root.path().join("2022"),
                root.path().join("2023"),
                root.path().join("2023/2023-01"),
                root.path().join("2023/2023-02"),
            ]
        );
        // Empty folder with subfolders is delegated to its children
        assert!(analysis.reports[2].ok);
    }

    #[test]
    fn test_analyze_tree_progress_ends_complete() {
        let root = tempdir().unwrap();
        for sub in ["2023/2023-02", "2023/2023-01", "2022"] {
            fs::create_dir_all(root.path().join(sub)).unwrap();
        }
        let calls = std::cell::RefCell::new(Vec::new());
        let cb = |_: &str, current: u64, total: u64, _: &str| calls.borrow_mut().push((current, total));
        analyze_tree(root.path(), &Settings::default(), &StubProvider::new(&[]), None, &cb).unwrap();

        let calls = calls.into_inner();
        assert!(calls.iter().all(|(current, total)| current < total));
        assert_eq!(calls.last(), Some(&(4, 5)));
    }

    #[test]
    fn test_rename_folder_counts() {
        let root = tempdir().unwrap();
        let dir = root.path().join("2015-07");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "IMG_20150706_182132_1.JPG");
        touch(&dir, "2015-07-06_16-21-32.jpg");
        touch(&dir, "2015-07-01_08-00-00.jpg");
        touch(&dir, "no_date.png");
        let provider = StubProvider::new(&[
            ("IMG_20150706_182132_1.JPG", dt(2015, 7, 6, 16, 21, 32)),
            ("2015-07-06_16-21-32.jpg", dt(2015, 7, 6, 16, 21, 32)),
            ("2015-07-01_08-00-00.jpg", dt(2015, 7, 2, 9, 0, 0)),
        ]);
        let options = RenameOptions {
            reference: ReferenceMode::Source(SourceId::PrimaryMetadataDate),
            ..RenameOptions::default()
        };

        let summary = rename_folder(
            &dir,
            &metadata_and_filename(),
            &options,
            &provider,
            &StdFs::new(),
            &no_progress,
        )
        .unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped_for(SkipReason::AlreadyCorrect), 1);
        assert_eq!(summary.skipped_for(SkipReason::AlreadyNormalized), 1);
        assert_eq!(summary.skipped_for(SkipReason::NoReferenceDate), 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            names(&dir),
            vec![
                "2015-07-01_08-00-00.jpg",
                "2015-07-06_16-21-32.jpg",
                "2015-07-06_16-21-32_01.jpg",
                "no_date.png",
            ]
        );
    }

    /// Real filesystem, except the first rename fails.
    struct FailFirstRename {
        inner: StdFs,
        failed: std::cell::Cell<bool>,
    }

    impl FsMutator for FailFirstRename {
        fn name_taken(&self, dir: &Path, name: &str) -> std::io::Result<bool> {
            self.inner.name_taken(dir, name)
        }

        fn rename(&self, path: &Path, new_name: &str) -> std::result::Result<PathBuf, RenameError> {
            if !self.failed.replace(true) {
                return Err(RenameError::Io(std::io::Error::other("device busy")));
            }
            self.inner.rename(path, new_name)
        }
    }

    #[test]
    fn test_rename_continues_after_failure() {
        let dir = tempdir().unwrap();
        let first = touch(dir.path(), "IMG_20200101_000001.jpg");
        touch(dir.path(), "IMG_20200101_000002.jpg");
        touch(dir.path(), "IMG_20200101_000003.jpg");
        let settings = Settings {
            sources: vec![SourceId::FilenameDate],
            ..Settings::default()
        };
        let options = RenameOptions {
            reference: ReferenceMode::Source(SourceId::FilenameDate),
            ..RenameOptions::default()
        };
        let mutator = FailFirstRename {
            inner: StdFs::new(),
            failed: std::cell::Cell::new(false),
        };

        let summary = rename_folder(
            dir.path(),
            &settings,
            &options,
            &StubProvider::new(&[]),
            &mutator,
            &no_progress,
        )
        .unwrap();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_skipped(), 0);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, first);
        assert!(first.exists());
        assert!(dir.path().join("2020-01-01_00-00-02.jpg").exists());
        assert!(dir.path().join("2020-01-01_00-00-03.jpg").exists());
    }

    #[test]
    fn test_rename_counter_exhaustion_fails_one_file() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "2015-07-06_16-21-32.jpg");
        for n in 1..=99 {
            touch(dir.path(), &format!("2015-07-06_16-21-32_{:02}.jpg", n));
        }
        let crowded = touch(dir.path(), "IMG_a.jpg");
        touch(dir.path(), "IMG_b.jpg");
        let provider = StubProvider::new(&[
            ("IMG_a.jpg", dt(2015, 7, 6, 16, 21, 32)),
            ("IMG_b.jpg", dt(2015, 7, 6, 16, 21, 40)),
        ]);
        let options = RenameOptions {
            reference: ReferenceMode::Source(SourceId::PrimaryMetadataDate),
            ..RenameOptions::default()
        };

        let summary = rename_folder(
            dir.path(),
            &metadata_and_filename(),
            &options,
            &provider,
            &StdFs::new(),
            &no_progress,
        )
        .unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].path, crowded);
        assert!(summary.failures[0].error.contains("99"));
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped_for(SkipReason::NoReferenceDate), 100);
        assert!(crowded.exists());
        assert!(dir.path().join("2015-07-06_16-21-40.jpg").exists());
    }

    #[test]
    fn test_rename_auto_reference_and_dry_run() {
        let root = tempdir().unwrap();
        let dir = root.path().join("2019-05-09");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "IMG_20190509_154733.jpg");
        touch(&dir, "IMG_20190509_154734.JPG");
        let settings = Settings {
            sources: vec![SourceId::FilenameDate],
            ..Settings::default()
        };

        let summary = rename_folder(
            &dir,
            &settings,
            &RenameOptions::default(),
            &StubProvider::new(&[]),
            &StdFs::dry_run(),
            &no_progress,
        )
        .unwrap();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(names(&dir), vec!["IMG_20190509_154733.jpg", "IMG_20190509_154734.JPG"]);

        let summary = rename_folder(
            &dir,
            &settings,
            &RenameOptions::default(),
            &StubProvider::new(&[]),
            &StdFs::new(),
            &no_progress,
        )
        .unwrap();
        assert_eq!(summary.succeeded, 2);
        assert_eq!(
            names(&dir),
            vec!["2019-05-09_15-47-33.jpg", "2019-05-09_15-47-34.jpg"]
        );
    }

    #[test]
    fn test_rename_priority_recursive() {
        let root = tempdir().unwrap();
        let sub = root.path().join("Misc");
        fs::create_dir(&sub).unwrap();
        touch(root.path(), "a.jpg");
        touch(&sub, "IMG_20200101_000001.jpg");
        let provider = StubProvider::new(&[("a.jpg", dt(2020, 1, 1, 0, 0, 2))]);
        let options = RenameOptions {
            reference: ReferenceMode::Priority,
            recursive: true,
            ..RenameOptions::default()
        };

        let summary = rename_folder(
            root.path(),
            &metadata_and_filename(),
            &options,
            &provider,
            &StdFs::new(),
            &no_progress,
        )
        .unwrap();
        assert_eq!(summary.succeeded, 2);
        assert!(root.path().join("2020-01-01_00-00-02.jpg").exists());
        assert!(sub.join("2020-01-01_00-00-01.jpg").exists());
    }

    #[test]
    fn test_migrate_folder() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "2015-07-06_18-21-32-2.jpg");
        touch(dir.path(), "2015-07-06_18-21-32-100.jpg");
        touch(dir.path(), "2015-07-06_18-21-32_01.jpg");
        touch(dir.path(), "2015-07-06_18-21-32-1.jpg");

        let summary = migrate_folder(dir.path(), false, &StdFs::new(), &no_progress).unwrap();
        // -1 collides with the existing _01
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped_for(SkipReason::NotLegacyName), 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].path, dir.path().join("2015-07-06_18-21-32-1.jpg"));
        assert_eq!(
            names(dir.path()),
            vec![
                "2015-07-06_18-21-32-1.jpg",
                "2015-07-06_18-21-32-100.jpg",
                "2015-07-06_18-21-32_01.jpg",
                "2015-07-06_18-21-32_02.jpg",
            ]
        );

        // A second pass only finds the blocked file again
        let summary = migrate_folder(dir.path(), false, &StdFs::new(), &no_progress).unwrap();
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_throttled_progress_always_reports_completion() {
        let calls = std::cell::RefCell::new(Vec::new());
        let cb = |stage: &str, current: u64, total: u64, _: &str| {
            calls.borrow_mut().push((stage.to_string(), current, total));
        };
        let tp = ThrottledProgress::new(&cb);
        for i in 0..10 {
            tp.report("rename", i, 10, "");
        }
        let calls = calls.into_inner();
        assert_eq!(calls.first().unwrap().1, 0);
        assert_eq!(calls.last().unwrap().1, 9);
        assert!(calls.len() < 10);
    }
}
