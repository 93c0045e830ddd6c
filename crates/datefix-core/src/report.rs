use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::reconcile::FolderReport;
use crate::TreeAnalysis;

#[derive(Serialize)]
struct FolderErrorJson<'a> {
    folder: &'a Path,
    error: &'a str,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    nb_folders: usize,
    nb_folders_ok: usize,
    folders: &'a [FolderReport],
    errors: Vec<FolderErrorJson<'a>>,
}

/// Write every folder report of an analysis to `path` as pretty JSON.
pub fn write_reports_json(analysis: &TreeAnalysis, path: &Path) -> anyhow::Result<()> {
    let json = ReportJson {
        nb_folders: analysis.reports.len(),
        nb_folders_ok: analysis.reports.iter().filter(|r| r.ok).count(),
        folders: &analysis.reports,
        errors: analysis
            .errors
            .iter()
            .map(|(folder, error)| FolderErrorJson { folder, error })
            .collect(),
    };

    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &json)?;

    Ok(())
}

/// One line per folder: verdict, reference and the sources that pass.
pub fn summary_line(report: &FolderReport, root: &Path) -> String {
    let relative: PathBuf = report
        .folder
        .strip_prefix(root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| report.folder.clone());
    let reference = report
        .reference
        .map_or_else(|| "-".to_string(), |r| r.to_string());
    let ok_sources: Vec<&str> = report.ok_sources().map(|s| s.as_str()).collect();

    format!(
        "[{}] {} ({:?}, {} items) reference={} ok=[{}]",
        if report.ok { "OK" } else { "KO" },
        relative.display(),
        report.range.granularity,
        report.nb_items,
        reference,
        ok_sources.join(",")
    )
}
