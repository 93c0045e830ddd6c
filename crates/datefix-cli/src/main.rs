use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use datefix_core::{
    BatchSummary, FsMutator, ProviderKind, ReferenceMode, RenameOptions, Settings, SkipReason, SourceId, StdFs,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datefix", version, about = "Check photo folders against the dates in their names and rename files after their dates")]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ordered date sources, highest priority first (e.g. primary,filename)
    #[arg(long, global = true, value_delimiter = ',')]
    sources: Option<Vec<SourceId>>,

    /// Metadata provider
    #[arg(long, global = true)]
    provider: Option<ProviderArg>,

    /// Path to the exiftool executable
    #[arg(long, global = true)]
    exiftool: Option<PathBuf>,

    /// Seconds under which two dates are considered identical
    #[arg(long, global = true)]
    tolerance: Option<i64>,

    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Exif,
    Exiftool,
}

#[derive(Subcommand)]
enum Command {
    /// Report, for every folder, which date sources agree with its name
    Analyze {
        dir: PathBuf,

        /// Also analyze every subfolder
        #[arg(short, long)]
        recursive: bool,

        /// Use this source as the reference instead of picking one
        #[arg(long)]
        reference: Option<SourceId>,

        /// Write the reports as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Rename media files to YYYY-MM-DD_HH-MM-SS.ext
    Rename {
        dir: PathBuf,

        /// Date source to rename after (default: the folder's reference)
        #[arg(long, conflicts_with = "priority")]
        reference: Option<SourceId>,

        /// Per file, use the first configured source that has a date
        #[arg(long)]
        priority: bool,

        /// Also rename files already named after another date
        #[arg(long)]
        force: bool,

        /// Show what would be renamed without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Also process subfolders
        #[arg(short, long)]
        recursive: bool,
    },
    /// Rewrite old "-N" collision suffixes to "_NN"
    Migrate {
        dir: PathBuf,

        #[arg(long)]
        dry_run: bool,

        #[arg(short, long)]
        recursive: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(sources) = &cli.sources {
        settings.sources = sources.clone();
    }
    if let Some(provider) = cli.provider {
        settings.provider = match provider {
            ProviderArg::Exif => ProviderKind::Exif,
            ProviderArg::Exiftool => ProviderKind::ExifTool,
        };
    }
    if let Some(path) = &cli.exiftool {
        settings.exiftool_path = path.clone();
    }
    if let Some(tolerance) = cli.tolerance {
        settings.tolerance_secs = tolerance;
    }
    settings.validate()?;
    Ok(settings)
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{prefix}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_summary(summary: &BatchSummary, dry_run: bool, elapsed: Duration) {
    let skipped: Vec<String> = summary
        .skipped
        .iter()
        .map(|(reason, n)| format!("{} {}", n, skip_label(*reason)))
        .collect();
    eprintln!(
        "Done{}! {} renamed, {} skipped ({}), {} failed ({:.2}s)",
        if dry_run { " (dry run)" } else { "" },
        summary.succeeded,
        summary.total_skipped(),
        if skipped.is_empty() { "-".to_string() } else { skipped.join(", ") },
        summary.failed,
        elapsed.as_secs_f64()
    );
    for failure in summary.failures.iter().chain(&summary.failed_folders) {
        eprintln!("  failed: {}: {}", failure.path.display(), failure.error);
    }
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NoReferenceDate => "without reference date",
        SkipReason::AlreadyCorrect => "already correct",
        SkipReason::AlreadyNormalized => "already normalized",
        SkipReason::NotLegacyName => "not legacy",
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let t_total = std::time::Instant::now();

    let settings = load_settings(&cli)?;
    tracing::debug!(?settings, "settings loaded");

    match &cli.command {
        Command::Analyze {
            dir,
            recursive,
            reference,
            json,
        } => {
            let provider = settings.metadata_provider();
            let analysis = if *recursive {
                let pb = progress_bar();
                let analysis = datefix_core::analyze_tree(dir, &settings, provider.as_ref(), *reference, &|stage, current, total, message| {
                    pb.set_prefix(stage.to_string());
                    pb.set_length(total);
                    pb.set_position(current + 1);
                    pb.set_message(message.to_string());
                })?;
                pb.finish_and_clear();
                analysis
            } else {
                let report = datefix_core::analyze_folder(dir, &settings, provider.as_ref(), *reference)?;
                datefix_core::TreeAnalysis {
                    reports: vec![report],
                    errors: Vec::new(),
                }
            };

            for report in &analysis.reports {
                println!("{}", datefix_core::report::summary_line(report, dir));
            }
            for (folder, error) in &analysis.errors {
                println!("[ERR] {}: {}", folder.display(), error);
            }
            if let Some(path) = json {
                datefix_core::report::write_reports_json(&analysis, path)?;
                eprintln!("Reports written to {}", path.display());
            }
            eprintln!(
                "Done! {} folders, {} ok, {} errors ({:.2}s)",
                analysis.reports.len(),
                analysis.reports.iter().filter(|r| r.ok).count(),
                analysis.errors.len(),
                t_total.elapsed().as_secs_f64()
            );
        }
        Command::Rename {
            dir,
            reference,
            priority,
            force,
            dry_run,
            recursive,
        } => {
            let options = RenameOptions {
                reference: match (reference, priority) {
                    (Some(source), _) => ReferenceMode::Source(*source),
                    (None, true) => ReferenceMode::Priority,
                    (None, false) => ReferenceMode::Auto,
                },
                force: *force,
                recursive: *recursive,
            };
            let provider = settings.metadata_provider();
            let mutator = if *dry_run { StdFs::dry_run() } else { StdFs::new() };

            let pb = progress_bar();
            let summary = datefix_core::rename_folder(
                dir,
                &settings,
                &options,
                provider.as_ref(),
                &mutator as &dyn FsMutator,
                &|stage, current, total, message| {
                    pb.set_prefix(stage.to_string());
                    pb.set_length(total);
                    pb.set_position(current + 1);
                    pb.set_message(message.to_string());
                },
            )?;
            pb.finish_and_clear();
            print_summary(&summary, mutator.is_dry_run(), t_total.elapsed());
        }
        Command::Migrate {
            dir,
            dry_run,
            recursive,
        } => {
            let mutator = if *dry_run { StdFs::dry_run() } else { StdFs::new() };

            let pb = progress_bar();
            let summary = datefix_core::migrate_folder(dir, *recursive, &mutator, &|stage, current, total, message| {
                pb.set_prefix(stage.to_string());
                pb.set_length(total);
                pb.set_position(current + 1);
                pb.set_message(message.to_string());
            })?;
            pb.finish_and_clear();
            print_summary(&summary, *dry_run, t_total.elapsed());
        }
    }

    Ok(())
}
