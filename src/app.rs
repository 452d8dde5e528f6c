//! Application driver: wire the collector, pipeline, installer, and report
//! together and map the result to an exit code.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{install_link, LinkOptions};
use crate::cli::{Cli, ReportFormat};
use crate::duplicates::{find_link_groups, PipelineConfig};
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};
use crate::report::RunReport;
use crate::scanner::{WalkConfig, Walker};
use crate::{logging, signal};

/// Run relink with the given CLI arguments.
///
/// Returns the exit code for a completed run. `Err` is reserved for fatal
/// conditions (invalid roots, unsupported platform) where nothing was
/// mutated; per-duplicate problems are recorded in the report and reflected
/// in the returned code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let handler = signal::install_handler();
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));

    if cli.dry_run {
        log::info!("Dry run: no filesystem mutation will be performed");
    }

    // Collect files. Root validation failures abort here, before any
    // mutation is possible.
    progress.on_stage_start("collect", 0);
    let collection = Walker::new(&cli.paths, WalkConfig {
        min_size: cli.min_size,
    })
    .with_progress(Arc::clone(&progress))
    .collect()
    .context("Failed to collect files")?;
    progress.on_stage_end("collect");

    if handler.is_shutdown_requested() {
        return Ok(ExitCode::Interrupted);
    }

    let mut report = RunReport::new(cli.dry_run);
    report.summary.files_considered = collection.files.len();
    report.summary.below_min_size = collection.below_min_size;
    for error in &collection.errors {
        report.record_read_error(error.path(), error.to_string());
    }

    // Group provably identical files
    let pipeline_config = PipelineConfig::default()
        .with_shutdown_flag(handler.flag())
        .with_progress(Arc::clone(&progress));
    let (groups, stats) = find_link_groups(collection.files, &pipeline_config);

    if stats.interrupted {
        return Ok(ExitCode::Interrupted);
    }
    for error in &stats.hash_errors {
        report.record_read_error(error.path(), error.to_string());
    }
    report.summary.groups_confirmed = stats.duplicate_groups;

    // Install links, oldest file in each group surviving as the source
    let options = LinkOptions {
        dry_run: cli.dry_run,
    };
    let mut interrupted = false;
    'groups: for group in groups {
        let Some(choice) = group.into_canonical() else {
            continue;
        };
        for duplicate in &choice.duplicates {
            if handler.is_shutdown_requested() {
                interrupted = true;
                break 'groups;
            }
            let outcome = install_link(&choice.source.path, &duplicate.path, options);
            report.record(&choice.source, duplicate, &outcome);
        }
    }

    // The report is the deliverable; --quiet only silences narration
    match cli.report {
        ReportFormat::Text => println!("{}", report.render_text()),
        ReportFormat::Json => println!(
            "{}",
            report.render_json().context("Failed to render report")?
        ),
    }

    if interrupted {
        return Ok(ExitCode::Interrupted);
    }
    Ok(report.exit_code())
}
