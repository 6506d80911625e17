use std::path::Path;

use apkcat_config::config::Config;
use apkcat_core::{
    build_catalog, write_catalog, ApkcatResult, BuildOutcome, CatalogMetadata, FetchOutcome,
};
use apkcat_registry::ArchiveIndexSource;
use apkcat_utils::path::resolve_path;
use nu_ansi_term::Color::{Blue, Cyan, Green, Red, Yellow};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tracing::{debug, info, warn};

use crate::utils::{Colored, Icons};

pub fn build(
    mut config: Config,
    output: Option<String>,
    architectures: Vec<String>,
    repositories: Vec<String>,
    compact: bool,
) -> ApkcatResult<()> {
    config.narrow(&architectures, &repositories)?;

    let output = match output {
        Some(path) => resolve_path(&path).map_err(apkcat_config::error::ConfigError::from)?,
        None => config.output_path()?,
    };

    debug!(
        output = %output.display(),
        architectures = ?config.architectures,
        compact = compact,
        "building catalog"
    );

    let outcome = build_catalog(&config, &ArchiveIndexSource);
    write_catalog(&outcome.catalog, &output, !compact)?;

    display_fetch_reports(&outcome);
    display_resolutions(&outcome);
    display_summary(&outcome.catalog.metadata, &output);

    Ok(())
}

fn display_fetch_reports(outcome: &BuildOutcome) {
    let mut builder = Builder::new();
    builder.push_record(["Repository", "Arch", "Packages", "Status"].map(String::from));

    for report in &outcome.reports {
        let (count, status) = match &report.outcome {
            FetchOutcome::Fetched(count) => {
                (
                    Colored(Cyan, count).to_string(),
                    format!("{}", Colored(Green, Icons::CHECK)),
                )
            }
            FetchOutcome::Failed(reason) => {
                (
                    "-".to_string(),
                    format!("{} {}", Colored(Red, Icons::CROSS), reason),
                )
            }
        };
        builder.push_record([
            Colored(Blue, &report.display_name).to_string(),
            report.architecture.clone(),
            count,
            status,
        ]);
    }

    let table = builder
        .build()
        .with(Panel::header("Fetched Indexes"))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{table}");

    let failed = outcome.failed_fetches();
    if failed > 0 {
        warn!(
            "{} of {} indexes could not be fetched",
            failed,
            outcome.reports.len()
        );
    }
}

fn display_resolutions(outcome: &BuildOutcome) {
    if outcome.resolutions.is_empty() {
        return;
    }

    info!(
        "{} packages taken over by a higher-priority repository",
        Colored(Yellow, outcome.resolutions.len())
    );
    for resolution in &outcome.resolutions {
        debug!(
            "  {} {}: {} {} {} ({})",
            Icons::ARROW,
            Colored(Blue, &resolution.name),
            resolution.previous,
            Icons::ARROW,
            Colored(Green, &resolution.winner),
            resolution.architecture
        );
    }
}

fn display_summary(metadata: &CatalogMetadata, output: &Path) {
    let mut builder = Builder::new();

    builder.push_record([
        format!("{} Packages", Icons::PACKAGE),
        Colored(Cyan, metadata.total_packages).to_string(),
    ]);
    for (arch, count) in &metadata.architectures {
        builder.push_record([
            format!("{} {}", Icons::ARCH, arch),
            format!("{count} packages"),
        ]);
    }
    builder.push_record([
        format!("{} Package size", Icons::SIZE),
        format!("{} MB", metadata.total_package_size_mb),
    ]);
    builder.push_record([
        format!("{} Installed size", Icons::SIZE),
        format!("{} MB", metadata.total_installed_size_mb),
    ]);
    builder.push_record([
        format!("{} Updated", Icons::CALENDAR),
        metadata.last_updated.clone(),
    ]);
    builder.push_record([
        format!("{} Output", Icons::LINK),
        Colored(Blue, output.display()).to_string(),
    ]);

    let table = builder
        .build()
        .with(Panel::header(format!(
            "Catalog ({})",
            metadata.alpine_version
        )))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{table}");
}
