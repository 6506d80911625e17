use std::path::PathBuf;

use apkcat_config::{config::Config, error::ConfigError};
use apkcat_core::{load_catalog, ApkcatError, ApkcatResult, SearchQuery};
use apkcat_utils::path::resolve_path;
use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tracing::{debug, info};

use crate::utils::{join_or_dash, pretty_size, Colored, Icons};

fn catalog_path(config: &Config, catalog: Option<String>) -> ApkcatResult<PathBuf> {
    match catalog {
        Some(path) => Ok(resolve_path(&path).map_err(ConfigError::from)?),
        None => Ok(config.output_path()?),
    }
}

pub fn search_packages(
    config: &Config,
    catalog: Option<String>,
    query: SearchQuery,
) -> ApkcatResult<()> {
    debug!(
        query = %query.term,
        repo = ?query.repo,
        arch = ?query.arch,
        limit = ?query.limit,
        "searching packages"
    );

    let path = catalog_path(config, catalog)?;
    let document = load_catalog(&path)?;
    let hits = document.search(&query);

    for package in &hits {
        info!(
            "{}:{} | {} | {} [{}]",
            Colored(Blue, &package.name),
            Colored(Green, &package.repo),
            Colored(LightRed, &package.version),
            package.description,
            join_or_dash(&package.architectures)
        );
    }

    let mut builder = Builder::new();
    builder.push_record([
        format!("{} Found", Icons::PACKAGE),
        Colored(Cyan, hits.len()).to_string(),
    ]);
    builder.push_record([
        format!("{} Catalog", Icons::CALENDAR),
        format!(
            "{} packages, {}",
            document.metadata.total_packages, document.metadata.last_updated
        ),
    ]);

    let table = builder
        .build()
        .with(Panel::header("Search Results"))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{table}");

    Ok(())
}

pub fn show_package(config: &Config, catalog: Option<String>, name: &str) -> ApkcatResult<()> {
    debug!(name = name, "querying package info");

    let path = catalog_path(config, catalog)?;
    let document = load_catalog(&path)?;
    let package = document
        .get(name)
        .ok_or_else(|| ApkcatError::PackageNotFound(name.to_string()))?;

    let mut builder = Builder::new();
    builder.push_record([
        format!("{} Name", Icons::PACKAGE),
        format!(
            "{}:{}",
            Colored(Blue, &package.name),
            Colored(Green, &package.repo)
        ),
    ]);
    builder.push_record([
        format!("{} Version", Icons::VERSION),
        Colored(LightRed, &package.version).to_string(),
    ]);

    let optional = [
        (Icons::DESCRIPTION, "Description", &package.description),
        (Icons::LINK, "Homepage", &package.url),
        (Icons::LICENSE, "License", &package.license),
        (Icons::MAINTAINER, "Maintainer", &package.maintainer),
        (Icons::PACKAGE, "Origin", &package.origin),
        (Icons::CHECKSUM, "Checksum", &package.checksum),
    ];
    for (icon, label, value) in optional {
        if !value.is_empty() {
            builder.push_record([format!("{icon} {label}"), value.clone()]);
        }
    }

    if !package.package_size.is_empty() || !package.installed_size.is_empty() {
        builder.push_record([
            format!("{} Size", Icons::SIZE),
            format!(
                "{} ({} installed)",
                pretty_size(&package.package_size),
                pretty_size(&package.installed_size)
            ),
        ]);
    }

    builder.push_record([
        format!("{} Architectures", Icons::ARCH),
        join_or_dash(&package.architectures),
    ]);
    builder.push_record([
        format!("{} Depends", Icons::ARROW),
        join_or_dash(&package.dependencies),
    ]);
    builder.push_record([
        format!("{} Provides", Icons::ARROW),
        join_or_dash(&package.provides),
    ]);
    if !package.install_if.is_empty() {
        builder.push_record([
            format!("{} Install if", Icons::ARROW),
            join_or_dash(&package.install_if),
        ]);
    }
    if !package.source_repo.is_empty() {
        builder.push_record([
            format!("{} Source repo", Icons::LINK),
            package.source_repo.clone(),
        ]);
    }

    let table = builder
        .build()
        .with(Panel::header(package.name.as_str()))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!(
        pkg_name = %package.name,
        version = %package.version,
        repo = %package.repo,
        "\n{table}"
    );

    Ok(())
}
