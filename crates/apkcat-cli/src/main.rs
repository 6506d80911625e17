use std::time::Duration;

use apkcat_config::{
    config::{default_config_path, generate_default_config, Config},
    error::ConfigError,
};
use apkcat_core::{ApkcatResult, SearchQuery};
use apkcat_registry::{http_client::configure_http_client, RegistryError};
use apkcat_utils::path::resolve_path;
use build::build;
use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use query::{search_packages, show_package};
use tracing::{debug, info, warn};
use ureq::{
    http::{HeaderMap, HeaderName, HeaderValue},
    Proxy,
};
use utils::COLOR;

mod build;
mod cli;
mod logging;
mod query;
mod utils;

/// Loads the configuration named by `--config`, or the default one.
fn load_config(path: Option<&str>) -> ApkcatResult<Config> {
    let config = match path {
        Some(path) => {
            let path = resolve_path(path).map_err(ConfigError::from)?;
            debug!("Loading configuration from {}", path.display());
            Config::load_from(path)?
        }
        None => Config::new()?,
    };
    Ok(config)
}

fn parse_headers(headers: &[String]) -> HeaderMap {
    headers
        .iter()
        .filter_map(|header| {
            let parsed = header.split_once(':').and_then(|(key, value)| {
                let name = HeaderName::try_from(key.trim()).ok()?;
                let value = HeaderValue::try_from(value.trim()).ok()?;
                Some((name, value))
            });
            if parsed.is_none() {
                warn!("Ignoring invalid header: {}", header);
            }
            parsed
        })
        .collect()
}

fn configure_http(args: &Args, timeout: Option<Duration>) -> ApkcatResult<()> {
    let proxy = args
        .proxy
        .as_deref()
        .map(Proxy::new)
        .transpose()
        .map_err(RegistryError::from)?;
    let user_agent = args.user_agent.clone();
    let headers = args.header.as_deref().map(parse_headers);

    configure_http_client(|config| {
        if proxy.is_some() {
            config.proxy = proxy;
        }
        if let Some(user_agent) = user_agent {
            config.user_agent = Some(user_agent);
        }
        if headers.is_some() {
            config.headers = headers;
        }
        config.timeout = timeout;
    });

    Ok(())
}

fn handle_cli() -> ApkcatResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        let mut color = COLOR.write().unwrap();
        *color = false;
    }

    match args.command {
        Commands::DefConfig => {
            let path = match args.config.as_deref() {
                Some(path) => resolve_path(path).map_err(ConfigError::from)?,
                None => default_config_path(),
            };
            generate_default_config(path)?;
        }
        Commands::Config => {
            let config = load_config(args.config.as_deref())?;
            let content = toml::to_string_pretty(&config).map_err(ConfigError::from)?;
            info!("{}", content);
        }
        Commands::Build {
            ref output,
            ref architectures,
            ref repositories,
            compact,
        } => {
            let config = load_config(args.config.as_deref())?;
            configure_http(&args, config.timeout()?)?;
            build(
                config,
                output.clone(),
                architectures.clone(),
                repositories.clone(),
                compact,
            )?;
        }
        Commands::Search {
            query,
            catalog,
            repo,
            arch,
            limit,
        } => {
            let config = load_config(args.config.as_deref())?;
            let query = SearchQuery {
                term: query,
                repo,
                arch,
                limit,
            };
            search_packages(&config, catalog, query)?;
        }
        Commands::Show {
            name,
            catalog,
        } => {
            let config = load_config(args.config.as_deref())?;
            show_package(&config, catalog, &name)?;
        }
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
