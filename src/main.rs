//! bramble - a file-based blog engine.

mod app;
mod cache;
mod callback;
mod cli;
mod compile;
mod config;
mod crash;
mod entry;
mod init;
mod plugins;
mod renderer;
mod request;
mod resolver;
mod router;
mod serve;
mod theme;
mod utils;

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use request::Site;
use std::io::Write;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { name } = &cli.command {
        return init::new_blog(name);
    }

    let site = load_site(&cli)?;

    match &cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Serve { .. } => serve::serve_site(&site),
        Commands::Compile { incremental } => {
            // content cannot change mid-compile, so memoization is safe
            cache::enable();
            compile::run_compile(&site, *incremental)
        }
        Commands::RenderUrl { url, headers } => render_url(&site, url, *headers),
        Commands::Collectstatic => compile::run_collectstatic(&site),
    }
}

/// Load and validate configuration, then build the plugin registry.
fn load_site(cli: &Cli) -> Result<Site> {
    let config_path = if cli.config.is_dir() {
        cli.config.join("bramble.toml")
    } else {
        cli.config.clone()
    };
    if !config_path.exists() {
        bail!("Config file not found: {}", config_path.display());
    }

    let mut config = SiteConfig::from_path(&config_path)?;
    apply_cli_overrides(&mut config, cli);
    config.validate()?;

    let (registry, _bad_plugins) = plugins::build_registry(&config)?;
    Ok(Site::new(config, registry))
}

/// Fold command-line overrides into the loaded configuration.
fn apply_cli_overrides(config: &mut SiteConfig, cli: &Cli) {
    if let Commands::Serve { interface, port } = &cli.command {
        if let Some(interface) = interface {
            config.serve.interface = interface.clone();
        }
        if let Some(port) = port {
            config.serve.port = *port;
        }
    }
}

/// Render one url and write it to stdout. Pipeline errors print as the
/// crash page, matching what dynamic serving would return.
fn render_url(site: &Site, url: &str, headers: bool) -> Result<()> {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    let response = match app::run_url(site, path, query, false) {
        Ok(response) => response,
        Err(err) => {
            let env = request::HttpEnv::from([("PATH_INFO".to_string(), path.to_string())]);
            crash::response_for_error(&err, &env)
        }
    };

    let mut stdout = std::io::stdout().lock();
    if headers {
        writeln!(stdout, "Status: {}", response.status())?;
        for (key, value) in response.headers() {
            writeln!(stdout, "{key}: {value}")?;
        }
        writeln!(stdout)?;
    }
    stdout.write_all(response.body())?;
    Ok(())
}
