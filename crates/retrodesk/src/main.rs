//! retrodesk - render and maintain a retro desktop site
//!
//! Loads a site directory's JSON config documents through the same page
//! model the browser front end uses, and prints the result.
//!
//! # Usage
//!
//! ```sh
//! # Bootstrap the page and print its HTML
//! retrodesk render ./site
//! retrodesk render ./site --config ./retrodesk.toml
//!
//! # Same, reading the configs from a deployed site (needs the `http` feature)
//! retrodesk render https://jane.dev/
//!
//! # Base64-encode protected social values before publishing
//! retrodesk encode-config ./site/config/socials.json
//!
//! # Show what the preview overlay would display for a project
//! retrodesk preview ./site retro-os
//! ```
//!
//! Exit codes:
//! - 0: success
//! - 1: the command failed (missing file, unreadable config, preview error)
//! - 2: invalid arguments

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use desktop::config::Config;
use desktop::fetch::{ConfigFetcher, FsSource};
use desktop::page::PageController;
use desktop::preview;
use desktop::project::{ProjectsConfig, DEFAULT_PROJECTS_PATH};

mod encode;


/// Exit code for invalid arguments
const EXIT_USAGE: i32 = 2;

const USAGE: &str = "usage:
  retrodesk render <site-dir|site-url> [--config <config.toml>]
  retrodesk encode-config <socials.json>
  retrodesk preview <site-dir|site-url> <project-id> [--config <config.toml>]";

/// Where a site's documents are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Site {
    Dir(PathBuf),
    /// Base URL of a deployed site
    Url(String),
}

impl Site {
    fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Site::Url(arg.to_string())
        } else {
            Site::Dir(PathBuf::from(arg))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Render {
        site: Site,
        config: Option<PathBuf>,
    },
    EncodeConfig {
        path: PathBuf,
    },
    Preview {
        site: Site,
        project: String,
        config: Option<PathBuf>,
    },
    Help,
}

/// Error in the command line itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UsageError(pub String);

fn usage(message: impl Into<String>) -> UsageError {
    UsageError(message.into())
}

/// Split positional arguments from a trailing `--config <path>`
fn split_config_flag(args: &[String]) -> Result<(Vec<&str>, Option<PathBuf>), UsageError> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or_else(|| usage("missing path after --config"))?;
                config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => return Err(usage(format!("unknown option: {flag}"))),
            other => positional.push(other),
        }
    }
    Ok((positional, config))
}

/// Parse the command from arguments (without the program name)
pub(crate) fn parse_command(args: &[String]) -> Result<Command, UsageError> {
    let Some((name, rest)) = args.split_first() else {
        return Err(usage("missing command"));
    };

    match name.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "render" => match split_config_flag(rest)? {
            (positional, config) if positional.len() == 1 => Ok(Command::Render {
                site: Site::from_arg(positional[0]),
                config,
            }),
            _ => Err(usage("render takes exactly one site directory")),
        },
        "encode-config" => match rest {
            [path] => Ok(Command::EncodeConfig {
                path: PathBuf::from(path),
            }),
            _ => Err(usage("encode-config takes exactly one socials.json path")),
        },
        "preview" => match split_config_flag(rest)? {
            (positional, config) if positional.len() == 2 => Ok(Command::Preview {
                site: Site::from_arg(positional[0]),
                project: positional[1].to_string(),
                config,
            }),
            _ => Err(usage("preview takes a site directory and a project id")),
        },
        other => Err(usage(format!("unknown command: {other}"))),
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Respect NO_COLOR environment variable for testing
    let use_ansi = env::var("NO_COLOR").is_err();

    // Logs go to stderr so rendered output can be piped
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_ansi(use_ansi),
        )
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::from_file(path).with_context(|| format!("failed to load config {}", path.display()))
        }
        None => Ok(Config::load()),
    }
}

fn check_site_dir(site: &Path) -> Result<()> {
    if !site.is_dir() {
        anyhow::bail!("site directory not found: {}", site.display());
    }
    Ok(())
}

#[cfg(feature = "http")]
fn http_fetcher(base: &str) -> Result<ConfigFetcher> {
    let source = desktop::fetch::HttpSource::parse(base).with_context(|| format!("invalid site URL {base}"))?;
    Ok(ConfigFetcher::new(source))
}

#[cfg(not(feature = "http"))]
fn http_fetcher(base: &str) -> Result<ConfigFetcher> {
    anyhow::bail!("cannot read {base}: retrodesk was built without the `http` feature")
}

fn site_fetcher(site: &Site) -> Result<ConfigFetcher> {
    match site {
        Site::Dir(dir) => {
            check_site_dir(dir)?;
            Ok(ConfigFetcher::new(FsSource::new(dir)))
        }
        Site::Url(base) => http_fetcher(base),
    }
}

/// Bootstrap a page from the site's configs and return its HTML
pub(crate) fn render(site: &Site, config: Config) -> Result<String> {
    let fetcher = site_fetcher(site)?;
    let mut page = PageController::new(fetcher, config);
    page.bootstrap();
    page.run_deferred();
    Ok(page.to_html())
}

/// Load a project's preview and return the overlay HTML
pub(crate) fn render_preview(site: &Site, project: &str, config: &Config) -> Result<String> {
    let fetcher = site_fetcher(site)?;
    // A remote site resolves preview URLs against itself
    let origin = match site {
        Site::Url(base) => base.as_str(),
        Site::Dir(_) => config.site_origin.as_str(),
    };
    let path = config
        .page_configs
        .projects
        .as_deref()
        .unwrap_or(DEFAULT_PROJECTS_PATH);
    let projects = fetcher.load::<ProjectsConfig>(path);

    let content = preview::load_preview(&fetcher, projects.as_ref(), project, origin)
        .with_context(|| format!("preview of project '{project}' is not available"))?;
    Ok(content.to_html())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Help => {
            println!("{USAGE}");
        }
        Command::Render { site, config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", render(&site, config)?);
        }
        Command::EncodeConfig { path } => {
            let encoded = encode::encode_config_file(&path)?;
            println!("encoded {} value(s) in {}", encoded.len(), path.display());
        }
        Command::Preview {
            site,
            project,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            println!("{}", render_preview(&site, &project, &config)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    setup_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(UsageError(message)) => {
            eprintln!("error: {message}\n{USAGE}");
            std::process::exit(EXIT_USAGE);
        }
    };

    tracing::debug!(?command, "running");
    run(command)
}
