//! Command-line interface for mojo
//!
//! Parses flags, resolves configuration into targets and dispatches the
//! requested action against each one.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::client::{RemoteClient, TagFilter, TagMode};
use crate::config::{
    config_sources, load_config, resolve_targets, CliOverrides, EndpointSelector, Selector,
};
use crate::dispatch::{dispatch, Action};

mod utils;

pub use utils::{parse_csv, parse_params, InputError};

/// Command-line client for Jojo script servers
#[derive(Parser, Debug)]
#[command(name = "mojo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// A YAML (or TOML) configuration file, read after /etc/mojo.yml and ~/.mojo.yml
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The host a Jojo instance listens on
    #[arg(short = 'e', long, value_name = "HOST")]
    pub endpoint: Option<String>,

    /// The port Jojo is listening on
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Use SSL
    #[arg(short = 's', long = "ssl")]
    pub use_ssl: bool,

    /// Ignore SSL certificate verification failures
    #[arg(short = 'i', long = "ignore-warnings")]
    pub ignore_warnings: bool,

    /// The user to authenticate with
    #[arg(short = 'u', long, env = "MOJO_USER")]
    pub user: Option<String>,

    /// The password to authenticate with
    #[arg(short = 'w', long, env = "MOJO_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The configured environment to control
    #[arg(short = 'n', long = "environment", value_name = "NAME", conflicts_with = "group")]
    pub environment: Option<String>,

    /// The configured group of environments to control
    #[arg(short = 'g', long, value_name = "NAME")]
    pub group: Option<String>,

    /// Endpoints within each environment to control (comma-separated, or "all")
    #[arg(short = 'd', long, value_name = "NAMES")]
    pub endpoints: Option<String>,

    /// Boolean operator for the tag filter when listing
    #[arg(short = 'b', long = "list-boolean", value_enum, requires = "tags")]
    pub boolean: Option<TagMode>,

    /// Tags to filter the listing by (comma-separated); see --list-boolean
    #[arg(short = 't', long, value_name = "TAGS")]
    pub tags: Option<String>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    pub verbose: bool,

    /// The action to take
    #[arg(value_enum)]
    pub action: ActionKind,

    /// For 'show' and 'run', the relevant script
    pub script: Option<String>,

    /// Parameters for 'run' in key=value format
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub params: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActionKind {
    /// List available scripts
    List,
    /// Show script details
    Show,
    /// Run a script
    Run,
    /// Reload the server's scripts
    Reload,
}

impl Cli {
    /// The action to dispatch. Input problems are reported before any
    /// configuration is read or any server contacted.
    pub fn action(&self) -> Result<Action, InputError> {
        match self.action {
            ActionKind::List => {
                let filter = parse_csv(&self.tags).filter(|tags| !tags.is_empty()).map(|tags| {
                    TagFilter { mode: self.boolean.unwrap_or(TagMode::And), tags }
                });
                Ok(Action::List { filter })
            }
            ActionKind::Show => Ok(Action::Show { script: self.require_script("show")? }),
            ActionKind::Run => Ok(Action::Run {
                script: self.require_script("run")?,
                params: parse_params(&self.params)?,
            }),
            ActionKind::Reload => Ok(Action::Reload),
        }
    }

    pub fn selector(&self) -> Selector {
        match (&self.environment, &self.group) {
            (Some(env), _) => Selector::Environment(env.clone()),
            (None, Some(group)) => Selector::Group(group.clone()),
            (None, None) => Selector::Default,
        }
    }

    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            endpoint: self.endpoint.clone(),
            port: self.port,
            use_ssl: if self.use_ssl { Some(true) } else { None },
            verify: if self.ignore_warnings { Some(false) } else { None },
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }

    fn require_script(&self, action: &'static str) -> Result<String, InputError> {
        self.script.clone().ok_or(InputError::MissingScript(action))
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let action = cli.action()?;
    let config = load_config(&config_sources(cli.config.as_deref()))?;
    let endpoints = cli.endpoints.as_deref().map(EndpointSelector::parse);
    let targets = resolve_targets(&config, &cli.selector(), endpoints.as_ref(), &cli.overrides())?;

    if targets.is_empty() {
        tracing::warn!(
            "No environment selected and no default_environment configured; nothing to do"
        );
        return Ok(());
    }

    let stdout = io::stdout();
    let stderr = io::stderr();
    dispatch(
        &targets,
        &action,
        |target| RemoteClient::connect(&target.settings),
        &mut stdout.lock(),
        &mut stderr.lock(),
    )?;
    Ok(())
}
