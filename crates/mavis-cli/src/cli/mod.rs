//! CLI entry and dispatch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use mavis_core::config::{self, Config};
use mavis_core::markdown::{ListStyle, RenderOptions};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "mavis")]
#[command(version = "0.1")]
#[command(about = "Render MAVIS chat messages from Markdown to HTML")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of $MAVIS_HOME/config.toml
    #[arg(long, global = true, env = "MAVIS_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Overrides for the configured Markdown options.
#[derive(clap::Args, Debug, Clone, Default)]
struct RenderArgs {
    /// Leave code blocks unhighlighted (escaped text only)
    #[arg(long = "no-highlight")]
    no_highlight: bool,

    /// How list items are wrapped
    #[arg(long, value_enum, value_name = "STYLE")]
    list_style: Option<ListStyleArg>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum ListStyleArg {
    /// A <ul>/<ol> around every item
    PerItem,
    /// One <ul>/<ol> per list
    Single,
}

impl From<ListStyleArg> for ListStyle {
    fn from(arg: ListStyleArg) -> Self {
        match arg {
            ListStyleArg::PerItem => ListStyle::PerItem,
            ListStyleArg::Single => ListStyle::Single,
        }
    }
}

impl RenderArgs {
    fn apply(&self, mut options: RenderOptions) -> RenderOptions {
        if self.no_highlight {
            options.highlight = false;
        }
        if let Some(style) = self.list_style {
            options.list_style = style.into();
        }
        options
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Render Markdown to an HTML fragment
    Render {
        /// Markdown file to render (reads stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        #[command(flatten)]
        render_args: RenderArgs,
    },

    /// Render a conversation history JSON file as chat message boxes
    Transcript {
        /// History file: a JSON array of {"type", "data": {"content"}} entries
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Prepend the welcome message
        #[arg(long)]
        welcome: bool,

        /// Print the load-failure notice instead of exiting with an error
        #[arg(long)]
        fallback: bool,

        #[command(flatten)]
        render_args: RenderArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MAVIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config_path = cli.config.unwrap_or_else(config::paths::config_path);

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path(&config_path);
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(&config_path),
        },
        Commands::Render { file, render_args } => {
            let config = load_config(&config_path)?;
            let options = render_args.apply(config.markdown);
            commands::render::run(file.as_deref(), options)
        }
        Commands::Transcript {
            file,
            welcome,
            fallback,
            render_args,
        } => {
            let config = load_config(&config_path)?;
            let options = render_args.apply(config.markdown);
            commands::transcript::run(
                &file,
                options,
                welcome || config.transcript.welcome_message,
                fallback,
            )
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load_from(path).with_context(|| format!("load config from {}", path.display()))
}
