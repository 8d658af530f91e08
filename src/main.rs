use anyhow::Result;
use clap::{Parser, Subcommand};

use agentmon::cli::{self, ConfigAction, OutputFormat};
use agentmon::{config, web};

#[derive(Debug, Parser)]
#[command(name = "agentmon")]
#[command(about = "Monitor conversational-agent interaction logs")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Live terminal dashboard, refreshed on every poll
    Watch {
        /// Only show interactions whose question, answer or user matches
        #[arg(long)]
        search: Option<String>,
    },
    /// Poll once and print the dashboard
    Snapshot {
        /// Only show interactions whose question, answer or user matches
        #[arg(long)]
        search: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Attach thumbs-up/down feedback to one interaction
    Feedback {
        /// Interaction id
        id: String,
        /// `up` or `down`
        value: String,
    },
    /// Serve the web dashboard locally
    Web {
        /// Bind address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Check that the log API is reachable
    Health,
    /// Show recent diagnostic events (poll and feedback failures)
    Diagnostics {
        /// Number of events to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.agentmon/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `poller.interval_ms 5000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Watch { search } => cli::run_watch(search),
        Commands::Snapshot { search, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_snapshot(fmt, search)
        }
        Commands::Feedback { id, value } => cli::run_feedback(&id, &value),
        Commands::Web { addr } => {
            let config = config::load();
            let addr = addr.unwrap_or_else(|| config.web.addr.clone());
            web::serve(&config, &addr)
        }
        Commands::Health => cli::run_health(),
        Commands::Diagnostics { limit } => cli::run_diagnostics(limit),
        Commands::Config { action } => {
            let action = match action {
                ConfigCommand::Show => ConfigAction::Show,
                ConfigCommand::Init { force } => ConfigAction::Init { force },
                ConfigCommand::Set { key, value } => ConfigAction::Set { key, value },
                ConfigCommand::Reset => ConfigAction::Reset,
            };
            cli::run_config(action)
        }
    }
}
