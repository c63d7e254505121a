// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lada_config::Mode;

use crate::{
    commands::{
        AskCommand, Command, ConfigAction, ConfigCommand, EnginesCommand, InitCommand,
        ModelsCommand,
    },
    error::CliResult,
};

/// LADA - route prompts to local model engines
#[derive(Parser, Debug)]
#[command(name = "lada", bin_name = "lada", version)]
#[command(about = "Route prompts to Ollama or the in-process LADA runtime")]
#[command(
    long_about = "LADA routes model identifiers such as 'codellama:7b' or 'mlx:Qwen2.5-3B-Instruct' to the engine that serves them.\n\nQuick start:\n  lada init                 Write a default .lada_config.yml\n  lada models --check       Check the configured models are reachable\n  lada ask \"hello\"          Send a one-shot prompt"
)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ./.lada_config.yml)
    #[arg(long, global = true, env = "LADA_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List registered engines and their connection settings
    Engines,

    /// Show which engine and model an identifier resolves to
    Models {
        /// Model identifier, e.g. `mlx:Qwen2.5-3B-Instruct` (default: the configured mode models)
        #[arg(value_name = "IDENT")]
        identifier: Option<String>,

        /// Only show the model configured for this mode
        #[arg(long)]
        mode: Option<Mode>,

        /// Ask each engine whether the model is available
        #[arg(long)]
        check: bool,
    },

    /// Send a single prompt and print the reply
    Ask {
        /// Prompt text
        prompt: String,

        /// Model identifier (default: the model configured for --mode)
        #[arg(short, long, value_name = "IDENT")]
        model: Option<String>,

        /// Mode whose configured model is used
        #[arg(long, default_value = "chat")]
        mode: Mode,

        /// Override the engine host
        #[arg(long)]
        host: Option<String>,

        /// Override the request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Run the model in this process instead of through an engine server
        #[arg(long)]
        in_process: bool,
    },

    /// Inspect and edit the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigSubcommand>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Print one value by dotted key, e.g. `model.engines.ollama.host`
    Get { key: String },
    /// Set one value by dotted key and save
    Set { key: String, value: String },
    /// Print the configuration file path
    Path,
}

impl From<ConfigSubcommand> for ConfigAction {
    fn from(action: ConfigSubcommand) -> Self {
        match action {
            ConfigSubcommand::Show => ConfigAction::Show,
            ConfigSubcommand::Get { key } => ConfigAction::Get(key),
            ConfigSubcommand::Set { key, value } => ConfigAction::Set(key, value),
            ConfigSubcommand::Path => ConfigAction::Path,
        }
    }
}

/// Parses arguments and dispatches to command handlers
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to the handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();
        crate::logging::init_logging(cli.verbose, cli.quiet);
        Self::execute(&cli).await
    }

    /// Execute a parsed command line
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let config = cli.config.clone();
        match &cli.command {
            Commands::Engines => EnginesCommand::new(config).execute().await,
            Commands::Models {
                identifier,
                mode,
                check,
            } => {
                ModelsCommand::new(config)
                    .with_identifier(identifier.clone())
                    .with_mode(*mode)
                    .with_check(*check)
                    .execute()
                    .await
            }
            Commands::Ask {
                prompt,
                model,
                mode,
                host,
                timeout,
                max_tokens,
                temperature,
                in_process,
            } => {
                AskCommand::new(config, prompt.clone())
                    .with_model(model.clone())
                    .with_mode(*mode)
                    .with_host(host.clone())
                    .with_timeout(*timeout)
                    .with_max_tokens(*max_tokens)
                    .with_temperature(*temperature)
                    .with_in_process(*in_process)
                    .with_stats(cli.verbose)
                    .execute()
                    .await
            }
            Commands::Config { action } => {
                let action = action.clone().unwrap_or(ConfigSubcommand::Show);
                ConfigCommand::new(config, action.into()).execute().await
            }
            Commands::Init { force } => InitCommand::new(config).with_force(*force).execute().await,
        }
    }
}
