use clap::{ArgAction, Parser, Subcommand};

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "prbot",
    version,
    about = "AI-assisted pull request generator"
)]
pub struct Cli {
    /// AI provider to use (see `prbot providers`)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name to use; defaults to the provider's default model
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// API key for the provider (otherwise read from env or the config file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Base branch to diff against and open the PR into (e.g. main)
    #[arg(long, global = true)]
    pub base: Option<String>,

    /// Open the pull request as a draft
    #[arg(long)]
    pub draft: bool,

    /// Print the generated title and body without creating the pull request
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand (e.g. 'providers')
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands, e.g. `prbot config show`
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the supported AI providers
    Providers,

    /// Inspect or change the persisted configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the stored configuration (API keys masked)
    Show,

    /// Print the configuration file location
    Path,

    /// Persist settings; --model and --api-key apply to the provider from --provider or PRBOT_PROVIDER
    Set,
}
