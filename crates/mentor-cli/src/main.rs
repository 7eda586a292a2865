use anyhow::Result;
use clap::{Parser, Subcommand};
use mentor_core::config::MentorConfig;
use mentor_core::session::SkillLevel;
use mentor_infrastructure::ConfigLoader;
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "mentor")]
#[command(about = "MENTOR - conversational design tutoring with routed multi-agent replies", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/mentor/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive tutoring session
    Chat {
        /// Resume a stored session
        #[arg(long)]
        session: Option<String>,

        /// Skill level for a new session (beginner, intermediate, advanced)
        #[arg(long, default_value = "intermediate")]
        skill: SkillLevel,

        /// Print routing diagnostics after every turn
        #[arg(long)]
        trace: bool,
    },
    /// Classify and route one utterance offline and print the decision as JSON
    Route {
        utterance: String,

        /// Earlier learner messages, oldest first
        #[arg(long, num_args = 1..)]
        history: Vec<String>,
    },
    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List stored sessions, most recent first
    List,
    /// Delete a stored session
    Delete { id: String },
}

fn load_config(path: Option<PathBuf>) -> Result<MentorConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    Ok(loader.load()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let trace = matches!(cli.command, Commands::Chat { trace: true, .. });
    let events = logging::init(cli.log_json, trace)?;
    let config = load_config(cli.config)?;
    tracing::debug!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Chat { session, skill, .. } => {
            commands::chat::run(config, session, skill, events).await?
        }
        Commands::Route { utterance, history } => commands::route::run(&config, &utterance, &history)?,
        Commands::Sessions { action } => match action {
            SessionsAction::List => commands::sessions::list(&config).await?,
            SessionsAction::Delete { id } => commands::sessions::delete(&config, &id).await?,
        },
    }

    Ok(())
}
