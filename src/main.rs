//! croqli - a terminal assistant backed by a hosted LLM.
//!
//! Three interactive modes share one config file: a natural-language shell
//! command assistant (the default), free-form chat, and web-search summaries.

mod assistant;
mod chat;
mod cheatsheet;
mod config;
mod environment;
mod llm;
mod search;
mod ui;

use anyhow::{Context, Result};
use assistant::{AssistantSession, CommandHistory, FileAttemptLog, LlmCommandGenerator, SystemShell};
use cheatsheet::CheatSheet;
use clap::{Parser, Subcommand};
use llm::{ChatClient, CompletionParams};
use std::process::Command as ProcessCommand;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "croqli")]
#[command(author, version, about = "Terminal assistant: shell commands, chat and web search")]
#[command(long_about = "Describe what you want in plain language and croqli runs the matching shell command.\n\nRun without a subcommand to start the command assistant.")]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the model for this run
    #[arg(short = 'm', long, value_name = "MODEL", global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate requests into shell commands and run them (default)
    Assist,
    /// Chat with the model
    Chat,
    /// Search the web and summarize the results
    Search,
    /// Inspect or edit the cheat sheet
    Cheatsheet {
        #[command(subcommand)]
        action: Option<CheatsheetAction>,
    },
    /// Open configuration file in $EDITOR
    Config,
}

#[derive(Subcommand)]
enum CheatsheetAction {
    /// Print the whole cheat sheet
    Show,
    /// Print one entry
    Get {
        key: String,
    },
    /// Set an entry; the value is parsed as JSON, falling back to a string
    Set {
        key: String,
        value: String,
    },
    /// Add an empty category
    AddCategory {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Config) => handle_config(),
        Some(Commands::Cheatsheet { action }) => {
            handle_cheatsheet(action.unwrap_or(CheatsheetAction::Show))
        }
        command => {
            let mut config = config::Config::load().context("Failed to load configuration")?;
            if let Some(model) = cli.model {
                config.llm.model = model.clone();
                config.assistant.model = Some(model);
            }

            match command {
                Some(Commands::Chat) => run_chat(&config).await,
                Some(Commands::Search) => run_search(&config).await,
                _ => run_assistant(&config).await,
            }
        }
    }
}

/// Log to stderr so interactive output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let directive = if verbose { "croqli=debug" } else { "croqli=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn banner(mode: &str, exit_hint: &str) {
    if atty::is(atty::Stream::Stdin) {
        ui::print_note(&format!("croqli {} mode. Type {} to leave.", mode, exit_hint));
    }
}

async fn run_assistant(config: &config::Config) -> Result<()> {
    let client = ChatClient::from_config(&config.llm)?;
    let generator = LlmCommandGenerator::new(client, CompletionParams::for_commands(config));
    let mut executor = SystemShell::new(config.assistant.exec_timeout_secs.map(Duration::from_secs));
    if let Some(shell) = environment::shell_path() {
        executor = executor.with_program(shell);
    }
    debug!("Command interpreter: {}", executor.program().display());

    let log_path = config.log_file()?;
    debug!("Attempt log: {}", log_path.display());
    let history = CommandHistory::new(config.assistant.history_capacity)
        .with_log(FileAttemptLog::new(log_path));

    let cheat_sheet = if config.assistant.include_cheat_sheet {
        Some(CheatSheet::load(config.cheat_sheet_path()?)?.context_blob())
    } else {
        None
    };

    let env = environment::detect();
    info!(
        "Command model: {} (shell: {}, os: {})",
        config.command_model(),
        env.shell_name,
        env.operating_system
    );

    let mut session = AssistantSession::new(generator, executor, env, history)
        .with_history_context(config.assistant.history_context)
        .with_cheat_sheet(cheat_sheet);

    banner("assistant", "'exit' or 'quit'");
    let mut reporter = ui::ConsoleReporter::new();
    session
        .run(BufReader::new(tokio::io::stdin()), &mut reporter)
        .await
}

async fn run_chat(config: &config::Config) -> Result<()> {
    let client = ChatClient::from_config(&config.llm)?;
    let params = CompletionParams::from_llm_config(&config.llm);
    let mut session = chat::ChatSession::new(client, params, &config.llm.system_prompt);

    banner("chat", "'exit', '/quit' or '/back'");
    session.run(BufReader::new(tokio::io::stdin())).await
}

async fn run_search(config: &config::Config) -> Result<()> {
    let provider = search::TavilyClient::from_config(&config.search)?;
    let client = ChatClient::from_config(&config.llm)?;
    let params = CompletionParams::from_llm_config(&config.llm);
    let session = search::SearchSession::new(provider, client, params, config.search.max_tokens);

    banner("search", "'exit'");
    session.run(BufReader::new(tokio::io::stdin())).await
}

fn handle_cheatsheet(action: CheatsheetAction) -> Result<()> {
    let config = config::Config::load().context("Failed to load configuration")?;
    let mut sheet = CheatSheet::load(config.cheat_sheet_path()?)?;

    match action {
        CheatsheetAction::Show => println!("{}", sheet.context_blob()),
        CheatsheetAction::Get { key } => match sheet.get(&key) {
            Some(value) => println!("{}", value),
            None => ui::print_error(&format!("No entry named '{}'", key)),
        },
        CheatsheetAction::Set { key, value } => {
            sheet.set(key.as_str(), cheatsheet::parse_value(&value));
            sheet.save()?;
            println!("Updated '{}' in {}", key, sheet.path().display());
        }
        CheatsheetAction::AddCategory { name } => {
            if sheet.add_category(&name) {
                sheet.save()?;
                println!("Added category '{}'", name);
            } else {
                ui::print_error(&format!("Category '{}' already exists", name));
            }
        }
    }

    Ok(())
}

/// Handle the config command.
fn handle_config() -> Result<()> {
    let config_path = config::Config::config_path()?;

    if !config_path.exists() {
        config::Config::default().save()?;
        println!("Created default config at {}", config_path.display());
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}
