//! Commitlint bot CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commitlint_core::{
    BotConfig, BotContext, ConventionalLinter, DispatchOutcome, Dispatcher, LintResult, Linter,
};
use commitlint_github::GitHubClient;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Initialize logging with the specified verbosity level
fn init_logging(verbose: u8, quiet: bool, json: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("commitlint_core={}", level).parse()?)
        .add_directive(format!("commitlint_github={}", level).parse()?)
        .add_directive(format!("commitlint_bot={}", level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_file(verbose >= 3)
        .with_line_number(verbose >= 3);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "commitlint-bot")]
#[command(about = "Lint pull request commit messages and report them on GitHub")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML)
    #[arg(short, long, env = "COMMITLINT_BOT_CONFIG", global = true)]
    config: Option<String>,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output logs as JSON (for machine parsing)
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one delivered webhook event
    Handle {
        /// Event name as sent in X-GitHub-Event (e.g. pull_request)
        #[arg(short, long)]
        event: String,
        /// Payload file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        payload: String,
        /// GitHub token (defaults to GITHUB_TOKEN env var)
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// GitHub API base URL
        #[arg(long, env = "GITHUB_API_URL")]
        api_url: Option<String>,
        /// Never comment on the pull request
        #[arg(long)]
        no_comment: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Lint a commit message locally
    Lint {
        /// Commit message (reads stdin when neither this nor --file is given)
        message: Option<String>,
        /// Read the message from a file
        #[arg(short, long, conflicts_with = "message")]
        file: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet, cli.log_json)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Handle {
            event,
            payload,
            token,
            api_url,
            no_comment,
            json,
        } => {
            let mut config = config;
            if token.is_some() {
                config.github.token = token;
            }
            if let Some(api_url) = api_url {
                config.github.api_url = api_url;
            }
            if no_comment {
                config.comment.enabled = false;
            }
            config.validate()?;
            handle_event(&config, &event, &payload, json).await?;
        }
        Commands::Lint {
            message,
            file,
            json,
        } => {
            let message = read_message(message, file.as_deref())?;
            let linter = ConventionalLinter::new(config.lint.clone());
            let result = linter.lint(&message)?;
            print_lint_result(&result, json)?;
            if !result.valid {
                std::process::exit(1);
            }
        }
        Commands::Config => {
            print!("{}", config.redacted().to_yaml()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<BotConfig> {
    match path {
        Some(path) => {
            let path = shellexpand::tilde(path).to_string();
            let config = BotConfig::from_yaml_file(&path)
                .with_context(|| format!("Failed to load configuration from {}", path))?;
            info!(path = %path, "Loaded configuration");
            Ok(config)
        }
        None => Ok(BotConfig::default()),
    }
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read stdin")?;
        Ok(input)
    } else {
        let path = shellexpand::tilde(source).to_string();
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))
    }
}

fn read_message(message: Option<String>, file: Option<&Path>) -> Result<String> {
    match (message, file) {
        (Some(message), _) => Ok(message),
        (None, Some(file)) => read_input(&file.to_string_lossy()),
        (None, None) => read_input("-"),
    }
}

/// Run one delivered event through the dispatcher against the real API
async fn handle_event(config: &BotConfig, event_type: &str, payload: &str, json: bool) -> Result<()> {
    if config.github.token.is_none() {
        warn!("No GitHub token configured. Requests will be unauthenticated.");
        warn!("Set GITHUB_TOKEN environment variable or use --token flag.");
    }

    let payload = read_input(payload)?;

    let github = GitHubClient::with_settings(&config.github)?;
    let linter = ConventionalLinter::new(config.lint.clone());
    let ctx = BotContext::new(Arc::new(github), Arc::new(linter))
        .with_comment_policy(config.comment);
    let dispatcher = Dispatcher::new(ctx);

    let outcome = dispatcher.dispatch_json(event_type, &payload).await?;

    match &outcome {
        DispatchOutcome::Handled { kind, report } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "event": kind.as_tag(),
                        "handled": true,
                        "report": report,
                    }))?
                );
            } else {
                println!("Event:          {}", kind);
                println!("State:          {}", report.state);
                println!("Commits:        {}", report.outcome.commits);
                println!("Problems:       {}", report.outcome.errors_count);
                println!("Warnings:       {}", report.outcome.warnings_count);
                println!(
                    "Comment posted: {}",
                    if report.comment_posted { "yes" } else { "no" }
                );
            }
        }
        DispatchOutcome::Unhandled { tag } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "event": tag,
                        "handled": false,
                    }))?
                );
            } else {
                println!("Ignored event: {}", tag);
            }
        }
    }

    Ok(())
}

fn print_lint_result(result: &LintResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for error in &result.errors {
        println!("✖   {}", error);
    }
    for warning in &result.warnings {
        println!("⚠   {}", warning);
    }
    println!();
    println!(
        "{}   found {} problems, {} warnings",
        if result.valid { "✔" } else { "✖" },
        result.errors.len(),
        result.warnings.len()
    );

    Ok(())
}
