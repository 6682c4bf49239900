use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use palisade::config::ModerationConfig;
use palisade::moderator::{Moderator, RequestContext};
use palisade::output::terminal;
use palisade::types::ModerationAction;

/// Palisade: tiered, cost-aware content moderation.
///
/// Obvious cases are decided locally in well under a millisecond; ambiguous
/// ones escalate through a remote classifier and a council of classifiers,
/// with humans as the final tier.
#[derive(Parser)]
#[command(name = "palisade", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Moderate a piece of text through the full tier pipeline
    Moderate {
        /// The text to moderate
        text: String,

        /// Preceding conversation turns, oldest first (repeatable)
        #[arg(long = "context")]
        context: Vec<String>,

        /// Print the full result as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },

    /// Local-only check: no network calls
    QuickCheck {
        /// The text to check
        text: String,
    },

    /// Show the pending human-review queue
    Queue,

    /// Record a human decision for a queued item
    Decide {
        /// Review item id (e.g. hr-3)
        id: String,

        /// The decision: allow or deny
        #[arg(value_parser = parse_action)]
        decision: ModerationAction,
    },

    /// Show aggregate decision stats
    Stats,

    /// Export the audit log as JSON
    ExportAudit,
}

fn parse_action(raw: &str) -> Result<ModerationAction, String> {
    match raw {
        "allow" => Ok(ModerationAction::Allow),
        "deny" => Ok(ModerationAction::Deny),
        _ => Err(format!("expected allow or deny, got {raw:?}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any configuration
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = ModerationConfig::load()?;
    let moderator = Moderator::new(config)?;

    match cli.command {
        Commands::Moderate {
            text,
            context,
            json,
        } => {
            let request_context = if context.is_empty() {
                None
            } else {
                Some(RequestContext {
                    conversation: context,
                })
            };
            let result = moderator.moderate(&text, request_context).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                terminal::print_result(&text, &result);
            }
        }

        Commands::QuickCheck { text } => {
            let check = moderator.quick_check(&text);
            let verdict = if check.flagged {
                "flagged".red().bold()
            } else {
                "clean".green().bold()
            };
            println!(
                "{verdict}  severity {:.2}  ({} ms)",
                check.severity, check.latency_ms
            );
        }

        Commands::Queue => {
            let items = moderator.get_human_review_queue().await;
            terminal::print_queue(&items);
        }

        Commands::Decide { id, decision } => {
            if moderator.submit_human_decision(&id, decision).await {
                println!("{} recorded {} for {}", "OK".green().bold(), decision, id);
            } else {
                println!(
                    "{} {} is unknown or already decided",
                    "Failed:".red().bold(),
                    id
                );
            }
        }

        Commands::Stats => {
            let stats = moderator.get_stats().await;
            terminal::print_stats(&stats);
        }

        Commands::ExportAudit => {
            println!("{}", moderator.export_audit_log().await?);
        }
    }

    Ok(())
}
