use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use counterpoint::{
    Calibration, CliConfig, DebateEngine, Intervention, JsonFileStore, NewSessionRequest, Session,
    TurnOutcome, build_gateway,
};

/// Counterpoint CLI: argue a decision with yourself, then get a verdict
#[derive(Parser, Debug)]
#[command(name = "counterpoint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new debate session
    New {
        /// The decision you are weighing
        #[arg(short, long)]
        decision: String,

        /// Free-text background for the personas
        #[arg(long, default_value = "")]
        context: String,

        /// Hard constraints the personas must respect
        #[arg(long, default_value = "")]
        constraints: String,

        /// What you are optimizing for
        #[arg(long, default_value = "")]
        optimizing_for: String,

        /// Risk tolerance slider (0-100)
        #[arg(long, default_value = "50")]
        risk: u8,

        /// Time horizon slider (0=short-term, 100=long-term)
        #[arg(long, default_value = "50")]
        horizon: u8,

        /// Social/relationship impact sensitivity (0-100)
        #[arg(long, default_value = "50")]
        social: u8,

        /// Money sensitivity (0-100)
        #[arg(long, default_value = "50")]
        money: u8,

        /// Owning user id
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Generate the next persona turn
    Turn {
        session_id: String,

        /// Push back on the current line of argument
        #[arg(long, conflicts_with_all = ["reframe", "clarify", "undo"])]
        pushback: Option<String>,

        /// Reframe the decision statement
        #[arg(long, conflicts_with_all = ["pushback", "clarify", "undo"])]
        reframe: Option<String>,

        /// Ask the next persona to state assumptions and one question
        #[arg(long, conflicts_with_all = ["pushback", "reframe", "undo"])]
        clarify: bool,

        /// Remove the most recent transcript message
        #[arg(long, conflicts_with_all = ["pushback", "reframe", "clarify"])]
        undo: bool,
    },

    /// Synthesize the debate into a verdict
    Verdict { session_id: String },

    /// Pin (or unpin) a transcript message as a highlight
    Pin {
        session_id: String,
        message_id: String,

        #[arg(long)]
        unpin: bool,
    },

    /// Record your final decision against the verdict
    Decide {
        session_id: String,

        #[arg(short, long)]
        decision: String,

        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Print a session transcript
    Show { session_id: String },

    /// List sessions for a user, newest first
    List {
        #[arg(short, long, default_value = "local")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = CliConfig::load_or_default(cli.config.as_ref())?;

    let store = Arc::new(
        JsonFileStore::new(config.store.sessions_dir.clone())
            .context("failed to open session store")?,
    );
    let gateway = build_gateway(&config.gateway).context("failed to configure gateway")?;
    let engine = DebateEngine::new(store, gateway);

    match cli.command {
        Command::New {
            decision,
            context,
            constraints,
            optimizing_for,
            risk,
            horizon,
            social,
            money,
            user,
        } => {
            let session = engine
                .create_session(NewSessionRequest {
                    user_id: user,
                    decision,
                    context,
                    constraints,
                    optimizing_for,
                    calibration: Calibration {
                        risk_tolerance: risk,
                        time_horizon: horizon,
                        social_impact: social,
                        money_sensitivity: money,
                    },
                })
                .await?;

            info!(session_id = %session.id, "session created");
            println!("Session {} created.", session.id);
            if let Some(summary) = &session.summary {
                println!("\nSummary: {summary}");
            }
            if !session.assumptions.is_empty() {
                println!("\nKey assumptions:");
                for a in &session.assumptions {
                    println!("  - {a}");
                }
            }
            println!("\nStart the debate with: counterpoint turn {}", session.id);
        }

        Command::Turn {
            session_id,
            pushback,
            reframe,
            clarify,
            undo,
        } => {
            let intervention = if undo {
                Some(Intervention::Undo)
            } else if let Some(message) = pushback {
                Some(Intervention::Pushback(message))
            } else if let Some(message) = reframe {
                Some(Intervention::Reframe(message))
            } else if clarify {
                Some(Intervention::Clarify)
            } else {
                None
            };

            let was_undo = matches!(intervention, Some(Intervention::Undo));
            let outcome = engine.take_turn(&session_id, intervention).await?;
            print_turn(&outcome, was_undo);
        }

        Command::Verdict { session_id } => {
            let session = engine.synthesize(&session_id).await?;
            print_verdict(&session);
        }

        Command::Pin {
            session_id,
            message_id,
            unpin,
        } => {
            engine.set_pinned(&session_id, &message_id, !unpin).await?;
            println!(
                "Message {message_id} {}.",
                if unpin { "unpinned" } else { "pinned" }
            );
        }

        Command::Decide {
            session_id,
            decision,
            reason,
        } => {
            engine.record_decision(&session_id, decision, reason).await?;
            println!("Final decision recorded.");
        }

        Command::Show { session_id } => {
            let session = engine.load_session(&session_id).await?;
            print_session(&session);
        }

        Command::List { user } => {
            let sessions = engine.list_sessions(&user).await?;
            if sessions.is_empty() {
                println!("No sessions for {user}.");
            }
            for s in sessions {
                println!(
                    "{}  [{:?}]  turns={}  {}",
                    s.id, s.state, s.turn_count, s.decision
                );
            }
        }
    }

    Ok(())
}

fn print_turn(outcome: &TurnOutcome, was_undo: bool) {
    if was_undo {
        println!(
            "Last message removed. {} messages remain, turn count {}.",
            outcome.session.messages.len(),
            outcome.session.turn_count
        );
        return;
    }

    if let Some(message) = outcome.session.messages.last() {
        println!("[{}] (heat {})", message.role.tag(), outcome.heat);
        println!("{}", message.content);
        if !message.assumptions.is_empty() {
            println!("\nAssumptions:");
            for a in &message.assumptions {
                println!("  - {a}");
            }
        }
    }

    if outcome.should_end {
        println!(
            "\nTurn {} reached - time to synthesize: counterpoint verdict {}",
            outcome.session.turn_count, outcome.session.id
        );
    }
}

fn print_session(session: &Session) {
    println!("Session {}  [{:?}]", session.id, session.state);
    println!("Decision: {}", session.decision);
    if let Some(summary) = &session.summary {
        println!("Summary: {summary}");
    }
    println!("Turns: {}\n", session.turn_count);

    for m in &session.messages {
        let pin = if m.pinned { " *" } else { "" };
        println!("[{}]{} {}", m.role.tag(), pin, m.content);
    }

    if session.verdict.is_some() {
        print_verdict(session);
    }
}

fn print_verdict(session: &Session) {
    let Some(verdict) = &session.verdict else {
        return;
    };

    println!("\n========================================");
    println!("Verdict for session {}", session.id);
    println!("========================================");
    println!("\nBest points - Risk-Taker:");
    for p in &verdict.best_points_a {
        println!("  - {p}");
    }
    println!("\nBest points - Pragmatist:");
    for p in &verdict.best_points_b {
        println!("  - {p}");
    }
    if !verdict.shared_facts.is_empty() {
        println!("\nShared facts:");
        for f in &verdict.shared_facts {
            println!("  - {f}");
        }
    }
    if !verdict.open_questions.is_empty() {
        println!("\nOpen questions:");
        for q in &verdict.open_questions {
            println!("  - {q}");
        }
    }
    println!("\nRecommended next step: {}", verdict.recommended_next_step);

    if let Some(decision) = &verdict.user_decision {
        println!("\nYour decision: {decision}");
        if let Some(reason) = &verdict.user_reason {
            println!("Your reasoning: {reason}");
        }
    }
}
