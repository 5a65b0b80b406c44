//! `panepilot chat` — Interactive or single-message chat mode.
//!
//! Runs inside an existing tmux session: a secondary pane is created at
//! startup and every command the model executes is typed there, visible
//! to the user. Ctrl+C cancels an in-flight turn; at the prompt it exits.

use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use panepilot_agent::{AgentStreamEvent, ChannelSink, TurnRunner, SYSTEM_PROMPT};
use panepilot_config::AppConfig;
use panepilot_core::Conversation;
use panepilot_pane::{PaneController, PaneOptions, Tmux};
use panepilot_tools::ToolDispatcher;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early, with a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PANEPILOT_API_KEY = 'sk-...'   (preferred)");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!(
            "    {}",
            AppConfig::config_dir().join("config.toml").display()
        );
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    // The pane is a hard dependency: refuse to start outside tmux.
    let pane = Arc::new(
        PaneController::create(
            Arc::new(Tmux),
            PaneOptions {
                settle: Duration::from_millis(config.pane.settle_ms),
                clear_before_execute: config.pane.clear_before_execute,
            },
        )
        .await?,
    );

    let provider = panepilot_providers::build_from_config(&config);
    let dispatcher = ToolDispatcher::new(pane.clone());

    let (sink, mut events) = ChannelSink::new();
    let runner = TurnRunner::new(provider, dispatcher, Arc::new(sink), &config.model)
        .with_temperature(config.temperature)
        .with_max_tokens(Some(config.max_tokens))
        .with_max_chain_depth(config.agent.max_chain_depth);

    // Render events as they arrive; the runner never waits on this.
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                AgentStreamEvent::Delta { content } => {
                    print!("{content}");
                    let _ = std::io::stdout().flush();
                }
                AgentStreamEvent::Refusal { content } => {
                    println!();
                    println!("  [refused] {content}");
                }
                AgentStreamEvent::ToolCall { name, arguments, .. } => {
                    println!();
                    println!("  [tool] {name} {arguments}");
                }
                AgentStreamEvent::ToolResult { output, .. } => {
                    for line in output.lines() {
                        println!("  | {line}");
                    }
                }
                AgentStreamEvent::Done { .. } => {
                    println!();
                }
                AgentStreamEvent::Error { message } => {
                    println!();
                    eprintln!("  [error] {message}");
                }
            }
        }
    });

    let mut conversation = Conversation::new(SYSTEM_PROMPT);

    let result = if let Some(msg) = message {
        run_one(&runner, &mut conversation, &msg).await
    } else {
        interactive(&runner, &mut conversation, &config).await
    };

    // Tear the pane down whatever happened above.
    pane.stop().await?;
    drop(runner);
    let _ = printer.await;

    result
}

/// Single-message mode: one chain, then exit.
async fn run_one(
    runner: &TurnRunner,
    conversation: &mut Conversation,
    message: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    run_cancellable(runner, conversation, message, &cancel).await?;
    Ok(())
}

async fn interactive(
    runner: &TurnRunner,
    conversation: &mut Conversation,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  PanePilot — commands run in the pane on the right");
    println!();
    println!("  Model:  {}", config.model);
    println!("  Type your request and press Enter.");
    println!("  Ctrl+C cancels a running turn; 'exit' quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let cancel = CancellationToken::new();
        if let Err(e) = run_cancellable(runner, conversation, line, &cancel).await {
            debug!(error = %e, "Turn failed");
        }
        println!();
    }

    println!("  Goodbye!");
    Ok(())
}

/// Run one chain, cancelling it if Ctrl+C arrives while it is in flight.
async fn run_cancellable(
    runner: &TurnRunner,
    conversation: &mut Conversation,
    input: &str,
    cancel: &CancellationToken,
) -> panepilot_core::Result<()> {
    let run = runner.run(conversation, input, cancel);
    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => return result,
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                eprintln!("  (cancelling)");
                cancel.cancel();
            }
        }
    }
}
