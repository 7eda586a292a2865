use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

use mentor_application::{SessionHandle, TurnError, TurnInput, TurnOrchestrator, TurnOutcome, build_orchestrator};
use mentor_core::config::MentorConfig;
use mentor_core::session::SkillLevel;
use mentor_execution::RoutingEvent;
use mentor_infrastructure::TomlSessionRepository;

const COMMANDS: &[&str] = &["/help", "/status", "/image", "/quit"];

/// REPL helper providing slash-command completion, highlighting and hints.
#[derive(Clone)]
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

/// Runs the interactive tutoring loop.
pub async fn run(
    config: MentorConfig,
    session_id: Option<String>,
    skill: SkillLevel,
    mut events: Option<UnboundedReceiver<RoutingEvent>>,
) -> Result<()> {
    let repository = Arc::new(TomlSessionRepository::from_config(&config.storage)?);
    let orchestrator = build_orchestrator(config, repository)?;
    let handle = open_session(&orchestrator, session_id, skill).await?;
    let id = handle.lock().await.id.clone();
    tracing::info!(session_id = %id, skill = %skill, "Chat session started");

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!("{}", "=== MENTOR ===".bright_magenta().bold());
    println!("{}", format!("Session {id}").bright_black());
    println!(
        "{}",
        "Describe your project or ask a question. '/help' lists commands, '/quit' exits.".bright_black()
    );
    println!();

    let mut pending_image: Option<String> = None;

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(&line);

        match trimmed.split_once(' ').map_or((trimmed, ""), |(c, rest)| (c, rest.trim())) {
            ("/quit" | "/exit", _) => break,
            ("/help", _) => print_help(),
            ("/status", _) => print_status(&handle).await,
            ("/image", summary) if !summary.is_empty() => {
                pending_image = Some(summary.to_string());
                println!("{}", "Image summary attached to your next message.".bright_black());
            }
            ("/image", _) => println!("{}", "Usage: /image <description of the image>".yellow()),
            (cmd, _) if cmd.starts_with('/') => {
                println!("{}", format!("Unknown command {cmd}").bright_black())
            }
            _ => {
                let mut input = TurnInput::text(trimmed);
                if let Some(summary) = pending_image.take() {
                    input = input.with_image_summary(summary);
                }
                match run_turn(&orchestrator, &handle, input).await {
                    Ok(outcome) => print_outcome(&outcome),
                    Err(TurnError::Cancelled) => {
                        tracing::info!(session_id = %id, "Turn cancelled by user");
                        println!("{}", "Turn cancelled; nothing was recorded.".yellow())
                    }
                }
                if let Some(rx) = events.as_mut() {
                    print_events(rx);
                }
            }
        }
    }

    orchestrator.sessions().end(&id, false).await?;
    tracing::info!(session_id = %id, "Chat session ended");
    println!("{}", format!("Session {id} saved. Resume with --session {id}").bright_green());
    Ok(())
}

async fn open_session(
    orchestrator: &TurnOrchestrator,
    session_id: Option<String>,
    skill: SkillLevel,
) -> Result<SessionHandle> {
    let sessions = orchestrator.sessions();
    let Some(id) = session_id else {
        return Ok(sessions.create(skill).await?);
    };
    match sessions.load(&id).await {
        Ok(handle) => Ok(handle),
        Err(e) if e.is_session_corruption() => {
            tracing::warn!(
                session_id = %id,
                error = %e,
                "Stored session unreadable, starting fresh"
            );
            eprintln!("{}", format!("{e}. Starting a fresh session.").yellow());
            Ok(sessions.create(skill).await?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs one turn; CTRL-C while it runs cancels it.
async fn run_turn(
    orchestrator: &TurnOrchestrator,
    handle: &SessionHandle,
    input: TurnInput,
) -> Result<TurnOutcome, TurnError> {
    let cancel = CancellationToken::new();
    let turn = orchestrator.handle_turn(handle, input, &cancel);
    tokio::pin!(turn);
    tokio::select! {
        outcome = &mut turn => outcome,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            turn.await
        }
    }
}

fn print_help() {
    println!("{}", "/status            phase, progress and turn count".bright_black());
    println!("{}", "/image <summary>   attach an image description to the next message".bright_black());
    println!("{}", "/quit              save and exit".bright_black());
}

async fn print_status(handle: &SessionHandle) {
    let session = handle.lock().await;
    println!(
        "{}",
        format!(
            "Phase: {} ({:.0}% through the {} model), {} learner turns, skill {}",
            session.phase.current_phase(),
            session.phase.progress_fraction() * 100.0,
            session.phase.model(),
            session.learner_turn_count(),
            session.skill_level
        )
        .bright_black()
    );
}

fn print_outcome(outcome: &TurnOutcome) {
    let reply = &outcome.reply;
    println!();
    for line in reply.text.lines() {
        println!("{}", line.bright_blue());
    }
    for citation in &reply.citations {
        let source = citation.url.as_deref().unwrap_or("built-in corpus");
        println!("{}", format!("  [{}] {}", citation.title, source).bright_black());
    }
    if let Some(transition) = &outcome.phase_transition {
        println!(
            "{}",
            format!("Moving from {} to {}.", transition.from, transition.to).bright_green()
        );
    }
    if reply.is_degraded() {
        let roles: Vec<String> = reply.degraded_roles.iter().map(|r| r.to_string()).collect();
        println!("{}", format!("(partial reply: {} unavailable)", roles.join(", ")).yellow());
    }
    println!();
}

fn print_events(rx: &mut UnboundedReceiver<RoutingEvent>) {
    while let Ok(event) = rx.try_recv() {
        let fields: Vec<String> = event
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!(
            "{}",
            format!("  [{}] {} {}", event.target, event.message, fields.join(" ")).bright_black()
        );
    }
}
