#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

use std::io::Write;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::error::TryRecvError;
use yansi::Paint;

use crate::domain::models::ChatEvent;
use crate::domain::models::ChatRole;
use crate::domain::models::ChatState;
use crate::domain::models::ConversationHistory;
use crate::domain::models::HistoryLog;
use crate::domain::models::SlashCommand;
use crate::domain::services::ChatClient;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /host (/server) [HOST:PORT] - Deletes the current session, switches to another Gemstone server, and opens a new session there.
- /model (/m) [MODEL_ID] - Replaces the current session with one for another model.
- /quit /exit (/q) - Delete the session and exit.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

/// Turns one turn's events into terminal output and collects the assistant's
/// visible reply for the history.
#[derive(Default)]
pub struct Transcript {
    reply: String,
    thinking_secs: f32,
}

impl Transcript {
    /// Adds up the per chunk thinking time reported by the state stream.
    /// Laps that the stream coalesced into a later state are not counted.
    pub fn observe(&mut self, state: &ChatState) {
        if let ChatState::Thinking(elapsed) = state {
            self.thinking_secs += *elapsed;
        }
    }

    /// Returns the text to print for `event`, plus the finished reply once the
    /// message is complete.
    pub fn render(&mut self, event: &ChatEvent) -> (String, Option<String>) {
        match event {
            ChatEvent::ThinkingStarted => {
                return (Paint::new("Thinking...\n").dimmed().to_string(), None);
            }
            ChatEvent::TextReceived {
                content,
                is_thinking: true,
            } => {
                return (Paint::new(content).dimmed().to_string(), None);
            }
            ChatEvent::ThinkingEnded => {
                let secs = std::mem::take(&mut self.thinking_secs);
                let line = format!("\nThought for {secs:.1}s\n\n");
                return (Paint::new(line).dimmed().italic().to_string(), None);
            }
            ChatEvent::TextReceived {
                content,
                is_thinking: false,
            } => {
                self.reply += content;
                return (content.to_string(), None);
            }
            ChatEvent::ToolCallReceived(payload) => {
                let line = format!("\n[tool call] {payload}\n");
                return (Paint::yellow(line).to_string(), None);
            }
            ChatEvent::ErrorOccurred(err) => {
                return (Paint::red(format!("\n{err}\n")).to_string(), None);
            }
            ChatEvent::MessageComplete => {
                self.thinking_secs = 0.0;
                let reply = std::mem::take(&mut self.reply);
                return ("\n".to_string(), Some(reply));
            }
        }
    }
}

fn show(output: &str) -> Result<()> {
    print!("{output}");
    std::io::stdout().flush()?;
    return Ok(());
}

fn print_error(msg: &str) {
    eprintln!("{}", Paint::red(msg));
}

fn render_event(
    transcript: &mut Transcript,
    event: Result<ChatEvent, RecvError>,
) -> Result<Option<String>> {
    let event = match event {
        Ok(event) => event,
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Renderer fell behind the event stream");
            return Ok(None);
        }
        Err(RecvError::Closed) => return Ok(None),
    };

    let (output, reply) = transcript.render(&event);
    show(&output)?;

    return Ok(reply);
}

/// Sends `text` and renders its events while the reply streams in. The
/// assistant's reply is appended to `history` only when the stream completed;
/// whatever a failed turn printed is discarded with its transcript.
pub async fn run_turn(
    client: &mut ChatClient,
    text: &str,
    history: &mut ConversationHistory,
) -> Result<()> {
    let mut events = client.subscribe_events();
    let mut states = client.subscribe_state();
    let mut transcript = Transcript::default();
    let mut reply = None;

    let res = {
        let send = client.send_message(text, history);
        tokio::pin!(send);

        loop {
            tokio::select! {
                biased;
                res = &mut send => break res,
                Ok(_) = states.changed() => {
                    transcript.observe(&states.borrow_and_update());
                }
                event = events.recv() => {
                    if let Some(done) = render_event(&mut transcript, event)? {
                        reply = Some(done);
                    }
                }
            }
        }
    };

    loop {
        let event = match events.try_recv() {
            Ok(event) => Ok(event),
            Err(TryRecvError::Lagged(skipped)) => Err(RecvError::Lagged(skipped)),
            Err(_) => break,
        };
        if let Some(done) = render_event(&mut transcript, event)? {
            reply = Some(done);
        }
    }

    if let Err(err) = res {
        print_error(&format!("Message failed: {err}"));
        return Ok(());
    }

    if let Some(reply) = reply.filter(|reply| return !reply.is_empty()) {
        history.append(ChatRole::Assistant, &reply);
    }

    if let ChatState::Error(err) = client.state() {
        print_error(&err);
    }

    return Ok(());
}

/// Line oriented chat loop over stdin. Returns when the user quits or stdin
/// closes.
pub async fn start(mut client: ChatClient, model: &str) -> Result<()> {
    let mut model = model.to_string();
    let mut history = ConversationHistory::new();

    match client.initialize_model(&model).await {
        Ok(session_id) => println!(
            "Connected to {} with model {model} (session {session_id}). Type /help for commands.",
            client.endpoint()
        ),
        Err(err) => print_error(&format!("Failed to create session: {err}")),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        show(&Paint::new("> ").bold().to_string())?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Some(command) = SlashCommand::parse(&line) {
            if command.is_quit() {
                break;
            }
            if command.is_help() {
                println!("{}", help_text());
                continue;
            }

            let value = match command.value() {
                Some(value) => value.to_string(),
                None => {
                    print_error("This command needs a value. Run /help for details.");
                    continue;
                }
            };

            let res = if command.is_host_set() {
                client.switch_endpoint(&value, &model).await
            } else {
                model = value;
                client.initialize_model(&model).await
            };

            match res {
                Ok(session_id) => println!(
                    "Using {} with model {model} (session {session_id})",
                    client.endpoint()
                ),
                Err(err) => print_error(&format!("Failed to create session: {err}")),
            }
            continue;
        }

        run_turn(&mut client, &line, &mut history).await?;
    }

    client.delete_session().await;
    client.close();

    return Ok(());
}
