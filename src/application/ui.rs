#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use anyhow::Result;
use tokio::io;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::ChatModel;
use crate::domain::models::ChatStatus;
use crate::domain::models::Event;
use crate::domain::models::SlashCommand;
use crate::domain::models::AVAILABLE_MODELS;
use crate::domain::services::ChatSession;

const GENERIC_ERROR: &str = "Something went wrong. Please check your API key.";
const PROMPT: &str = "> ";

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /models (/ml) - Lists all models a chat session can select.
- /model (/m) [MODEL_ID,MODEL_INDEX] - Sets the specified model as the active model. You can pass either the model id, or the index from /models
- /retry (/r) - Resends the last message after an error.
- /quit /exit (/q) - Exit streamchat.
- /help (/h) - Provides this help menu.

HOTKEYS:
- CTRL+C - Stop the response if one is streaming, otherwise exit.
        "#;

    return text.trim().to_string();
}

/// Terminal rendering of a chat session. Every handler appends whatever should
/// be printed to `out`, and returns the action for the streaming client, if any.
pub struct Console {
    pub session: ChatSession,
    quit: bool,
    printed_message_id: Option<String>,
    printed_len: usize,
}

impl Console {
    pub fn new(model: &str) -> Console {
        return Console {
            session: ChatSession::new(model),
            quit: false,
            printed_message_id: None,
            printed_len: 0,
        };
    }

    pub fn should_quit(&self) -> bool {
        return self.quit;
    }

    pub fn intro(&self) -> String {
        return format!(
            "Chatting with {}. Type /help for commands.\n{PROMPT}",
            ChatModel::display_name(self.session.model())
        );
    }

    pub fn on_line(&mut self, line: &str, out: &mut String) -> Option<Action> {
        if line.trim().is_empty() {
            if !self.session.status.is_loading() {
                out.push_str(PROMPT);
            }
            return None;
        }

        if let Some(command) = SlashCommand::parse(line) {
            return self.on_command(command, out);
        }

        if self.session.status.is_loading() {
            out.push_str("Still answering. Press CTRL+C to stop the response first.\n");
            return None;
        }

        self.session.set_input(line);
        let request = self.session.submit()?;
        return Some(Action::SendRequest(self.session.generation(), request));
    }

    pub fn on_event(&mut self, event: Event, out: &mut String) {
        let was_loading = self.session.status.is_loading();

        match event {
            Event::StreamChunk(generation, chunk) => {
                self.session.handle_chunk(generation, chunk);
            }
            Event::StreamFailed(generation, error_text) => {
                self.session.handle_failure(generation, &error_text);
            }
        }

        self.render_stream(out);

        if was_loading && !self.session.status.is_loading() {
            self.render_end(out);
        }
    }

    pub fn on_interrupt(&mut self, out: &mut String) -> Option<Action> {
        if self.session.stop() {
            out.push_str(&format!("\n{}\n{PROMPT}", Paint::yellow("[stopped]")));
            return Some(Action::Abort());
        }

        self.quit = true;
        out.push('\n');
        return None;
    }

    fn on_command(&mut self, command: SlashCommand, out: &mut String) -> Option<Action> {
        if command.is_quit() {
            self.quit = true;
            if self.session.stop() {
                return Some(Action::Abort());
            }
            return None;
        }

        if command.is_help() {
            out.push_str(&format!("{}\n{PROMPT}", help_text()));
            return None;
        }

        if command.is_model_list() {
            let models = AVAILABLE_MODELS
                .iter()
                .enumerate()
                .map(|(idx, model)| {
                    let marker = if model.id == self.session.model() {
                        "*"
                    } else {
                        " "
                    };
                    return format!("{marker} {}. {} ({})", idx + 1, model.name, model.id);
                })
                .collect::<Vec<String>>()
                .join("\n");
            out.push_str(&format!("{models}\n{PROMPT}"));
            return None;
        }

        if command.is_model_set() {
            let selection = command.args.join(" ");
            let res = match ChatModel::parse_selection(&selection) {
                Some(model) => self
                    .session
                    .select_model(model.id)
                    .map(|_| return format!("Model set to {}.", model.name)),
                None => Err(anyhow::anyhow!("Unknown model {selection}. See /models.")),
            };
            match res {
                Ok(text) => out.push_str(&format!("{text}\n{PROMPT}")),
                Err(err) => out.push_str(&format!("{}\n{PROMPT}", Paint::red(err))),
            }
            return None;
        }

        if command.is_retry() {
            if let Some(request) = self.session.regenerate() {
                out.push_str("Retrying...\n");
                return Some(Action::SendRequest(self.session.generation(), request));
            }
            out.push_str("Nothing to retry right now.\n");
            if !self.session.status.is_loading() {
                out.push_str(PROMPT);
            }
            return None;
        }

        return None;
    }

    /// Prints the part of the streaming assistant message that has not been
    /// printed yet.
    fn render_stream(&mut self, out: &mut String) {
        let Some(message) = self.session.streaming_message() else {
            return;
        };

        if self.printed_message_id.as_deref() != Some(message.id.as_str()) {
            self.printed_message_id = Some(message.id.to_string());
            self.printed_len = 0;
            out.push_str(&format!("{} ", Paint::cyan("Assistant:").bold()));
        }

        let text = message.text();
        if let Some(rest) = text.get(self.printed_len..) {
            out.push_str(rest);
        }
        self.printed_len = text.len();
    }

    fn render_end(&mut self, out: &mut String) {
        if self.session.status == ChatStatus::Error {
            tracing::error!(error = ?self.session.error, "Chat request failed");
            out.push_str(&format!("\n{}\n", Paint::red(GENERIC_ERROR)));
            if !self.session.input().is_empty() {
                out.push_str(&format!(
                    "Your message was kept: {}\n",
                    Paint::new(self.session.input()).italic()
                ));
            }
            out.push_str(&format!("Type /retry to send it again.\n{PROMPT}"));
            return;
        }

        out.push_str(&format!("\n{PROMPT}"));
    }
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    mut rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut console = Console::new(&Config::get(ConfigKey::ChatModel));
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    stdout.write_all(console.intro().as_bytes()).await?;
    stdout.flush().await?;

    loop {
        let mut out = "".to_string();

        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if let Some(action) = console.on_line(&line, &mut out) {
                            tx.send(action)?;
                        }
                    }
                    None => {
                        if let Some(action) = console.on_interrupt(&mut out) {
                            tx.send(action)?;
                        }
                        console.quit = true;
                    }
                }
            }
            Some(event) = rx.recv() => {
                console.on_event(event, &mut out);
            }
            _ = signal::ctrl_c() => {
                if let Some(action) = console.on_interrupt(&mut out) {
                    tx.send(action)?;
                }
            }
        }

        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;

        if console.should_quit() {
            break;
        }
    }

    return Ok(());
}
