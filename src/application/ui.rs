#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use owo_colors::Style;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageKind;
use crate::domain::models::NoticeLevel;
use crate::domain::models::RenderIntent;
use crate::domain::models::Sender;
use crate::domain::models::SlashCommand;
use crate::domain::models::TicketRecord;
use crate::domain::models::TicketStatus;
use crate::domain::models::View;
use crate::domain::services::Attachments;
use crate::domain::services::ChatState;
use crate::domain::services::SessionStore;
use crate::domain::services::Synchronizer;

/// Categories offered on the menu, in the order they are numbered. The web
/// widget takes these from its menu buttons, not from the backend, so any
/// other name still goes through as typed with `/new <name>`.
pub const CATEGORIES: [&str; 3] = ["Suporte", "Financeiro", "Comercial"];

pub fn help_text() -> String {
    let text = r#"
MENU:
- Type the number of a category to open a ticket in it.
- /t, /tickets (/history) - List tickets opened from this device.
- /r [n], /resume [n] - Resume the nth ticket from the last listed tickets.

COMMANDS:
- /n [category], /new [category] - Open a ticket in a category.
- /a [path], /attach [path] - Send a file to the agent.
- /m, /mic - Start recording a voice note, or stop and send it.
- /b, /back (/menu) - Leave the chat and go back to the menu.
- /p, /panel - Close or reopen the chat panel.
- /h, /help - Print this help text.
- /q, /quit (/exit) - Exit chatdesk.
"#;

    return text.trim().to_string();
}

/// What a line typed by the visitor asks for.
pub enum Input {
    Attach(path::PathBuf),
    Event(Event),
    Help,
    Ignored,
    Invalid(String),
    Quit,
}

fn pick<T: Clone>(items: &[T], text: &str) -> Option<T> {
    let idx = text.trim().parse::<usize>().ok()?;
    if idx == 0 {
        return None;
    }

    return items.get(idx - 1).cloned();
}

pub fn parse_input(line: &str, view: View, tickets: &[TicketRecord]) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Ignored;
    }

    if line.starts_with('/') {
        let cmd = match SlashCommand::parse(line) {
            Some(cmd) => cmd,
            None => return Input::Invalid(format!("Comando desconhecido: {line}")),
        };

        if cmd.is_quit() {
            return Input::Quit;
        }
        if cmd.is_help() {
            return Input::Help;
        }
        if cmd.is_back() {
            return Input::Event(Event::BackPressed());
        }
        if cmd.is_history() {
            return Input::Event(Event::HistoryRequested());
        }
        if cmd.is_mic() {
            return Input::Event(Event::MicToggled());
        }
        if cmd.is_panel() {
            return Input::Event(Event::PanelToggled());
        }
        if cmd.is_new_ticket() {
            let category = cmd.arg_text();
            if let Some(category) = pick(&CATEGORIES, &category) {
                return Input::Event(Event::CategorySelected(category.to_string()));
            }
            if category.is_empty() {
                return Input::Invalid("Informe uma categoria.".to_string());
            }
            return Input::Event(Event::CategorySelected(category));
        }
        if cmd.is_resume() {
            match pick(tickets, &cmd.arg_text()) {
                Some(ticket) => return Input::Event(Event::TicketResumed(ticket)),
                None => return Input::Invalid("Ticket não encontrado.".to_string()),
            }
        }
        if cmd.is_attach() {
            let file_path = cmd.arg_text();
            if file_path.is_empty() {
                return Input::Invalid("Informe o caminho do arquivo.".to_string());
            }
            return Input::Attach(path::PathBuf::from(file_path));
        }

        return Input::Ignored;
    }

    match view {
        View::Menu => {
            if let Some(category) = pick(&CATEGORIES, line) {
                return Input::Event(Event::CategorySelected(category.to_string()));
            }
            return Input::Invalid("Escolha uma categoria pelo número.".to_string());
        }
        View::History => {
            if let Some(ticket) = pick(tickets, line) {
                return Input::Event(Event::TicketResumed(ticket));
            }
            return Input::Invalid("Ticket não encontrado.".to_string());
        }
        View::Chat => return Input::Event(Event::TextSubmitted(line.to_string())),
    }
}

/// Turns render intents into terminal lines. Keeps its own copy of what is
/// on screen so refreshed transcripts only print what is new.
pub struct Renderer {
    base_url: String,
    uploads_path: String,
    colored: bool,
    transcript: Vec<Message>,
    tickets: Vec<TicketRecord>,
    status: String,
    input: Option<(bool, String)>,
}

impl Renderer {
    pub fn new(base_url: &str, uploads_path: &str, colored: bool) -> Renderer {
        return Renderer {
            base_url: base_url.to_string(),
            uploads_path: uploads_path.to_string(),
            colored,
            transcript: vec![],
            tickets: vec![],
            status: "".to_string(),
            input: None,
        };
    }

    pub fn tickets(&self) -> &[TicketRecord] {
        return &self.tickets;
    }

    fn paint(&self, text: String, style: Style) -> String {
        if !self.colored {
            return text;
        }

        return text
            .if_supports_color(Stream::Stdout, |e| return e.style(style))
            .to_string();
    }

    pub fn format_message(&self, msg: &Message) -> String {
        let author = match msg.sender {
            Sender::User => "Você",
            Sender::Agent => "Atendente",
            Sender::Bot => "Assistente",
        };

        let body = match msg.attachment_url(&self.base_url, &self.uploads_path) {
            Some(url) if msg.kind == MessageKind::Audio => format!("[áudio] {url}"),
            Some(url) => format!("[arquivo] {url}"),
            None => msg.content.to_string(),
        };

        if msg.is_pending() {
            return format!("{author}: {body} (enviando)");
        }

        return format!("{author}: {body}");
    }

    fn message_line(&self, msg: &Message) -> String {
        let style = match msg.sender {
            Sender::User => Style::new().cyan(),
            Sender::Agent => Style::new().green(),
            Sender::Bot => Style::new().yellow(),
        };

        return self.paint(self.format_message(msg), style);
    }

    fn ticket_line(&self, idx: usize, ticket: &TicketRecord) -> String {
        let style = match ticket.status {
            TicketStatus::Open => Style::new().green(),
            TicketStatus::Closed => Style::new().dimmed(),
        };

        return self.paint(format!("{}. {}", idx + 1, ticket.format()), style);
    }

    /// Number of leading messages that are already on screen.
    fn shown_prefix(&self, messages: &[Message]) -> usize {
        return self
            .transcript
            .iter()
            .zip(messages.iter())
            .take_while(|(shown, msg)| {
                return shown.sender == msg.sender
                    && shown.kind == msg.kind
                    && shown.content == msg.content;
            })
            .count();
    }

    pub fn format_intent(&mut self, intent: RenderIntent) -> Vec<String> {
        match intent {
            RenderIntent::Alert { title, text } => {
                return vec![self.paint(format!("[{title}] {text}"), Style::new().red().bold())];
            }
            RenderIntent::AppendMessage(msg) => {
                let line = self.message_line(&msg);
                self.transcript.push(msg);
                return vec![line];
            }
            RenderIntent::ClearInput() => return vec![],
            RenderIntent::ClearTranscript() => {
                self.transcript.clear();
                return vec![self.paint("----".to_string(), Style::new().dimmed())];
            }
            RenderIntent::ConfirmMessage(id) => {
                if let Some(msg) = self.transcript.iter_mut().find(|e| return e.id == id) {
                    msg.confirm();
                }
                return vec![];
            }
            RenderIntent::Panel(open) => {
                if open {
                    return vec![];
                }
                return vec![self.paint(
                    "Chat minimizado. Use /p para reabrir.".to_string(),
                    Style::new().dimmed(),
                )];
            }
            RenderIntent::RemoveMessage(id) => {
                self.transcript.retain(|e| return e.id != id);
                return vec![];
            }
            RenderIntent::ReplaceTranscript(messages) => {
                let shown = self.shown_prefix(&messages);
                let lines = messages[shown..]
                    .iter()
                    .map(|msg| return self.message_line(msg))
                    .collect::<Vec<String>>();
                self.transcript = messages;
                return lines;
            }
            RenderIntent::SetInput {
                enabled,
                placeholder,
            } => {
                let next = Some((enabled, placeholder.to_string()));
                if self.input == next {
                    return vec![];
                }
                self.input = next;

                if enabled {
                    return vec![self.paint(format!("> {placeholder}"), Style::new().dimmed())];
                }
                return vec![self.paint(format!("x {placeholder}"), Style::new().dimmed())];
            }
            RenderIntent::SetRecording(recording) => {
                if recording {
                    return vec![self.paint(
                        "Gravando... use /m para enviar.".to_string(),
                        Style::new().red(),
                    )];
                }
                return vec![self.paint("Gravação finalizada.".to_string(), Style::new().dimmed())];
            }
            RenderIntent::SetStatus(status) => {
                if self.status == status {
                    return vec![];
                }
                self.status = status.to_string();
                return vec![self.paint(format!("== {status} =="), Style::new().bold())];
            }
            RenderIntent::ShowTickets(tickets) => {
                self.tickets = tickets;
                if self.tickets.is_empty() {
                    return vec!["Nenhum ticket encontrado.".to_string()];
                }

                return self
                    .tickets
                    .iter()
                    .enumerate()
                    .map(|(idx, ticket)| return self.ticket_line(idx, ticket))
                    .collect();
            }
            RenderIntent::ShowView(View::Menu) => {
                let mut lines = vec![self.paint(
                    "Como podemos ajudar?".to_string(),
                    Style::new().bold(),
                )];
                lines.append(
                    &mut CATEGORIES
                        .iter()
                        .enumerate()
                        .map(|(idx, category)| return format!("{}. {category}", idx + 1))
                        .collect::<Vec<String>>(),
                );
                return lines;
            }
            RenderIntent::ShowView(View::History) => {
                return vec![self.paint("Meus tickets".to_string(), Style::new().bold())];
            }
            RenderIntent::ShowView(View::Chat) => return vec![],
            RenderIntent::Toast(level, text) => {
                let style = match level {
                    NoticeLevel::Warning => Style::new().yellow(),
                    NoticeLevel::Error => Style::new().red(),
                };
                return vec![self.paint(format!("! {text}"), style)];
            }
        }
    }

    pub fn render(&mut self, intents: Vec<RenderIntent>) {
        for intent in intents {
            for line in self.format_intent(intent) {
                println!("{line}");
            }
        }
    }
}

async fn handle(state: &mut ChatState, renderer: &mut Renderer, event: Event) {
    match state.handle_event(event).await {
        Ok(intents) => renderer.render(intents),
        Err(err) => {
            tracing::error!(error = ?err, step = %state.step(), "failed to handle event");
            renderer.render(vec![RenderIntent::toast(
                NoticeLevel::Error,
                &err.to_string(),
            )]);
        }
    }
}

pub async fn start(
    action_tx: mpsc::UnboundedSender<Action>,
    event_tx: mpsc::UnboundedSender<Event>,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let store = SessionStore::load(SessionStore::default_path()).await?;
    let synchronizer = Synchronizer::default();
    tracing::debug!(
        poll_interval_ms = synchronizer.period().as_millis() as u64,
        "starting chat"
    );

    let mut state = ChatState::new(store, synchronizer, action_tx, event_tx);
    let mut renderer = Renderer::new(
        &Config::get(ConfigKey::BaseURL),
        &Config::get(ConfigKey::UploadsPath),
        true,
    );

    println!("Type /h for help.");
    let intents = state.restore().await?;
    renderer.render(intents);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };

                match parse_input(&line, state.view(), renderer.tickets()) {
                    Input::Attach(file_path) => match Attachments::load(&file_path).await {
                        Ok(attachment) => {
                            handle(&mut state, &mut renderer, Event::FileSelected(attachment)).await;
                        }
                        Err(err) => {
                            renderer.render(vec![RenderIntent::toast(
                                NoticeLevel::Warning,
                                &err.to_string(),
                            )]);
                        }
                    },
                    Input::Event(event) => handle(&mut state, &mut renderer, event).await,
                    Input::Help => {
                        println!("{}\n\n{}", state.status_text(), help_text());
                    }
                    Input::Ignored => {}
                    Input::Invalid(text) => {
                        renderer.render(vec![RenderIntent::toast(NoticeLevel::Warning, &text)]);
                    }
                    Input::Quit => break,
                }
            }
            event = event_rx.recv() => {
                match event {
                    Some(event) => handle(&mut state, &mut renderer, event).await,
                    None => break,
                }
            }
        }
    }

    return Ok(());
}
