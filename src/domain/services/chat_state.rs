#[cfg(test)]
#[path = "chat_state_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::Attachments;
use super::BotFlow;
use super::BotTurn;
use super::MicDecision;
use super::PollContext;
use super::RecordingState;
use super::Resolution;
use super::SessionStore;
use super::Synchronizer;
use super::TicketResolver;
use super::UploadCoordinator;
use super::UploadKind;
use super::BOT_STATUS;
use super::INPUT_PLACEHOLDER;
use crate::domain::models::Action;
use crate::domain::models::Attachment;
use crate::domain::models::BotStep;
use crate::domain::models::CreatedTicket;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageKind;
use crate::domain::models::MessagePayload;
use crate::domain::models::NoticeLevel;
use crate::domain::models::RenderIntent;
use crate::domain::models::SendOutcome;
use crate::domain::models::Sender;
use crate::domain::models::Session;
use crate::domain::models::TicketRecord;
use crate::domain::models::Transcript;
use crate::domain::models::View;

pub const MENU_STATUS: &str = "Suporte Online";
pub const CLOSED_TEXT: &str = "Atendimento encerrado.";
const BUSY_TEXT: &str = "Aguarde o envio em andamento.";
const FILE_PLACEHOLDER: &str = "Enviando arquivo...";
const AUDIO_PLACEHOLDER: &str = "Enviando áudio...";

/// The single owner of the widget's state. Every change happens inside
/// `handle_event`, one event at a time, and is reported back as render
/// intents. Network and recorder work is handed to the actions worker.
pub struct ChatState {
    store: SessionStore,
    bot: BotFlow,
    uploads: UploadCoordinator,
    synchronizer: Synchronizer,
    session: Option<Session>,
    view: View,
    panel_open: bool,
    pending_lookup: Option<String>,
    action_tx: mpsc::UnboundedSender<Action>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl ChatState {
    pub fn new(
        store: SessionStore,
        synchronizer: Synchronizer,
        action_tx: mpsc::UnboundedSender<Action>,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> ChatState {
        return ChatState {
            store,
            bot: BotFlow::default(),
            uploads: UploadCoordinator::default(),
            synchronizer,
            session: None,
            view: View::Menu,
            panel_open: true,
            pending_lookup: None,
            action_tx,
            event_tx,
        };
    }

    pub fn step(&self) -> BotStep {
        return self.bot.step();
    }

    pub fn view(&self) -> View {
        return self.view;
    }

    pub fn session(&self) -> Option<&Session> {
        return self.session.as_ref();
    }

    pub fn store(&self) -> &SessionStore {
        return &self.store;
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        return &self.uploads;
    }

    /// The chat view only counts as visible while the panel is open.
    pub fn visible(&self) -> bool {
        return self.panel_open && self.view == View::Chat;
    }

    /// Picks up where the previous run left off.
    pub async fn restore(&mut self) -> Result<Vec<RenderIntent>> {
        let state = self.store.state().clone();
        tracing::debug!(step = %state.bot_step, session_id = ?state.active_session, "restoring state");

        if state.bot_step.is_chattable() {
            if let Some(session_id) = state.active_session {
                let label = state.active_ticket.unwrap_or_default();
                let category = state.active_category.unwrap_or_default();
                let mut intents = self
                    .enter_session(&session_id, &label, &category)
                    .await?;

                if state.bot_step == BotStep::Closed {
                    self.bot.close();
                    self.persist_step().await?;
                    intents.push(RenderIntent::input(false, CLOSED_TEXT));
                }

                return Ok(intents);
            }
        }

        if state.bot_step.is_collecting() {
            self.store.clear_active().await?;
            self.bot = BotFlow::restore(state.bot_step, state.bot_draft);
            if self.bot.step() != BotStep::Idle {
                self.view = View::Chat;
                self.persist_step().await?;
                if self.bot.step() == BotStep::CreatingTicket {
                    self.dispatch(Action::CreateTicket {
                        flow_id: self.bot.flow_id().to_string(),
                        request: self.bot.request(),
                    })?;
                }

                return Ok(self.bot.resume());
            }
        }

        return self.reset_to_menu().await;
    }

    pub async fn handle_event(&mut self, event: Event) -> Result<Vec<RenderIntent>> {
        match event {
            Event::BackPressed() => return self.reset_to_menu().await,
            Event::CategorySelected(category) => return self.select_category(&category).await,
            Event::FileSelected(attachment) => return self.send_file(attachment),
            Event::HistoryRequested() => return self.show_history(),
            Event::MicToggled() => return self.toggle_mic(),
            Event::PanelToggled() => return self.toggle_panel().await,
            Event::TextSubmitted(text) => return self.submit_text(&text).await,
            Event::TicketResumed(record) => return self.resume_ticket(record).await,

            Event::PollTick(epoch) => return self.poll(&epoch),

            Event::HistoryLoaded(result) => return Ok(self.history_loaded(result)),
            Event::MessageSent {
                epoch,
                message_id,
                kind,
                result,
            } => {
                return self.message_sent(&epoch, &message_id, kind, result).await;
            }
            Event::RecordingStarted { epoch, result } => {
                return self.recording_started(&epoch, result);
            }
            Event::RecordingStopped { epoch, result } => {
                return self.recording_stopped(&epoch, result);
            }
            Event::TicketCreated { flow_id, result } => {
                return self.ticket_created(&flow_id, result).await;
            }
            Event::TicketLookupCompleted { category, result } => {
                return self.lookup_completed(&category, result).await;
            }
            Event::TranscriptFetched {
                epoch,
                forced,
                result,
            } => {
                return self.transcript_fetched(&epoch, forced, result).await;
            }
        }
    }

    fn dispatch(&self, action: Action) -> Result<()> {
        self.action_tx.send(action)?;
        return Ok(());
    }

    /// True when `epoch` tags the current activation of the active session.
    fn is_active(&self, epoch: &str) -> bool {
        return self
            .session
            .as_ref()
            .map(|e| return e.epoch == epoch)
            .unwrap_or(false);
    }

    /// Session id and activation epoch of the active session.
    fn active_tags(&self) -> Option<(String, String)> {
        return self
            .session
            .as_ref()
            .map(|e| return (e.session_id.to_string(), e.epoch.to_string()));
    }

    fn fetch_transcript(&mut self, forced: bool) -> Result<()> {
        let (session_id, epoch) = match self.active_tags() {
            Some(tags) => tags,
            None => return Ok(()),
        };

        self.synchronizer.begin_fetch();
        return self.dispatch(Action::FetchTranscript {
            session_id,
            epoch,
            forced,
        });
    }

    async fn persist_step(&mut self) -> Result<()> {
        return self.store.set_step(self.bot.step(), self.bot.draft()).await;
    }

    /// Drops the active session and everything tied to it. Late results for
    /// it are discarded by their epoch. A recorder still starting is released
    /// when its start result arrives.
    fn end_session(&mut self) -> Vec<RenderIntent> {
        let mut intents = vec![];
        self.synchronizer.stop();

        if self.uploads.is_recording() {
            let live = matches!(self.uploads.recording_state(), RecordingState::Recording { .. });
            if let (true, Some(session)) = (live, &self.session) {
                if let Err(err) = self.dispatch(Action::StopRecording(session.epoch.to_string())) {
                    tracing::error!(error = ?err, "failed to release the recorder");
                }
            }
            intents.push(RenderIntent::SetRecording(false));
        }

        self.uploads.reset();
        self.session = None;
        return intents;
    }

    async fn reset_to_menu(&mut self) -> Result<Vec<RenderIntent>> {
        let mut intents = self.end_session();
        self.bot.reset();
        self.pending_lookup = None;
        self.view = View::Menu;

        self.store.clear_active().await?;
        self.persist_step().await?;

        intents.append(&mut vec![
            RenderIntent::ShowView(View::Menu),
            RenderIntent::ClearTranscript(),
            RenderIntent::SetStatus(MENU_STATUS.to_string()),
            RenderIntent::input(false, INPUT_PLACEHOLDER),
        ]);

        return Ok(intents);
    }

    async fn toggle_panel(&mut self) -> Result<Vec<RenderIntent>> {
        self.panel_open = !self.panel_open;
        if !self.panel_open {
            return Ok(vec![RenderIntent::Panel(false)]);
        }

        let mut intents = vec![RenderIntent::Panel(true)];
        intents.append(&mut self.reset_to_menu().await?);
        return Ok(intents);
    }

    async fn select_category(&mut self, category: &str) -> Result<Vec<RenderIntent>> {
        if self.pending_lookup.is_some() {
            tracing::debug!(category, "ticket lookup already running");
            return Ok(vec![]);
        }

        if TicketResolver::needs_lookup(self.store.history()) {
            self.pending_lookup = Some(category.to_string());
            self.dispatch(Action::LookupTickets {
                category: category.to_string(),
                uuids: self.store.history().to_vec(),
            })?;

            return Ok(vec![]);
        }

        return self.start_bot_flow(category).await;
    }

    async fn lookup_completed(
        &mut self,
        category: &str,
        result: Result<Vec<TicketRecord>>,
    ) -> Result<Vec<RenderIntent>> {
        if self.pending_lookup.as_deref() != Some(category) {
            return Ok(vec![]);
        }
        self.pending_lookup = None;

        match TicketResolver::resolve(category, result) {
            Resolution::ExistingOpen(ticket) => {
                tracing::debug!(category, ticket = ticket.label, "blocked by an open ticket");
                return Ok(vec![TicketResolver::warning(category)]);
            }
            Resolution::Proceed => return self.start_bot_flow(category).await,
        }
    }

    async fn start_bot_flow(&mut self, category: &str) -> Result<Vec<RenderIntent>> {
        let mut intents = self.end_session();
        self.store.clear_active().await?;

        intents.append(&mut self.bot.start(category));
        self.view = View::Chat;
        self.persist_step().await?;

        return Ok(intents);
    }

    async fn submit_text(&mut self, text: &str) -> Result<Vec<RenderIntent>> {
        let text = text.trim();
        if text.is_empty() || self.view != View::Chat {
            return Ok(vec![]);
        }

        match self.bot.step() {
            BotStep::WaitingName | BotStep::WaitingPhone => {
                match self.bot.submit(text) {
                    BotTurn::Reply(mut intents) => {
                        self.persist_step().await?;
                        intents.insert(0, RenderIntent::ClearInput());
                        return Ok(intents);
                    }
                    BotTurn::CreateTicket { request, mut intents } => {
                        self.persist_step().await?;
                        self.dispatch(Action::CreateTicket {
                            flow_id: self.bot.flow_id().to_string(),
                            request,
                        })?;
                        intents.insert(0, RenderIntent::ClearInput());
                        return Ok(intents);
                    }
                    BotTurn::Ignored => return Ok(vec![]),
                }
            }
            BotStep::Chatting => return self.send_text(text),
            BotStep::Closed => {
                return Ok(vec![RenderIntent::toast(NoticeLevel::Warning, CLOSED_TEXT)]);
            }
            BotStep::Idle | BotStep::CreatingTicket => return Ok(vec![]),
        }
    }

    fn send_text(&mut self, text: &str) -> Result<Vec<RenderIntent>> {
        let (session_id, epoch) = match self.active_tags() {
            Some(tags) => tags,
            None => return Ok(vec![]),
        };

        let echo = Message::pending(Sender::User, MessageKind::Text, text);
        if !self.uploads.try_begin(UploadKind::Text, &echo.id) {
            return Ok(vec![RenderIntent::toast(NoticeLevel::Warning, BUSY_TEXT)]);
        }

        self.dispatch(Action::SendMessage {
            session_id,
            epoch,
            message_id: echo.id.to_string(),
            payload: MessagePayload::Text(text.to_string()),
        })?;

        return Ok(vec![
            RenderIntent::AppendMessage(echo),
            RenderIntent::ClearInput(),
        ]);
    }

    fn send_file(&mut self, attachment: Attachment) -> Result<Vec<RenderIntent>> {
        let (session_id, epoch) = match self.active_tags() {
            Some(tags) if self.view == View::Chat => tags,
            _ => return Ok(vec![RenderIntent::alert("Ops", "Inicie um chat primeiro.")]),
        };

        if self.bot.step() == BotStep::Closed {
            return Ok(vec![RenderIntent::toast(NoticeLevel::Warning, CLOSED_TEXT)]);
        }

        if let Err(err) = Attachments::validate(&attachment) {
            return Ok(vec![RenderIntent::toast(NoticeLevel::Warning, &err.to_string())]);
        }

        let echo = Message::pending(
            Sender::User,
            MessageKind::Text,
            &format!("Arquivo: {}", attachment.file_name),
        );
        if !self.uploads.try_begin(UploadKind::File, &echo.id) {
            return Ok(vec![RenderIntent::toast(NoticeLevel::Warning, BUSY_TEXT)]);
        }

        self.dispatch(Action::SendMessage {
            session_id,
            epoch,
            message_id: echo.id.to_string(),
            payload: MessagePayload::File(attachment),
        })?;

        return Ok(vec![
            RenderIntent::AppendMessage(echo),
            RenderIntent::input(false, FILE_PLACEHOLDER),
        ]);
    }

    fn toggle_mic(&mut self) -> Result<Vec<RenderIntent>> {
        let epoch = self.session.as_ref().map(|e| return e.epoch.to_string());
        if epoch.is_some() && self.bot.step() == BotStep::Closed {
            return Ok(vec![RenderIntent::toast(NoticeLevel::Warning, CLOSED_TEXT)]);
        }

        match self.uploads.toggle_mic(Instant::now(), epoch.is_some()) {
            MicDecision::NoSession => {
                return Ok(vec![RenderIntent::alert("Ops", "Inicie um chat primeiro.")]);
            }
            MicDecision::Debounced | MicDecision::Busy => return Ok(vec![]),
            MicDecision::Start => {
                self.dispatch(Action::StartRecording(epoch.unwrap_or_default()))?;
                return Ok(vec![]);
            }
            MicDecision::Stop { elapsed } => {
                tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "stopping recording");
                self.dispatch(Action::StopRecording(epoch.unwrap_or_default()))?;
                return Ok(vec![RenderIntent::SetRecording(false)]);
            }
        }
    }

    fn recording_started(&mut self, epoch: &str, result: Result<()>) -> Result<Vec<RenderIntent>> {
        if !self.is_active(epoch) {
            if result.is_ok() {
                tracing::debug!(epoch, "releasing a recorder started for an inactive session");
                self.dispatch(Action::StopRecording(epoch.to_string()))?;
            }
            return Ok(vec![]);
        }

        match result {
            Ok(()) => {
                if !self.uploads.recording_started(Instant::now()) {
                    tracing::debug!(epoch, "releasing a recorder nobody is waiting on");
                    self.dispatch(Action::StopRecording(epoch.to_string()))?;
                    return Ok(vec![]);
                }

                return Ok(vec![RenderIntent::SetRecording(true)]);
            }
            Err(err) => {
                tracing::warn!(epoch, error = ?err, "microphone unavailable");
                self.uploads.recording_failed();
                return Ok(vec![
                    RenderIntent::SetRecording(false),
                    RenderIntent::alert("Erro", "Microfone não permitido."),
                ]);
            }
        }
    }

    fn recording_stopped(
        &mut self,
        epoch: &str,
        result: Result<Vec<Vec<u8>>>,
    ) -> Result<Vec<RenderIntent>> {
        if !self.is_active(epoch) {
            return Ok(vec![]);
        }

        if !matches!(self.uploads.recording_state(), RecordingState::Stopping { .. }) {
            return Ok(vec![]);
        }

        let chunks = match result {
            Ok(chunks) => chunks,
            Err(err) => {
                tracing::error!(epoch, error = ?err, "recorder failed to stop");
                self.uploads.recording_failed();
                return Ok(vec![RenderIntent::toast(
                    NoticeLevel::Error,
                    "Erro ao enviar áudio",
                )]);
            }
        };

        if self.uploads.recording_stopped().is_none() {
            return Ok(vec![RenderIntent::toast(
                NoticeLevel::Warning,
                "Áudio muito curto!",
            )]);
        }

        let blob = UploadCoordinator::assemble(chunks);
        let session_id = match self.active_tags() {
            Some((session_id, _)) if !blob.is_empty() => session_id,
            _ => {
                self.uploads.release();
                return Ok(vec![]);
            }
        };

        let placeholder = Message::pending(Sender::User, MessageKind::Audio, AUDIO_PLACEHOLDER);
        self.uploads.assign(&placeholder.id);
        self.dispatch(Action::SendMessage {
            session_id,
            epoch: epoch.to_string(),
            message_id: placeholder.id.to_string(),
            payload: MessagePayload::Audio(blob),
        })?;

        return Ok(vec![
            RenderIntent::AppendMessage(placeholder),
            RenderIntent::input(false, INPUT_PLACEHOLDER),
        ]);
    }

    async fn message_sent(
        &mut self,
        epoch: &str,
        message_id: &str,
        kind: MessageKind,
        result: Result<SendOutcome>,
    ) -> Result<Vec<RenderIntent>> {
        if !self.is_active(epoch) {
            tracing::debug!(epoch, message_id, "dropping send result for an inactive session");
            return Ok(vec![]);
        }
        if !self.uploads.finish(message_id) {
            return Ok(vec![]);
        }

        let mut intents = vec![];
        match result {
            Ok(SendOutcome::Delivered) => {
                if kind == MessageKind::Audio {
                    intents.push(RenderIntent::RemoveMessage(message_id.to_string()));
                    self.fetch_transcript(true)?;
                } else {
                    intents.push(RenderIntent::ConfirmMessage(message_id.to_string()));
                    if let Some(session) = self.session.as_mut() {
                        session.count_sent();
                    }
                }
            }
            Ok(SendOutcome::Closed(notice)) => {
                if kind == MessageKind::Audio {
                    intents.push(RenderIntent::RemoveMessage(message_id.to_string()));
                }

                let notice = if notice.trim().is_empty() {
                    CLOSED_TEXT.to_string()
                } else {
                    notice
                };
                intents.push(RenderIntent::AppendMessage(Message::text(
                    Sender::Agent,
                    &notice,
                )));

                if self.bot.close() {
                    self.persist_step().await?;
                }
                intents.push(RenderIntent::input(false, CLOSED_TEXT));
                return Ok(intents);
            }
            Err(err) => {
                tracing::warn!(epoch, message_id, ?kind, error = ?err, "send failed");
                intents.push(RenderIntent::RemoveMessage(message_id.to_string()));
                let text = match kind {
                    MessageKind::Text => "Erro ao enviar mensagem",
                    MessageKind::File => "Erro ao enviar arquivo",
                    MessageKind::Audio => "Erro ao enviar áudio",
                };
                intents.push(RenderIntent::toast(NoticeLevel::Error, text));
            }
        }

        if kind != MessageKind::Text && self.bot.step() == BotStep::Chatting {
            intents.push(RenderIntent::input(true, INPUT_PLACEHOLDER));
        }

        return Ok(intents);
    }

    fn poll(&mut self, epoch: &str) -> Result<Vec<RenderIntent>> {
        if !self.is_active(epoch) {
            return Ok(vec![]);
        }

        let ctx = PollContext {
            has_session: true,
            visible: self.visible(),
            step: self.bot.step(),
            upload_in_flight: self.uploads.in_flight().is_some(),
            recording: self.uploads.recording_state() != RecordingState::Idle,
        };
        if !self.synchronizer.should_fetch(&ctx) {
            return Ok(vec![]);
        }

        self.fetch_transcript(false)?;
        return Ok(vec![]);
    }

    async fn transcript_fetched(
        &mut self,
        epoch: &str,
        forced: bool,
        result: Result<Transcript>,
    ) -> Result<Vec<RenderIntent>> {
        if !self.is_active(epoch) {
            return Ok(vec![]);
        }
        self.synchronizer.fetch_done();

        let transcript = match result {
            Ok(transcript) => transcript,
            Err(err) => {
                tracing::warn!(epoch, error = ?err, "transcript fetch failed");
                return Ok(vec![]);
            }
        };

        if !forced && self.uploads.is_busy() {
            return Ok(vec![]);
        }

        let mut intents = vec![];
        if let Some(session) = self.session.as_mut() {
            if let Some(messages) = Synchronizer::apply(session, &transcript, forced) {
                intents.push(RenderIntent::ReplaceTranscript(messages));
            }
        }

        match Synchronizer::status_transition(self.bot.step(), transcript.status) {
            Some(BotStep::Closed) => {
                self.bot.close();
                self.persist_step().await?;
                intents.push(RenderIntent::input(false, CLOSED_TEXT));
                intents.push(RenderIntent::toast(NoticeLevel::Warning, CLOSED_TEXT));
            }
            Some(BotStep::Chatting) => {
                self.bot.reopen();
                self.persist_step().await?;
                if !self.uploads.is_busy() {
                    intents.push(RenderIntent::input(true, INPUT_PLACEHOLDER));
                }
            }
            _ => {}
        }

        return Ok(intents);
    }

    fn show_history(&mut self) -> Result<Vec<RenderIntent>> {
        self.view = View::History;
        let history = self.store.history().to_vec();
        if history.is_empty() {
            return Ok(vec![
                RenderIntent::ShowView(View::History),
                RenderIntent::ShowTickets(vec![]),
            ]);
        }

        self.dispatch(Action::ListTickets(history))?;
        return Ok(vec![RenderIntent::ShowView(View::History)]);
    }

    fn history_loaded(&mut self, result: Result<Vec<TicketRecord>>) -> Vec<RenderIntent> {
        if self.view != View::History {
            return vec![];
        }

        match result {
            Ok(tickets) => return vec![RenderIntent::ShowTickets(tickets)],
            Err(err) => {
                tracing::warn!(error = ?err, "ticket history lookup failed");
                return vec![RenderIntent::ShowTickets(vec![])];
            }
        }
    }

    async fn enter_session(
        &mut self,
        session_id: &str,
        label: &str,
        category: &str,
    ) -> Result<Vec<RenderIntent>> {
        self.end_session();
        let session = Session::new(session_id, label, category);
        let epoch = session.epoch.to_string();
        self.session = Some(session);
        self.bot.enter_chat(category);
        self.view = View::Chat;

        self.store.activate(session_id, label, category).await?;
        self.persist_step().await?;

        self.synchronizer.start(&epoch, self.event_tx.clone());
        self.fetch_transcript(true)?;

        return Ok(vec![
            RenderIntent::ShowView(View::Chat),
            RenderIntent::ClearTranscript(),
            RenderIntent::SetStatus(label.to_string()),
            RenderIntent::input(true, INPUT_PLACEHOLDER),
        ]);
    }

    async fn resume_ticket(&mut self, record: TicketRecord) -> Result<Vec<RenderIntent>> {
        self.pending_lookup = None;
        return self
            .enter_session(&record.uuid, &record.label, &record.category)
            .await;
    }

    async fn ticket_created(
        &mut self,
        flow_id: &str,
        result: Result<CreatedTicket>,
    ) -> Result<Vec<RenderIntent>> {
        let created = match result {
            Ok(created) => created,
            Err(err) => {
                if !self.bot.creation_failed(flow_id) {
                    return Ok(vec![]);
                }

                tracing::warn!(flow_id, error = ?err, "ticket creation failed");
                let mut intents = self.reset_to_menu().await?;
                intents.push(RenderIntent::toast(
                    NoticeLevel::Error,
                    "Não foi possível criar o ticket.",
                ));
                return Ok(intents);
            }
        };

        let category = self.bot.category().to_string();
        let intents = match self.bot.ticket_created(flow_id, &created) {
            Some(intents) => intents,
            None => {
                tracing::debug!(flow_id, "dropping creation result for a stale flow");
                return Ok(vec![]);
            }
        };

        let session = Session::new(&created.session_id, &created.label, &category);
        let epoch = session.epoch.to_string();
        self.session = Some(session);
        self.store
            .activate(&created.session_id, &created.label, &category)
            .await?;
        self.persist_step().await?;
        self.synchronizer.start(&epoch, self.event_tx.clone());

        tracing::debug!(session_id = created.session_id, ticket = created.label, "ticket created");
        return Ok(intents);
    }

    /// Status line for the current step. Used by front-ends that redraw the
    /// header on their own.
    pub fn status_text(&self) -> String {
        if let Some(session) = &self.session {
            return session.ticket_label.to_string();
        }

        if self.bot.step().is_collecting() {
            return BOT_STATUS.to_string();
        }

        return MENU_STATUS.to_string();
    }
}
