#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::Backend;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;
use crate::domain::models::Recorder;
use crate::domain::models::RecorderBox;

type SharedBackend = Arc<dyn Backend + Send + Sync>;
type SharedRecorder = Arc<dyn Recorder + Send + Sync>;

fn send_event(tx: &mpsc::UnboundedSender<Event>, event: Event) {
    if tx.send(event).is_err() {
        tracing::debug!("event receiver closed, dropping worker result");
    }
}

async fn run_action(
    backend: SharedBackend,
    recorder: SharedRecorder,
    tx: mpsc::UnboundedSender<Event>,
    action: Action,
) {
    match action {
        Action::LookupTickets { category, uuids } => {
            let result = backend.lookup_tickets(&uuids).await;
            send_event(&tx, Event::TicketLookupCompleted { category, result });
        }
        Action::ListTickets(uuids) => {
            let result = backend.lookup_tickets(&uuids).await;
            send_event(&tx, Event::HistoryLoaded(result));
        }
        Action::CreateTicket { flow_id, request } => {
            let result = backend.create_ticket(request).await;
            send_event(&tx, Event::TicketCreated { flow_id, result });
        }
        Action::SendMessage {
            session_id,
            epoch,
            message_id,
            payload,
        } => {
            let kind = payload.kind();
            let result = backend.send_message(&session_id, payload).await;
            send_event(
                &tx,
                Event::MessageSent {
                    epoch,
                    message_id,
                    kind,
                    result,
                },
            );
        }
        Action::FetchTranscript {
            session_id,
            epoch,
            forced,
        } => {
            let result = backend.fetch_transcript(&session_id).await;
            send_event(
                &tx,
                Event::TranscriptFetched {
                    epoch,
                    forced,
                    result,
                },
            );
        }
        Action::StartRecording(epoch) => {
            let result = recorder.start().await;
            send_event(&tx, Event::RecordingStarted { epoch, result });
        }
        Action::StopRecording(epoch) => {
            let result = recorder.stop().await;
            send_event(&tx, Event::RecordingStopped { epoch, result });
        }
    }
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs every requested action on its own task and reports the outcome
    /// as an event. Returns once the action channel closes.
    pub async fn start(
        backend: BackendBox,
        recorder: RecorderBox,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let backend: SharedBackend = Arc::from(backend);
        let recorder: SharedRecorder = Arc::from(recorder);
        tracing::debug!(backend = %backend.name(), recorder = %recorder.name(), "actions worker started");

        while let Some(action) = rx.recv().await {
            let name: &'static str = (&action).into();
            tracing::debug!(action = name, "dispatching action");

            let worker_backend = backend.clone();
            let worker_recorder = recorder.clone();
            let worker_tx = tx.clone();
            tokio::spawn(async move {
                run_action(worker_backend, worker_recorder, worker_tx, action).await;
            });
        }

        return Ok(());
    }
}
