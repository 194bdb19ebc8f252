use anyhow::Result;

use super::Attachment;
use super::CreatedTicket;
use super::MessageKind;
use super::SendOutcome;
use super::TicketRecord;
use super::Transcript;

/// Visitor input, poll ticks and worker results. Results for a session carry
/// the activation epoch they were requested under.
pub enum Event {
    BackPressed(),
    CategorySelected(String),
    FileSelected(Attachment),
    HistoryRequested(),
    MicToggled(),
    PanelToggled(),
    TextSubmitted(String),
    TicketResumed(TicketRecord),

    PollTick(String),

    HistoryLoaded(Result<Vec<TicketRecord>>),
    MessageSent {
        epoch: String,
        message_id: String,
        kind: MessageKind,
        result: Result<SendOutcome>,
    },
    RecordingStarted {
        epoch: String,
        result: Result<()>,
    },
    RecordingStopped {
        epoch: String,
        result: Result<Vec<Vec<u8>>>,
    },
    TicketCreated {
        flow_id: String,
        result: Result<CreatedTicket>,
    },
    TicketLookupCompleted {
        category: String,
        result: Result<Vec<TicketRecord>>,
    },
    TranscriptFetched {
        epoch: String,
        forced: bool,
        result: Result<Transcript>,
    },
}
