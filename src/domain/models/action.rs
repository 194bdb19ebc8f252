use super::MessagePayload;
use super::TicketRequest;

/// Work requested by the chat state. Every request is tagged with the session
/// activation epoch or pre-chat flow it belongs to so late results can be
/// discarded.
#[derive(Debug, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    LookupTickets {
        category: String,
        uuids: Vec<String>,
    },
    ListTickets(Vec<String>),
    CreateTicket {
        flow_id: String,
        request: TicketRequest,
    },
    SendMessage {
        session_id: String,
        epoch: String,
        message_id: String,
        payload: MessagePayload,
    },
    FetchTranscript {
        session_id: String,
        epoch: String,
        forced: bool,
    },
    StartRecording(String),
    StopRecording(String),
}
