#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::CreatedTicket;
use super::MessageKind;
use super::TicketRecord;
use super::TicketRequest;
use super::Transcript;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Helpdesk,
    Simulated,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessagePayload {
    Text(String),
    File(Attachment),
    /// A single `audio/webm` blob assembled from the captured chunks.
    Audio(Vec<u8>),
}

impl MessagePayload {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessagePayload::Text(_) => return MessageKind::Text,
            MessagePayload::File(_) => return MessageKind::File,
            MessagePayload::Audio(_) => return MessageKind::Audio,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The ticket was closed by the helpdesk. Carries the closing notice.
    Closed(String),
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify the helpdesk can be reached.
    async fn health_check(&self) -> Result<()>;

    /// Materializes a ticket and its chat session once the pre-chat has
    /// collected the visitor's details.
    async fn create_ticket(&self, request: TicketRequest) -> Result<CreatedTicket>;

    /// Submits exactly one of text, file or audio on behalf of the visitor.
    async fn send_message(&self, session_id: &str, payload: MessagePayload)
        -> Result<SendOutcome>;

    /// Returns the full transcript of a session in the order the helpdesk
    /// stored it, alongside the ticket's status.
    async fn fetch_transcript(&self, session_id: &str) -> Result<Transcript>;

    /// Resolves ticket ids created on this device to their current records.
    /// Unknown ids are omitted from the response.
    async fn lookup_tickets(&self, uuids: &[String]) -> Result<Vec<TicketRecord>>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
