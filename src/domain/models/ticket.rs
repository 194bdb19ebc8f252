#[cfg(test)]
#[path = "ticket_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Message;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    /// The helpdesk reports `Aberto` for open tickets. Any other label is
    /// treated as closed.
    pub fn parse(status: &str) -> TicketStatus {
        let status = status.trim().to_lowercase();
        if status == "aberto" || status == "open" {
            return TicketStatus::Open;
        }

        return TicketStatus::Closed;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketRecord {
    pub uuid: String,
    pub label: String,
    pub category: String,
    pub status: TicketStatus,
    /// Status as labelled by the backend, kept for display.
    pub status_label: String,
}

impl TicketRecord {
    pub fn is_open_in(&self, category: &str) -> bool {
        return self.status == TicketStatus::Open && self.category == category;
    }

    pub fn format(&self) -> String {
        return format!("{} [{}] {}", self.label, self.status_label, self.category);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedTicket {
    pub session_id: String,
    pub label: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub fn parse(status: &str) -> SessionStatus {
        let status = status.trim().to_lowercase();
        if status == "encerrado" || status == "closed" {
            return SessionStatus::Closed;
        }

        return SessionStatus::Open;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    pub messages: Vec<Message>,
    pub status: SessionStatus,
}
