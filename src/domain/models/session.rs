#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Message;

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BotStep {
    #[default]
    Idle,
    WaitingName,
    WaitingPhone,
    CreatingTicket,
    Chatting,
    Closed,
}

impl BotStep {
    /// Steps where a ticket exists and its transcript can be synchronized.
    pub fn is_chattable(&self) -> bool {
        return *self == BotStep::Chatting || *self == BotStep::Closed;
    }

    /// Steps owned by the scripted pre-chat.
    pub fn is_collecting(&self) -> bool {
        return *self == BotStep::WaitingName
            || *self == BotStep::WaitingPhone
            || *self == BotStep::CreatingTicket;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub ticket_label: String,
    pub category: String,
    /// Fresh for every activation, so re-entering the same ticket does not
    /// accept results requested before it.
    pub epoch: String,
    last_known_message_count: usize,
}

impl Session {
    pub fn new(session_id: &str, ticket_label: &str, category: &str) -> Session {
        return Session {
            session_id: session_id.to_string(),
            ticket_label: ticket_label.to_string(),
            category: category.to_string(),
            epoch: Message::create_id(),
            last_known_message_count: 0,
        };
    }

    pub fn last_known_message_count(&self) -> usize {
        return self.last_known_message_count;
    }

    /// Advances the known count. Never moves it backwards.
    pub fn observe_count(&mut self, count: usize) {
        if count > self.last_known_message_count {
            self.last_known_message_count = count;
        }
    }

    /// Starts counting again from zero. A forced refresh does this before it
    /// observes the transcript it renders.
    pub fn reset_count(&mut self) {
        self.last_known_message_count = 0;
    }

    /// Accounts for a message the backend accepted from this client.
    pub fn count_sent(&mut self) {
        self.last_known_message_count += 1;
    }
}
