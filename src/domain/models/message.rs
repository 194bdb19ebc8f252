#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Agent,
    Bot,
}

impl Sender {
    /// Maps the backend's `remetente` field. Anything that isn't the visitor
    /// is rendered on the agent side.
    pub fn parse(remetente: &str) -> Sender {
        match remetente {
            "user" => return Sender::User,
            "bot" => return Sender::Bot,
            _ => return Sender::Agent,
        }
    }

    pub fn as_remetente(&self) -> &'static str {
        match self {
            Sender::User => return "user",
            Sender::Agent => return "agent",
            Sender::Bot => return "bot",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Text,
    File,
    Audio,
}

impl MessageKind {
    pub fn parse(tipo: &str) -> MessageKind {
        match tipo {
            "arquivo" => return MessageKind::File,
            "audio" => return MessageKind::Audio,
            _ => return MessageKind::Text,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delivery {
    /// Echoed locally, waiting on the send round-trip.
    Pending,
    Confirmed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub kind: MessageKind,
    pub content: String,
    delivery: Delivery,
}

impl Message {
    pub fn new(sender: Sender, kind: MessageKind, content: &str) -> Message {
        return Message {
            id: Message::create_id(),
            sender,
            kind,
            content: content.to_string(),
            delivery: Delivery::Confirmed,
        };
    }

    pub fn text(sender: Sender, content: &str) -> Message {
        return Message::new(sender, MessageKind::Text, content);
    }

    pub fn pending(sender: Sender, kind: MessageKind, content: &str) -> Message {
        let mut msg = Message::new(sender, kind, content);
        msg.delivery = Delivery::Pending;
        return msg;
    }

    pub fn create_id() -> String {
        return Uuid::new_v4().simple().to_string()[..12].to_string();
    }

    pub fn delivery(&self) -> Delivery {
        return self.delivery;
    }

    pub fn is_pending(&self) -> bool {
        return self.delivery == Delivery::Pending;
    }

    pub fn confirm(&mut self) {
        self.delivery = Delivery::Confirmed;
    }

    /// Stored files and voice notes are referenced by filename only, and
    /// served by the backend from a static prefix.
    pub fn attachment_url(&self, base_url: &str, uploads_path: &str) -> Option<String> {
        if self.kind == MessageKind::Text || self.is_pending() {
            return None;
        }

        let base = base_url.trim_end_matches('/');
        let prefix = uploads_path.trim_matches('/');
        if prefix.is_empty() {
            return Some(format!("{base}/{}", self.content));
        }

        return Some(format!("{base}/{prefix}/{}", self.content));
    }
}
