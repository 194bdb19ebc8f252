use super::Message;
use super::TicketRecord;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum View {
    Menu,
    Chat,
    History,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// What the presentation layer should change. The chat state never draws
/// anything itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderIntent {
    /// Blocking dialog that needs the visitor's acknowledgement.
    Alert {
        title: String,
        text: String,
    },
    AppendMessage(Message),
    ClearInput(),
    ClearTranscript(),
    ConfirmMessage(String),
    Panel(bool),
    RemoveMessage(String),
    ReplaceTranscript(Vec<Message>),
    SetInput {
        enabled: bool,
        placeholder: String,
    },
    SetRecording(bool),
    SetStatus(String),
    ShowTickets(Vec<TicketRecord>),
    ShowView(View),
    /// Non-blocking notice.
    Toast(NoticeLevel, String),
}

impl RenderIntent {
    pub fn alert(title: &str, text: &str) -> RenderIntent {
        return RenderIntent::Alert {
            title: title.to_string(),
            text: text.to_string(),
        };
    }

    pub fn input(enabled: bool, placeholder: &str) -> RenderIntent {
        return RenderIntent::SetInput {
            enabled,
            placeholder: placeholder.to_string(),
        };
    }

    pub fn toast(level: NoticeLevel, text: &str) -> RenderIntent {
        return RenderIntent::Toast(level, text.to_string());
    }
}
