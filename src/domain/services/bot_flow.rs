#[cfg(test)]
#[path = "bot_flow_test.rs"]
mod tests;

use crate::domain::models::BotStep;
use crate::domain::models::CreatedTicket;
use crate::domain::models::Message;
use crate::domain::models::RenderIntent;
use crate::domain::models::Sender;
use crate::domain::models::TicketRequest;
use crate::domain::models::View;

pub const BOT_STATUS: &str = "Atendimento Virtual";
pub const INPUT_PLACEHOLDER: &str = "Digite...";

fn bot_says(text: &str) -> RenderIntent {
    return RenderIntent::AppendMessage(Message::text(Sender::Bot, text));
}

fn echo(text: &str) -> RenderIntent {
    return RenderIntent::AppendMessage(Message::text(Sender::User, text));
}

pub enum BotTurn {
    Reply(Vec<RenderIntent>),
    CreateTicket {
        request: TicketRequest,
        intents: Vec<RenderIntent>,
    },
    Ignored,
}

/// The scripted pre-chat that collects name and phone before a ticket exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotFlow {
    step: BotStep,
    flow_id: String,
    category: String,
    name: Option<String>,
    phone: Option<String>,
}

impl Default for BotFlow {
    fn default() -> BotFlow {
        return BotFlow {
            step: BotStep::Idle,
            flow_id: Message::create_id(),
            category: "".to_string(),
            name: None,
            phone: None,
        };
    }
}

impl BotFlow {
    /// Rebuilds the flow from persisted state, stepping back to the last step
    /// whose inputs survived.
    pub fn restore(step: BotStep, draft: Option<TicketRequest>) -> BotFlow {
        let mut flow = BotFlow::default();
        if !step.is_collecting() {
            return flow;
        }

        let draft = match draft {
            Some(draft) if !draft.category.is_empty() => draft,
            _ => return flow,
        };

        flow.category = draft.category;
        flow.name = draft.name;
        flow.phone = draft.phone;
        flow.step = match (flow.name.is_some(), flow.phone.is_some()) {
            (false, _) => BotStep::WaitingName,
            (true, false) => BotStep::WaitingPhone,
            (true, true) => step,
        };

        return flow;
    }

    pub fn step(&self) -> BotStep {
        return self.step;
    }

    pub fn flow_id(&self) -> &str {
        return &self.flow_id;
    }

    pub fn category(&self) -> &str {
        return &self.category;
    }

    pub fn request(&self) -> TicketRequest {
        return TicketRequest {
            category: self.category.to_string(),
            name: self.name.clone(),
            phone: self.phone.clone(),
        };
    }

    /// Collected details, present only while the pre-chat is running.
    pub fn draft(&self) -> Option<TicketRequest> {
        if !self.step.is_collecting() {
            return None;
        }

        return Some(self.request());
    }

    pub fn start(&mut self, category: &str) -> Vec<RenderIntent> {
        *self = BotFlow {
            step: BotStep::WaitingName,
            category: category.to_string(),
            ..BotFlow::default()
        };

        return vec![
            RenderIntent::ShowView(View::Chat),
            RenderIntent::ClearTranscript(),
            RenderIntent::SetStatus(BOT_STATUS.to_string()),
            RenderIntent::input(true, INPUT_PLACEHOLDER),
            bot_says("Olá! Sou o assistente virtual."),
            self.prompt(),
        ];
    }

    /// Intents that put a restored pre-chat back on screen.
    pub fn resume(&self) -> Vec<RenderIntent> {
        return vec![
            RenderIntent::ShowView(View::Chat),
            RenderIntent::ClearTranscript(),
            RenderIntent::SetStatus(BOT_STATUS.to_string()),
            RenderIntent::input(self.step != BotStep::CreatingTicket, INPUT_PLACEHOLDER),
            self.prompt(),
        ];
    }

    fn prompt(&self) -> RenderIntent {
        match self.step {
            BotStep::WaitingName => {
                return bot_says(&format!("Opção: {}. Qual seu Nome?", self.category));
            }
            BotStep::WaitingPhone => {
                let name = self.name.clone().unwrap_or_default();
                return bot_says(&format!("Prazer {name}. Qual seu Telefone?"));
            }
            _ => return bot_says("Criando ticket..."),
        }
    }

    pub fn submit(&mut self, text: &str) -> BotTurn {
        let text = text.trim();
        if text.is_empty() {
            return BotTurn::Ignored;
        }

        match self.step {
            BotStep::WaitingName => {
                self.name = Some(text.to_string());
                self.step = BotStep::WaitingPhone;

                return BotTurn::Reply(vec![echo(text), self.prompt()]);
            }
            BotStep::WaitingPhone => {
                // Taken as typed; extensions and country codes pass through.
                self.phone = Some(text.to_string());
                self.step = BotStep::CreatingTicket;

                return BotTurn::CreateTicket {
                    request: self.request(),
                    intents: vec![
                        echo(text),
                        self.prompt(),
                        RenderIntent::input(false, INPUT_PLACEHOLDER),
                    ],
                };
            }
            _ => return BotTurn::Ignored,
        }
    }

    /// Applies a creation result if it belongs to the current flow.
    pub fn ticket_created(&mut self, flow_id: &str, created: &CreatedTicket) -> Option<Vec<RenderIntent>> {
        if flow_id != self.flow_id || self.step != BotStep::CreatingTicket {
            return None;
        }

        self.step = BotStep::Chatting;
        self.name = None;
        self.phone = None;

        return Some(vec![
            RenderIntent::SetStatus(created.label.to_string()),
            RenderIntent::input(true, INPUT_PLACEHOLDER),
            bot_says(&format!("Ticket {} criado!", created.label)),
        ]);
    }

    pub fn creation_failed(&mut self, flow_id: &str) -> bool {
        if flow_id != self.flow_id || self.step != BotStep::CreatingTicket {
            return false;
        }

        self.reset();
        return true;
    }

    /// Jumps straight to chatting on an existing ticket.
    pub fn enter_chat(&mut self, category: &str) {
        *self = BotFlow {
            step: BotStep::Chatting,
            category: category.to_string(),
            ..BotFlow::default()
        };
    }

    pub fn close(&mut self) -> bool {
        if self.step != BotStep::Chatting {
            return false;
        }

        self.step = BotStep::Closed;
        return true;
    }

    pub fn reopen(&mut self) -> bool {
        if self.step != BotStep::Closed {
            return false;
        }

        self.step = BotStep::Chatting;
        return true;
    }

    pub fn reset(&mut self) {
        *self = BotFlow::default();
    }
}
