#[cfg(test)]
#[path = "simulated_test.rs"]
mod tests;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::CreatedTicket;
use crate::domain::models::Message;
use crate::domain::models::MessageKind;
use crate::domain::models::MessagePayload;
use crate::domain::models::SendOutcome;
use crate::domain::models::Sender;
use crate::domain::models::SessionStatus;
use crate::domain::models::TicketRecord;
use crate::domain::models::TicketRequest;
use crate::domain::models::TicketStatus;
use crate::domain::models::Transcript;

/// Typed by the visitor to have the simulated agent close the ticket.
pub const CLOSE_COMMAND: &str = "#encerrar";
const CLOSING_NOTICE: &str = "Atendimento encerrado pelo agente.";
const AUTO_REPLY: &str = "Olá! Um atendente já vai falar com você.";

#[derive(Clone, Debug)]
struct SimulatedTicket {
    label: String,
    category: String,
    status: TicketStatus,
    messages: Vec<Message>,
}

/// An in-memory helpdesk with a scripted agent. Tickets live as long as the
/// process does.
#[derive(Clone, Default)]
pub struct Simulated {
    tickets: Arc<DashMap<String, SimulatedTicket>>,
    counter: Arc<AtomicUsize>,
}

impl Simulated {
    fn stored_name(kind: MessageKind, file_name: &str) -> String {
        let stamp = Uuid::new_v4().simple().to_string()[..8].to_string();
        if kind == MessageKind::Audio {
            return format!("audio_{stamp}.webm");
        }

        return format!("{stamp}_{file_name}");
    }
}

#[async_trait]
impl Backend for Simulated {
    fn name(&self) -> BackendName {
        return BackendName::Simulated;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_ticket(&self, request: TicketRequest) -> Result<CreatedTicket> {
        if request.category.trim().is_empty() {
            bail!("A category is required to open a ticket");
        }

        let number = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = Uuid::new_v4().to_string();
        let label = format!("#{number:04}");

        self.tickets.insert(
            session_id.to_string(),
            SimulatedTicket {
                label: label.to_string(),
                category: request.category,
                status: TicketStatus::Open,
                messages: vec![],
            },
        );

        tracing::debug!(session_id, label, "simulated ticket created");
        return Ok(CreatedTicket { session_id, label });
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(&self, session_id: &str, payload: MessagePayload) -> Result<SendOutcome> {
        let mut ticket = match self.tickets.get_mut(session_id) {
            Some(ticket) => ticket,
            None => bail!(format!("Unknown session {session_id}")),
        };

        if ticket.status == TicketStatus::Closed {
            return Ok(SendOutcome::Closed(CLOSING_NOTICE.to_string()));
        }

        let msg = match payload {
            MessagePayload::Text(text) => {
                if text.trim().is_empty() {
                    bail!("Vazio");
                }
                Message::text(Sender::User, &text)
            }
            MessagePayload::File(attachment) => Message::new(
                Sender::User,
                MessageKind::File,
                &Simulated::stored_name(MessageKind::File, &attachment.file_name),
            ),
            MessagePayload::Audio(_) => Message::new(
                Sender::User,
                MessageKind::Audio,
                &Simulated::stored_name(MessageKind::Audio, ""),
            ),
        };

        let closes = msg.kind == MessageKind::Text && msg.content.trim() == CLOSE_COMMAND;
        let first_from_user = !ticket.messages.iter().any(|e| return e.sender == Sender::User);
        ticket.messages.push(msg);

        if closes {
            ticket.status = TicketStatus::Closed;
            ticket
                .messages
                .push(Message::text(Sender::Agent, CLOSING_NOTICE));
        } else if first_from_user {
            ticket.messages.push(Message::text(Sender::Agent, AUTO_REPLY));
        }

        return Ok(SendOutcome::Delivered);
    }

    #[allow(clippy::implicit_return)]
    async fn fetch_transcript(&self, session_id: &str) -> Result<Transcript> {
        let ticket = match self.tickets.get(session_id) {
            Some(ticket) => ticket,
            None => bail!(format!("Unknown session {session_id}")),
        };

        let status = match ticket.status {
            TicketStatus::Open => SessionStatus::Open,
            TicketStatus::Closed => SessionStatus::Closed,
        };

        return Ok(Transcript {
            messages: ticket.messages.clone(),
            status,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn lookup_tickets(&self, uuids: &[String]) -> Result<Vec<TicketRecord>> {
        let records = uuids
            .iter()
            .filter_map(|uuid| {
                let ticket = self.tickets.get(uuid)?;
                let status_label = match ticket.status {
                    TicketStatus::Open => "Aberto",
                    TicketStatus::Closed => "Fechado",
                };

                return Some(TicketRecord {
                    uuid: uuid.to_string(),
                    label: ticket.label.to_string(),
                    category: ticket.category.to_string(),
                    status: ticket.status,
                    status_label: status_label.to_string(),
                });
            })
            .collect();

        return Ok(records);
    }
}
