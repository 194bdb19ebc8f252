#[cfg(test)]
#[path = "ticket_resolver_test.rs"]
mod tests;

use anyhow::Result;

use crate::domain::models::RenderIntent;
use crate::domain::models::TicketRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The device already has an open ticket in the category. No new ticket
    /// may be created.
    ExistingOpen(TicketRecord),
    Proceed,
}

pub struct TicketResolver {}

impl TicketResolver {
    /// A device with no history has nothing to look up.
    pub fn needs_lookup(history: &[String]) -> bool {
        return !history.is_empty();
    }

    /// A failed lookup never blocks the visitor from starting a conversation.
    pub fn resolve(category: &str, lookup: Result<Vec<TicketRecord>>) -> Resolution {
        let tickets = match lookup {
            Ok(tickets) => tickets,
            Err(err) => {
                tracing::warn!(category, error = ?err, "ticket lookup failed, allowing a new ticket");
                return Resolution::Proceed;
            }
        };

        if let Some(ticket) = tickets.into_iter().find(|t| return t.is_open_in(category)) {
            return Resolution::ExistingOpen(ticket);
        }

        return Resolution::Proceed;
    }

    pub fn warning(category: &str) -> RenderIntent {
        return RenderIntent::alert(
            "Ticket Aberto",
            &format!("Você já possui um atendimento em {category}."),
        );
    }
}
