#[cfg(test)]
#[path = "helpdesk_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
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

const AUDIO_FILE_NAME: &str = "gravacao.webm";
const AUDIO_MIME: &str = "audio/webm";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct InitSessionResponse {
    session_id: String,
    ticket: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SendChatResponse {
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ChatMessage {
    remetente: String,
    tipo: String,
    conteudo: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessagesResponse {
    messages: Vec<ChatMessage>,
    #[serde(default)]
    status: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MyTicketsRequest {
    uuids: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MyTicket {
    uuid: String,
    ticket: String,
    category: String,
    status: String,
}

fn parse_millis(value: &str) -> Option<Duration> {
    return value
        .parse::<u64>()
        .ok()
        .filter(|e| return *e > 0)
        .map(Duration::from_millis);
}

/// HTTP client for the helpdesk's widget endpoints.
pub struct Helpdesk {
    url: String,
    timeout: String,
    request_timeout: String,
}

impl Default for Helpdesk {
    fn default() -> Helpdesk {
        return Helpdesk {
            url: Config::get(ConfigKey::BaseURL),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
            request_timeout: Config::get(ConfigKey::RequestTimeout),
        };
    }
}

impl Helpdesk {
    fn endpoint(&self, path: &str) -> String {
        return format!("{}/{path}", self.url.trim_end_matches('/'));
    }

    fn client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = parse_millis(&self.request_timeout) {
            builder = builder.timeout(timeout);
        }

        return Ok(builder.build()?);
    }

    fn form(session_id: &str, payload: MessagePayload) -> Result<multipart::Form> {
        let form = multipart::Form::new()
            .text("session_id", session_id.to_string())
            .text("remetente", Sender::User.as_remetente());

        match payload {
            MessagePayload::Text(text) => return Ok(form.text("message", text)),
            MessagePayload::File(attachment) => {
                let part = multipart::Part::bytes(attachment.bytes)
                    .file_name(attachment.file_name)
                    .mime_str(&attachment.mime)?;
                return Ok(form.part("arquivo", part));
            }
            MessagePayload::Audio(blob) => {
                let part = multipart::Part::bytes(blob)
                    .file_name(AUDIO_FILE_NAME)
                    .mime_str(AUDIO_MIME)?;
                return Ok(form.part("audio", part));
            }
        }
    }
}

#[async_trait]
impl Backend for Helpdesk {
    fn name(&self) -> BackendName {
        return BackendName::Helpdesk;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let timeout = parse_millis(&self.timeout).unwrap_or(Duration::from_millis(1000));
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, url = self.url, "Helpdesk is not reachable");
                bail!(format!("Helpdesk at {} is not reachable", self.url));
            }
        };

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Helpdesk health check failed");
            bail!("Helpdesk health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_ticket(&self, request: TicketRequest) -> Result<CreatedTicket> {
        let res = self
            .client()?
            .post(self.endpoint("init_session"))
            .json(&request)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to create ticket");
            bail!(format!("Failed to create ticket: HTTP {}", res.status().as_u16()));
        }

        let body = res.json::<InitSessionResponse>().await?;
        tracing::debug!(session_id = body.session_id, ticket = body.ticket, "ticket created");

        return Ok(CreatedTicket {
            session_id: body.session_id,
            label: body.ticket,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(&self, session_id: &str, payload: MessagePayload) -> Result<SendOutcome> {
        let kind = payload.kind();
        let res = self
            .client()?
            .post(self.endpoint("send_chat"))
            .multipart(Helpdesk::form(session_id, payload)?)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), ?kind, "Failed to send message");
            bail!(format!("Failed to send message: HTTP {}", res.status().as_u16()));
        }

        let body = res.json::<SendChatResponse>().await?;
        match body.status.as_str() {
            "ok" | "success" => return Ok(SendOutcome::Delivered),
            "closed" => return Ok(SendOutcome::Closed(body.msg.unwrap_or_default())),
            "error" => {
                let message = body
                    .message
                    .or(body.msg)
                    .unwrap_or_else(|| return "unknown error".to_string());
                bail!(format!("Helpdesk rejected the message: {message}"));
            }
            status => bail!(format!("Unexpected send status: {status}")),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn fetch_transcript(&self, session_id: &str) -> Result<Transcript> {
        let res = self
            .client()?
            .get(self.endpoint(&format!("get_messages/{session_id}")))
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("Failed to fetch messages: HTTP {}", res.status().as_u16()));
        }

        let body = res.json::<MessagesResponse>().await?;
        let messages = body
            .messages
            .iter()
            .map(|msg| {
                return Message::new(
                    Sender::parse(&msg.remetente),
                    MessageKind::parse(&msg.tipo),
                    &msg.conteudo,
                );
            })
            .collect();

        return Ok(Transcript {
            messages,
            status: SessionStatus::parse(&body.status),
        });
    }

    #[allow(clippy::implicit_return)]
    async fn lookup_tickets(&self, uuids: &[String]) -> Result<Vec<TicketRecord>> {
        let req = MyTicketsRequest {
            uuids: uuids.to_vec(),
        };
        let res = self
            .client()?
            .post(self.endpoint("my_tickets"))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!("Failed to look up tickets: HTTP {}", res.status().as_u16()));
        }

        let tickets = res
            .json::<Vec<MyTicket>>()
            .await?
            .into_iter()
            .map(|ticket| {
                return TicketRecord {
                    status: TicketStatus::parse(&ticket.status),
                    uuid: ticket.uuid,
                    label: ticket.ticket,
                    category: ticket.category,
                    status_label: ticket.status,
                };
            })
            .collect();

        return Ok(tickets);
    }
}
