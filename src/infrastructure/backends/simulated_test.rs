use anyhow::Result;

use super::Simulated;
use super::CLOSE_COMMAND;
use crate::domain::models::Attachment;
use crate::domain::models::Backend;
use crate::domain::models::MessageKind;
use crate::domain::models::MessagePayload;
use crate::domain::models::SendOutcome;
use crate::domain::models::Sender;
use crate::domain::models::SessionStatus;
use crate::domain::models::TicketRequest;
use crate::domain::models::TicketStatus;

fn request(category: &str) -> TicketRequest {
    return TicketRequest {
        category: category.to_string(),
        name: Some("Ana".to_string()),
        phone: Some("11999999999".to_string()),
    };
}

#[tokio::test]
async fn it_labels_tickets_sequentially() -> Result<()> {
    let backend = Simulated::default();
    let first = backend.create_ticket(request("Suporte")).await?;
    let second = backend.create_ticket(request("Financeiro")).await?;

    assert_eq!(first.label, "#0001");
    assert_eq!(second.label, "#0002");
    assert_ne!(first.session_id, second.session_id);

    return Ok(());
}

#[tokio::test]
async fn it_rejects_tickets_without_a_category() {
    let backend = Simulated::default();
    assert!(backend.create_ticket(request(" ")).await.is_err());
}

#[tokio::test]
async fn it_auto_replies_to_the_first_message() -> Result<()> {
    let backend = Simulated::default();
    let ticket = backend.create_ticket(request("Suporte")).await?;

    backend
        .send_message(&ticket.session_id, MessagePayload::Text("oi".to_string()))
        .await?;
    backend
        .send_message(&ticket.session_id, MessagePayload::Text("tudo bem?".to_string()))
        .await?;

    let transcript = backend.fetch_transcript(&ticket.session_id).await?;
    let senders = transcript
        .messages
        .iter()
        .map(|e| return e.sender)
        .collect::<Vec<Sender>>();

    assert_eq!(senders, vec![Sender::User, Sender::Agent, Sender::User]);
    assert_eq!(transcript.status, SessionStatus::Open);

    return Ok(());
}

#[tokio::test]
async fn it_stores_files_and_audio_by_name() -> Result<()> {
    let backend = Simulated::default();
    let ticket = backend.create_ticket(request("Suporte")).await?;

    backend
        .send_message(
            &ticket.session_id,
            MessagePayload::File(Attachment {
                file_name: "nota.pdf".to_string(),
                mime: "application/pdf".to_string(),
                bytes: vec![1],
            }),
        )
        .await?;
    backend
        .send_message(&ticket.session_id, MessagePayload::Audio(vec![1, 2]))
        .await?;

    let transcript = backend.fetch_transcript(&ticket.session_id).await?;
    assert_eq!(transcript.messages[0].kind, MessageKind::File);
    assert!(transcript.messages[0].content.ends_with("_nota.pdf"));
    assert_eq!(transcript.messages[2].kind, MessageKind::Audio);
    assert!(transcript.messages[2].content.starts_with("audio_"));
    assert!(transcript.messages[2].content.ends_with(".webm"));

    return Ok(());
}

#[tokio::test]
async fn it_closes_tickets_on_request() -> Result<()> {
    let backend = Simulated::default();
    let ticket = backend.create_ticket(request("Suporte")).await?;

    let res = backend
        .send_message(
            &ticket.session_id,
            MessagePayload::Text(CLOSE_COMMAND.to_string()),
        )
        .await?;
    assert_eq!(res, SendOutcome::Delivered);

    let transcript = backend.fetch_transcript(&ticket.session_id).await?;
    assert_eq!(transcript.status, SessionStatus::Closed);

    let res = backend
        .send_message(&ticket.session_id, MessagePayload::Text("oi".to_string()))
        .await?;
    assert!(matches!(res, SendOutcome::Closed(_)));

    let records = backend
        .lookup_tickets(&[ticket.session_id.to_string()])
        .await?;
    assert_eq!(records[0].status, TicketStatus::Closed);
    assert_eq!(records[0].status_label, "Fechado");

    return Ok(());
}

#[tokio::test]
async fn it_omits_unknown_tickets_from_lookups() -> Result<()> {
    let backend = Simulated::default();
    let ticket = backend.create_ticket(request("Suporte")).await?;

    let records = backend
        .lookup_tickets(&["missing".to_string(), ticket.session_id.to_string()])
        .await?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label, "#0001");
    assert!(records[0].is_open_in("Suporte"));

    return Ok(());
}

#[tokio::test]
async fn it_fails_for_unknown_sessions() {
    let backend = Simulated::default();
    assert!(backend.fetch_transcript("missing").await.is_err());
    assert!(backend
        .send_message("missing", MessagePayload::Text("oi".to_string()))
        .await
        .is_err());
}
