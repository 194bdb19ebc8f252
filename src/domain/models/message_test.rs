use super::Delivery;
use super::Message;
use super::MessageKind;
use super::Sender;

#[test]
fn it_executes_new() {
    let msg = Message::text(Sender::Agent, "Olá!");
    assert_eq!(msg.sender, Sender::Agent);
    assert_eq!(msg.kind, MessageKind::Text);
    assert_eq!(msg.content, "Olá!".to_string());
    assert_eq!(msg.delivery(), Delivery::Confirmed);
    assert_eq!(msg.id.len(), 12);
}

#[test]
fn it_executes_pending_and_confirm() {
    let mut msg = Message::pending(Sender::User, MessageKind::Text, "Oi");
    assert!(msg.is_pending());

    msg.confirm();
    assert!(!msg.is_pending());
    assert_eq!(msg.delivery(), Delivery::Confirmed);
}

#[test]
fn it_creates_unique_ids() {
    let first = Message::text(Sender::User, "a");
    let second = Message::text(Sender::User, "a");
    assert_ne!(first.id, second.id);
}

#[test]
fn it_parses_remetente() {
    assert_eq!(Sender::parse("user"), Sender::User);
    assert_eq!(Sender::parse("bot"), Sender::Bot);
    assert_eq!(Sender::parse("agent"), Sender::Agent);
    assert_eq!(Sender::parse("admin"), Sender::Agent);
    assert_eq!(Sender::User.as_remetente(), "user");
}

#[test]
fn it_parses_tipo() {
    assert_eq!(MessageKind::parse("texto"), MessageKind::Text);
    assert_eq!(MessageKind::parse("arquivo"), MessageKind::File);
    assert_eq!(MessageKind::parse("audio"), MessageKind::Audio);
    assert_eq!(MessageKind::parse("unknown"), MessageKind::Text);
}

#[test]
fn it_builds_attachment_urls() {
    let msg = Message::new(Sender::User, MessageKind::Audio, "audio_1.webm");
    assert_eq!(
        msg.attachment_url("http://localhost:5000/", "/static/uploads/"),
        Some("http://localhost:5000/static/uploads/audio_1.webm".to_string())
    );
    assert_eq!(
        msg.attachment_url("http://localhost:5000", ""),
        Some("http://localhost:5000/audio_1.webm".to_string())
    );
}

#[test]
fn it_has_no_attachment_url_for_text_or_pending() {
    let text = Message::text(Sender::User, "hello");
    assert_eq!(text.attachment_url("http://localhost", "/static/uploads/"), None);

    let pending = Message::pending(Sender::User, MessageKind::File, "Arquivo: a.pdf");
    assert_eq!(
        pending.attachment_url("http://localhost", "/static/uploads/"),
        None
    );
}
