use super::SessionStatus;
use super::TicketRecord;
use super::TicketRequest;
use super::TicketStatus;

fn record(category: &str, status: &str) -> TicketRecord {
    return TicketRecord {
        uuid: "abc".to_string(),
        label: "#0001".to_string(),
        category: category.to_string(),
        status: TicketStatus::parse(status),
        status_label: status.to_string(),
    };
}

#[test]
fn it_parses_ticket_status() {
    assert_eq!(TicketStatus::parse("Aberto"), TicketStatus::Open);
    assert_eq!(TicketStatus::parse("open"), TicketStatus::Open);
    assert_eq!(TicketStatus::parse("Encerrado"), TicketStatus::Closed);
    assert_eq!(TicketStatus::parse(""), TicketStatus::Closed);
}

#[test]
fn it_parses_session_status() {
    assert_eq!(SessionStatus::parse("Encerrado"), SessionStatus::Closed);
    assert_eq!(SessionStatus::parse("closed"), SessionStatus::Closed);
    assert_eq!(SessionStatus::parse("Aberto"), SessionStatus::Open);
    assert_eq!(SessionStatus::parse(""), SessionStatus::Open);
}

#[test]
fn it_matches_open_tickets_by_category() {
    assert!(record("Financeiro", "Aberto").is_open_in("Financeiro"));
    assert!(!record("Financeiro", "Aberto").is_open_in("Suporte"));
    assert!(!record("Financeiro", "Encerrado").is_open_in("Financeiro"));
}

#[test]
fn it_formats_records() {
    insta::assert_snapshot!(record("Suporte", "Aberto").format(), @"#0001 [Aberto] Suporte");
}

#[test]
fn it_serializes_requests_without_empty_fields() {
    let req = TicketRequest {
        category: "Suporte".to_string(),
        name: None,
        phone: None,
    };
    assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"category":"Suporte"}"#);

    let req = TicketRequest {
        category: "Suporte".to_string(),
        name: Some("Ana".to_string()),
        phone: Some("11999999999".to_string()),
    };
    assert_eq!(
        serde_json::to_string(&req).unwrap(),
        r#"{"category":"Suporte","name":"Ana","phone":"11999999999"}"#
    );
}
