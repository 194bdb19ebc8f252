use super::Attachment;
use super::BackendName;
use super::MessagePayload;
use crate::domain::models::MessageKind;

#[test]
fn it_parses_backend_names() {
    assert_eq!(
        BackendName::parse("helpdesk".to_string()),
        Some(BackendName::Helpdesk)
    );
    assert_eq!(
        BackendName::parse("simulated".to_string()),
        Some(BackendName::Simulated)
    );
    assert_eq!(BackendName::parse("Helpdesk".to_string()), None);
}

#[test]
fn it_maps_payload_kinds() {
    assert_eq!(
        MessagePayload::Text("oi".to_string()).kind(),
        MessageKind::Text
    );
    assert_eq!(
        MessagePayload::File(Attachment::default()).kind(),
        MessageKind::File
    );
    assert_eq!(MessagePayload::Audio(vec![1, 2]).kind(), MessageKind::Audio);
}
