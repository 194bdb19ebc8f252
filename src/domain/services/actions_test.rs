use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::ActionsService;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::MessageKind;
use crate::domain::models::MessagePayload;
use crate::domain::models::SendOutcome;
use crate::domain::models::TicketRequest;
use crate::infrastructure::backends::simulated::Simulated;
use crate::infrastructure::recorders::none::NoRecorder;

#[tokio::test]
async fn it_reports_results_as_events() -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let worker = tokio::spawn(async move {
        return ActionsService::start(
            Box::<Simulated>::default(),
            Box::<NoRecorder>::default(),
            event_tx,
            &mut action_rx,
        )
        .await;
    });

    action_tx.send(Action::CreateTicket {
        flow_id: "flow".to_string(),
        request: TicketRequest {
            category: "Suporte".to_string(),
            name: Some("Ana".to_string()),
            phone: Some("11999999999".to_string()),
        },
    })?;

    let session_id = match event_rx.recv().await {
        Some(Event::TicketCreated { flow_id, result }) => {
            assert_eq!(flow_id, "flow");
            let created = result?;
            assert_eq!(created.label, "#0001");
            created.session_id
        }
        _ => bail!("Expected a ticket creation result"),
    };

    action_tx.send(Action::SendMessage {
        session_id: session_id.to_string(),
        epoch: "e1".to_string(),
        message_id: "m1".to_string(),
        payload: MessagePayload::Text("oi".to_string()),
    })?;

    match event_rx.recv().await {
        Some(Event::MessageSent {
            epoch,
            message_id,
            kind,
            result,
        }) => {
            assert_eq!(epoch, "e1");
            assert_eq!(message_id, "m1");
            assert_eq!(kind, MessageKind::Text);
            assert_eq!(result?, SendOutcome::Delivered);
        }
        _ => bail!("Expected a send result"),
    }

    action_tx.send(Action::StartRecording("e1".to_string()))?;
    match event_rx.recv().await {
        Some(Event::RecordingStarted { result, .. }) => assert!(result.is_err()),
        _ => bail!("Expected a recording result"),
    }

    drop(action_tx);
    worker.await??;

    return Ok(());
}
