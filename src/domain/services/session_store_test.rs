use std::env;
use std::path;

use anyhow::Result;
use tokio::fs;

use super::SessionStore;
use super::StoredState;
use crate::domain::models::BotStep;
use crate::domain::models::TicketRequest;

impl SessionStore {
    /// A store that never touches disk.
    pub fn ephemeral() -> SessionStore {
        return SessionStore {
            file_path: None,
            state: StoredState::default(),
        };
    }
}

fn temp_state_path() -> path::PathBuf {
    return env::temp_dir()
        .join(format!("chatdesk-{}", uuid::Uuid::new_v4()))
        .join("state.yaml");
}

#[tokio::test]
async fn it_starts_empty_without_a_file() -> Result<()> {
    let store = SessionStore::load(temp_state_path()).await?;

    assert!(store.active_session().is_none());
    assert!(store.history().is_empty());
    assert_eq!(store.state().bot_step, BotStep::Idle);

    return Ok(());
}

#[tokio::test]
async fn it_never_duplicates_history() -> Result<()> {
    let mut store = SessionStore::ephemeral();
    store.activate("abc", "#0001", "Suporte").await?;
    store.clear_active().await?;
    store.activate("abc", "#0001", "Suporte").await?;
    store.activate("def", "#0002", "Financeiro").await?;

    assert_eq!(store.history(), &["abc".to_string(), "def".to_string()]);
    assert_eq!(store.active_session(), Some("def"));

    return Ok(());
}

#[tokio::test]
async fn it_clears_the_active_session_only() -> Result<()> {
    let mut store = SessionStore::ephemeral();
    store.activate("abc", "#0001", "Suporte").await?;
    store.clear_active().await?;

    assert!(store.active_session().is_none());
    assert!(store.state().active_ticket.is_none());
    assert_eq!(store.history(), &["abc".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_persists_and_reloads_state() -> Result<()> {
    let file_path = temp_state_path();
    let draft = TicketRequest {
        category: "Suporte".to_string(),
        name: Some("Ana".to_string()),
        phone: None,
    };

    let mut store = SessionStore::load(file_path.clone()).await?;
    store.activate("abc", "#0001", "Suporte").await?;
    store.clear_active().await?;
    store
        .set_step(BotStep::WaitingPhone, Some(draft.clone()))
        .await?;

    let reloaded = SessionStore::load(file_path.clone()).await?;
    assert_eq!(reloaded.state().bot_step, BotStep::WaitingPhone);
    assert_eq!(reloaded.state().bot_draft, Some(draft));
    assert_eq!(reloaded.history(), &["abc".to_string()]);
    assert!(reloaded.active_session().is_none());

    let payload = fs::read_to_string(&file_path).await?;
    assert!(payload.contains("botStep: waiting_phone"));
    assert!(payload.contains("ticketHistory:"));

    fs::remove_dir_all(file_path.parent().unwrap()).await?;
    return Ok(());
}

#[tokio::test]
async fn it_deletes_the_file_on_clear() -> Result<()> {
    let file_path = temp_state_path();
    let mut store = SessionStore::load(file_path.clone()).await?;
    store.activate("abc", "#0001", "Suporte").await?;
    assert!(file_path.exists());

    store.clear().await?;
    assert!(!file_path.exists());
    assert!(store.history().is_empty());

    fs::remove_dir_all(file_path.parent().unwrap()).await?;
    return Ok(());
}
