#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use chrono::Local;
use chrono::SecondsFormat;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BotStep;
use crate::domain::models::TicketRequest;

/// Everything the client keeps between runs. All fields are optional, and an
/// absent file is the same as a fresh device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_ticket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_category: Option<String>,
    #[serde(default)]
    pub bot_step: BotStep,
    /// Details collected by the pre-chat so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_draft: Option<TicketRequest>,
    #[serde(default)]
    pub ticket_history: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

pub struct SessionStore {
    file_path: Option<path::PathBuf>,
    state: StoredState,
}

impl SessionStore {
    pub fn default_path() -> path::PathBuf {
        return path::PathBuf::from(Config::get(ConfigKey::StateFile));
    }

    pub async fn load(file_path: path::PathBuf) -> Result<SessionStore> {
        let mut store = SessionStore {
            file_path: Some(file_path.clone()),
            state: StoredState::default(),
        };

        if file_path.exists() {
            let payload = fs::read_to_string(&file_path).await?;
            if !payload.trim().is_empty() {
                store.state = serde_yaml::from_str(&payload)?;
            }
        }

        return Ok(store);
    }

    pub fn file_path(&self) -> Option<&path::Path> {
        return self.file_path.as_deref();
    }

    pub fn state(&self) -> &StoredState {
        return &self.state;
    }

    pub fn active_session(&self) -> Option<&str> {
        return self.state.active_session.as_deref();
    }

    pub fn history(&self) -> &[String] {
        return &self.state.ticket_history;
    }

    /// Marks a ticket as the one this device is chatting on, and records it
    /// in the device history.
    pub async fn activate(&mut self, session_id: &str, ticket_label: &str, category: &str) -> Result<()> {
        self.state.active_session = Some(session_id.to_string());
        self.state.active_ticket = Some(ticket_label.to_string());
        self.state.active_category = Some(category.to_string());
        if !self.state.ticket_history.iter().any(|e| return e == session_id) {
            self.state.ticket_history.push(session_id.to_string());
        }

        return self.flush().await;
    }

    pub async fn clear_active(&mut self) -> Result<()> {
        if self.state.active_session.is_none()
            && self.state.active_ticket.is_none()
            && self.state.active_category.is_none()
        {
            return Ok(());
        }

        self.state.active_session = None;
        self.state.active_ticket = None;
        self.state.active_category = None;

        return self.flush().await;
    }

    pub async fn set_step(&mut self, step: BotStep, draft: Option<TicketRequest>) -> Result<()> {
        self.state.bot_step = step;
        self.state.bot_draft = draft;

        return self.flush().await;
    }

    /// Drops everything, history included.
    pub async fn clear(&mut self) -> Result<()> {
        self.state = StoredState::default();
        if let Some(file_path) = &self.file_path {
            if file_path.exists() {
                fs::remove_file(file_path).await?;
            }
        }

        return Ok(());
    }

    async fn flush(&mut self) -> Result<()> {
        self.state.updated_at = Some(Local::now().to_rfc3339_opts(SecondsFormat::Secs, false));

        let file_path = match &self.file_path {
            Some(file_path) => file_path,
            None => return Ok(()),
        };

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_yaml::to_string(&self.state)?;
        let mut file = fs::File::create(file_path).await?;
        file.write_all(payload.as_bytes()).await?;

        tracing::debug!(
            step = %self.state.bot_step,
            session_id = ?self.state.active_session,
            "saved client state"
        );

        return Ok(());
    }
}
