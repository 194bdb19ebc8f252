#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Recorder;
use crate::domain::models::RecorderName;

const CHUNK_SIZE: usize = 16 * 1024;

/// Stands in for a microphone by replaying a prerecorded `webm` file. The
/// file is read when capture starts and handed back in chunks on stop, the
/// way a media recorder emits data.
pub struct FileRecorder {
    file_path: String,
    captured: Mutex<Option<Vec<u8>>>,
}

impl Default for FileRecorder {
    fn default() -> FileRecorder {
        return FileRecorder::with_path(&Config::get(ConfigKey::RecorderFile));
    }
}

impl FileRecorder {
    pub fn with_path(file_path: &str) -> FileRecorder {
        return FileRecorder {
            file_path: file_path.to_string(),
            captured: Mutex::new(None),
        };
    }
}

#[async_trait]
impl Recorder for FileRecorder {
    fn name(&self) -> RecorderName {
        return RecorderName::File;
    }

    #[allow(clippy::implicit_return)]
    async fn start(&self) -> Result<()> {
        if self.file_path.is_empty() {
            bail!("No recording file configured");
        }

        let file_path = path::PathBuf::from(&self.file_path);
        if !file_path.is_file() {
            bail!(format!("Recording file {} does not exist", self.file_path));
        }

        let mut captured = self.captured.lock().await;
        if captured.is_some() {
            bail!("Recording already in progress");
        }

        *captured = Some(fs::read(&file_path).await?);
        tracing::debug!(file = self.file_path, "recording started");

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stop(&self) -> Result<Vec<Vec<u8>>> {
        let bytes = match self.captured.lock().await.take() {
            Some(bytes) => bytes,
            None => return Ok(vec![]),
        };

        let chunks = bytes
            .chunks(CHUNK_SIZE)
            .map(|e| return e.to_vec())
            .collect::<Vec<Vec<u8>>>();

        tracing::debug!(chunks = chunks.len(), "recording stopped");
        return Ok(chunks);
    }
}
