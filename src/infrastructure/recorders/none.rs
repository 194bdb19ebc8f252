#[cfg(test)]
#[path = "none_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Recorder;
use crate::domain::models::RecorderName;

/// A device without a microphone.
#[derive(Default)]
pub struct NoRecorder {}

#[async_trait]
impl Recorder for NoRecorder {
    fn name(&self) -> RecorderName {
        return RecorderName::None;
    }

    #[allow(clippy::implicit_return)]
    async fn start(&self) -> Result<()> {
        bail!("No microphone available");
    }

    #[allow(clippy::implicit_return)]
    async fn stop(&self) -> Result<Vec<Vec<u8>>> {
        return Ok(vec![]);
    }
}
