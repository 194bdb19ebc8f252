use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecorderName {
    File,
    None,
}

impl RecorderName {
    pub fn parse(text: String) -> Option<RecorderName> {
        return RecorderName::iter().find(|e| return e.to_string() == text);
    }
}

#[async_trait]
pub trait Recorder {
    /// Returns the name of the recorder.
    fn name(&self) -> RecorderName;

    /// Acquires the microphone and begins capturing. An error here is shown
    /// to the visitor as a permission failure.
    async fn start(&self) -> Result<()>;

    /// Stops capturing, releases the device, and hands back the captured
    /// chunks in the order they were produced.
    async fn stop(&self) -> Result<Vec<Vec<u8>>>;
}

pub type RecorderBox = Box<dyn Recorder + Send + Sync>;
