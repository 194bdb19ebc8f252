pub mod file;
pub mod none;
use anyhow::Result;

use crate::domain::models::RecorderBox;
use crate::domain::models::RecorderName;

pub struct RecorderManager {}

impl RecorderManager {
    pub fn get(name: RecorderName) -> Result<RecorderBox> {
        match name {
            RecorderName::File => return Ok(Box::<file::FileRecorder>::default()),
            RecorderName::None => return Ok(Box::<none::NoRecorder>::default()),
        }
    }
}
