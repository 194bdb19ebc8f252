pub mod helpdesk;
pub mod simulated;
use anyhow::Result;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;

pub struct BackendManager {}

impl BackendManager {
    pub fn get(name: BackendName) -> Result<BackendBox> {
        match name {
            BackendName::Helpdesk => return Ok(Box::<helpdesk::Helpdesk>::default()),
            BackendName::Simulated => return Ok(Box::<simulated::Simulated>::default()),
        }
    }
}
