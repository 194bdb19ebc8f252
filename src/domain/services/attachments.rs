#[cfg(test)]
#[path = "attachments_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;

use crate::domain::models::Attachment;

pub const MAX_ATTACHMENT_BYTES: usize = 16 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "pdf", "doc", "docx", "csv", "xlsx"];

fn extension(file_name: &str) -> String {
    return path::Path::new(file_name)
        .extension()
        .map(|e| return e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
}

pub struct Attachments {}

impl Attachments {
    /// Guessed from the extension. Unknown types are sent as octet streams.
    pub fn mime_for(file_name: &str) -> String {
        return mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .to_string();
    }

    pub fn validate(attachment: &Attachment) -> Result<()> {
        let ext = extension(&attachment.file_name);
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            bail!(format!(
                "Tipo de arquivo não permitido: {}. Envie {}.",
                attachment.file_name,
                ALLOWED_EXTENSIONS.join(", ")
            ));
        }

        if attachment.bytes.is_empty() {
            bail!(format!("O arquivo {} está vazio.", attachment.file_name));
        }

        if attachment.bytes.len() > MAX_ATTACHMENT_BYTES {
            bail!(format!(
                "O arquivo {} excede o limite de 16 MB.",
                attachment.file_name
            ));
        }

        return Ok(());
    }

    pub async fn load(file_path: &path::Path) -> Result<Attachment> {
        if !file_path.is_file() {
            bail!(format!("Arquivo não encontrado: {}", file_path.display()));
        }

        let metadata = fs::metadata(file_path).await?;
        if metadata.len() > MAX_ATTACHMENT_BYTES as u64 {
            bail!(format!(
                "O arquivo {} excede o limite de 16 MB.",
                file_path.display()
            ));
        }

        let file_name = file_path
            .file_name()
            .map(|e| return e.to_string_lossy().to_string())
            .unwrap_or_default();
        let bytes = fs::read(file_path).await?;

        return Ok(Attachment {
            mime: Attachments::mime_for(&file_name),
            file_name,
            bytes,
        });
    }
}
