use async_trait::async_trait;
use reqwest::{multipart, Client};
use std::time::Duration;

use crate::credentials::webhook_id;
use crate::errors::{AppError, AppResult};

/// Discord cuts message content at this many characters.
pub const MAX_CONTENT_LENGTH: usize = 2000;

/// Fixed per-call budget; Discord answers well within this.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One named binary blob attached to a webhook call.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Outbound webhook seam. The production implementation is [`WebhookClient`];
/// tests substitute a recording fake.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// One POST to the webhook carrying `content` (truncated at call time)
    /// and zero or more file attachments.
    async fn execute(&self, url: &str, content: &str, files: &[Attachment]) -> AppResult<()>;
}

/// Discord webhook client over reqwest multipart.
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new() -> AppResult<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for WebhookClient {
    async fn execute(&self, url: &str, content: &str, files: &[Attachment]) -> AppResult<()> {
        // Attachments are always PNG-encoded by the packager.
        let mut form = multipart::Form::new().text("content", truncate_content(content));
        for (index, file) in files.iter().enumerate() {
            let part = multipart::Part::bytes(file.bytes.clone())
                .file_name(file.filename.clone())
                .mime_str("image/png")?;
            form = form.part(format!("files[{}]", index), part);
        }

        log::debug!(
            "Posting {} file(s) to webhook {}",
            files.len(),
            webhook_id(url)
        );

        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::upload_failed(format!(
                "Discord API error {} for webhook {}: {}",
                status,
                webhook_id(url),
                error_text
            )));
        }

        Ok(())
    }
}

/// Character-wise cut at the Discord limit; every call applies it
/// independently of any earlier truncation.
fn truncate_content(content: &str) -> String {
    match content.char_indices().nth(MAX_CONTENT_LENGTH) {
        Some((cut, _)) => content[..cut].to_string(),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_untouched() {
        assert_eq!(truncate_content("hello"), "hello");
        assert_eq!(truncate_content(""), "");
    }

    #[test]
    fn long_content_is_cut_at_the_limit() {
        let content = "a".repeat(MAX_CONTENT_LENGTH + 500);
        assert_eq!(truncate_content(&content).chars().count(), MAX_CONTENT_LENGTH);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "é".repeat(MAX_CONTENT_LENGTH + 100);
        let truncated = truncate_content(&content);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_LENGTH);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn attachment_reports_its_size() {
        let attachment = Attachment::new("image_0.png", vec![1, 2, 3]);
        assert_eq!(attachment.len(), 3);
        assert!(!attachment.is_empty());
    }
}
