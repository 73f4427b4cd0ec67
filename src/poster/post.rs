use crate::credentials::{webhook_id, WebhookStore};
use crate::errors::{AppError, AppResult};
use crate::image_input::{normalize, ImageInput};

use super::attachments::encode_attachments;
use super::discord_client::{Attachment, WebhookTransport};

/// Discord allows 10 files per message nowadays; 4 keeps a wide safety
/// margin against the size cap.
pub const MAX_FILES_PER_REQUEST: usize = 4;

/// Flags and text for one posting operation.
///
/// These are the function-level defaults: a bare call sends both the message
/// and the image. The node schemas declare their own widget defaults, which
/// differ (see [`crate::nodes`]).
#[derive(Debug, Clone)]
pub struct PostOptions {
    pub send_message: bool,
    pub send_image: bool,
    pub message: String,
    pub prepend_message: String,
}

impl Default for PostOptions {
    fn default() -> Self {
        Self {
            send_message: true,
            send_image: true,
            message: String::new(),
            prepend_message: String::new(),
        }
    }
}

/// Posts an image (and/or a message) to the webhook resolved from `store`.
///
/// Attachments go out in order, at most [`MAX_FILES_PER_REQUEST`] per call,
/// each call awaited before the next; the composed message accompanies every
/// batch call. With no attachments a single content-only call goes out.
/// Batches already sent stay sent if a later one fails.
pub async fn post(
    store: &WebhookStore,
    transport: &dyn WebhookTransport,
    image: Option<&ImageInput>,
    opts: &PostOptions,
) -> AppResult<()> {
    let url = store.resolve();
    if url.is_empty() {
        return Err(AppError::MissingWebhook);
    }

    let content = compose_message(opts);

    let batches: Vec<Vec<Attachment>> = if opts.send_image {
        let frames = normalize(image)?;
        let attachments = encode_attachments(&frames)?;
        attachments
            .chunks(MAX_FILES_PER_REQUEST)
            .map(<[Attachment]>::to_vec)
            .collect()
    } else {
        Vec::new()
    };

    if batches.is_empty() {
        transport.execute(&url, &content, &[]).await?;
        return Ok(());
    }

    log::info!(
        "Posting {} batch(es) to webhook {}",
        batches.len(),
        webhook_id(&url)
    );
    for batch in &batches {
        transport.execute(&url, &content, batch).await?;
    }

    Ok(())
}

/// `prepend_message` (trimmed), a newline if non-empty, then `message`.
fn compose_message(opts: &PostOptions) -> String {
    if !opts.send_message {
        return String::new();
    }

    let mut content = opts.prepend_message.trim().to_string();
    if !content.is_empty() {
        content.push('\n');
    }
    content.push_str(&opts.message);
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::lock_env;
    use crate::image_input::PixelArray;
    use async_trait::async_trait;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const VALID_URL: &str = "https://discord.com/api/webhooks/123/abc";

    #[derive(Debug, Clone)]
    struct Call {
        url: String,
        content: String,
        file_count: usize,
    }

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingTransport {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for RecordingTransport {
        async fn execute(&self, url: &str, content: &str, files: &[Attachment]) -> AppResult<()> {
            self.calls.lock().unwrap().push(Call {
                url: url.to_string(),
                content: content.to_string(),
                file_count: files.len(),
            });
            Ok(())
        }
    }

    fn configured_store() -> (TempDir, WebhookStore) {
        let dir = TempDir::new().unwrap();
        let store = WebhookStore::new(dir.path());
        store.persist(VALID_URL).unwrap();
        (dir, store)
    }

    fn batch_input(frames: usize) -> ImageInput {
        let pixels =
            PixelArray::new(vec![frames, 8, 8, 3], vec![0.5; frames * 8 * 8 * 3]).unwrap();
        ImageInput::Pixels(pixels)
    }

    #[tokio::test]
    async fn single_image_issues_one_call_with_empty_content() {
        let _guard = lock_env();
        env::remove_var(crate::credentials::WEBHOOK_ENV_VAR);
        let (_dir, store) = configured_store();
        let transport = RecordingTransport::default();

        let image = batch_input(1);
        let opts = PostOptions {
            send_message: false,
            ..PostOptions::default()
        };
        post(&store, &transport, Some(&image), &opts).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, VALID_URL);
        assert_eq!(calls[0].content, "");
        assert_eq!(calls[0].file_count, 1);
    }

    #[tokio::test]
    async fn nine_frames_split_into_three_batches() {
        let _guard = lock_env();
        env::remove_var(crate::credentials::WEBHOOK_ENV_VAR);
        let (_dir, store) = configured_store();
        let transport = RecordingTransport::default();

        let image = batch_input(9);
        let opts = PostOptions {
            message: "done".to_string(),
            ..PostOptions::default()
        };
        post(&store, &transport, Some(&image), &opts).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        let counts: Vec<usize> = calls.iter().map(|c| c.file_count).collect();
        assert_eq!(counts, vec![4, 4, 1]);
        // The same composed message accompanies every batch call.
        assert!(calls.iter().all(|c| c.content == "done"));
    }

    #[tokio::test]
    async fn missing_url_fails_before_any_call() {
        let _guard = lock_env();
        env::remove_var(crate::credentials::WEBHOOK_ENV_VAR);
        let dir = TempDir::new().unwrap();
        let store = WebhookStore::new(dir.path());
        let transport = RecordingTransport::default();

        let result = post(&store, &transport, None, &PostOptions::default()).await;

        assert!(matches!(result, Err(AppError::MissingWebhook)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn suppressed_image_sends_one_content_only_call() {
        let _guard = lock_env();
        env::remove_var(crate::credentials::WEBHOOK_ENV_VAR);
        let (_dir, store) = configured_store();
        let transport = RecordingTransport::default();

        let opts = PostOptions {
            send_image: false,
            message: "hello".to_string(),
            prepend_message: "  from the workflow  ".to_string(),
            ..PostOptions::default()
        };
        post(&store, &transport, Some(&batch_input(2)), &opts)
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file_count, 0);
        assert_eq!(calls[0].content, "from the workflow\nhello");
    }

    #[tokio::test]
    async fn absent_image_posts_the_test_card() {
        let _guard = lock_env();
        env::remove_var(crate::credentials::WEBHOOK_ENV_VAR);
        let (_dir, store) = configured_store();
        let transport = RecordingTransport::default();

        post(&store, &transport, None, &PostOptions::default())
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file_count, 1);
    }

    #[test]
    fn compose_skips_newline_for_empty_prepend() {
        let opts = PostOptions {
            message: "hello".to_string(),
            ..PostOptions::default()
        };
        assert_eq!(compose_message(&opts), "hello");
    }

    #[test]
    fn compose_is_empty_when_message_suppressed() {
        let opts = PostOptions {
            send_message: false,
            message: "hello".to_string(),
            prepend_message: "pre".to_string(),
            ..PostOptions::default()
        };
        assert_eq!(compose_message(&opts), "");
    }
}
