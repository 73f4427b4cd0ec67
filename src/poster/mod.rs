// Posting pipeline: encode frames into size-bounded attachments, batch them,
// dispatch one webhook call per batch.

pub mod attachments;
pub mod discord_client;
pub mod post;

pub use discord_client::{Attachment, WebhookClient, WebhookTransport};
pub use post::{post, PostOptions};
