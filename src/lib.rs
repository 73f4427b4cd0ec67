// Discord webhook output nodes for node-based image generation workflows.
//
// Three nodes: one stores the webhook URL outside of shareable workflow
// files, two post generated images (and optional text) through it.

pub mod credentials;
pub mod errors;
pub mod image_input;
pub mod nodes;
pub mod poster;
pub mod settings;

pub use credentials::{WebhookStore, WEBHOOK_ENV_VAR, WEBHOOK_URL_PREFIX};
pub use errors::{AppError, AppResult};
pub use image_input::{normalize, test_pattern, ImageInput, PixelArray, TensorSource};
pub use nodes::{registry, PostViaWebhook, PostViaWebhookWithInput, SetWebhook};
pub use poster::discord_client::{Attachment, WebhookClient, WebhookTransport};
pub use poster::post::{post, PostOptions};
pub use settings::Settings;
