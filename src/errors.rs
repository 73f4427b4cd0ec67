use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid webhook URL: {url}. Must start with 'https://discord.com/api/webhooks/'")]
    InvalidWebhook { url: String },

    #[error("Missing Discord webhook URL. Set env DISCORD_WEBHOOK_URL or create secrets/webhook.txt")]
    MissingWebhook,

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convert to string for host frameworks that report error text verbatim
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.to_string()
    }
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn invalid_webhook(url: &str) -> Self {
        Self::InvalidWebhook {
            url: url.to_string(),
        }
    }

    pub fn upload_failed(reason: String) -> Self {
        Self::UploadFailed { reason }
    }
}
