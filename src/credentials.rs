use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

/// Highest-priority credential source, meant for deployment-level overrides.
pub const WEBHOOK_ENV_VAR: &str = "DISCORD_WEBHOOK_URL";

/// Every Discord incoming webhook lives under this prefix.
pub const WEBHOOK_URL_PREFIX: &str = "https://discord.com/api/webhooks/";

const SECRETS_DIR: &str = "secrets";
const WEBHOOK_FILE: &str = "webhook.txt";
// Pre-0.3 location, read but never written.
const LEGACY_FILE: &str = "discord_webhook_url.txt";

/// Layered webhook URL storage.
///
/// Resolution checks the `DISCORD_WEBHOOK_URL` environment variable, then
/// `secrets/webhook.txt` under the base directory, then the legacy file.
/// The URL never ends up inside a workflow file, so sharing a workflow
/// shares no credentials.
#[derive(Debug, Clone)]
pub struct WebhookStore {
    base_dir: PathBuf,
}

impl Default for WebhookStore {
    fn default() -> Self {
        Self::new(default_base_dir())
    }
}

impl WebhookStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn secret_file(&self) -> PathBuf {
        self.base_dir.join(SECRETS_DIR).join(WEBHOOK_FILE)
    }

    fn legacy_file(&self) -> PathBuf {
        self.base_dir.join(LEGACY_FILE)
    }

    /// Returns the first non-empty, whitespace-trimmed value across the
    /// three sources, or the empty string. Never fails; an unreadable file
    /// counts as an absent source.
    pub fn resolve(&self) -> String {
        if let Ok(value) = env::var(WEBHOOK_ENV_VAR) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                log::debug!("Webhook URL resolved from {}", WEBHOOK_ENV_VAR);
                return trimmed.to_string();
            }
        }

        let from_secret = read_trimmed(&self.secret_file());
        if !from_secret.is_empty() {
            return from_secret;
        }

        read_trimmed(&self.legacy_file())
    }

    /// Validates the URL prefix and overwrites the secret file with the
    /// trimmed value.
    pub fn persist(&self, url: &str) -> AppResult<()> {
        let trimmed = url.trim();
        if !trimmed.starts_with(WEBHOOK_URL_PREFIX) {
            return Err(AppError::invalid_webhook(trimmed));
        }

        let secret_file = self.secret_file();
        if let Some(parent) = secret_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&secret_file, trimmed)?;

        log::info!(
            "Stored webhook {} in {}",
            webhook_id(trimmed),
            secret_file.display()
        );
        Ok(())
    }
}

fn default_base_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(env::temp_dir)
        .join("discord-webhook-nodes")
}

fn read_trimmed(path: &Path) -> String {
    fs::read_to_string(path)
        .map(|contents| contents.trim().to_string())
        .unwrap_or_default()
}

/// Id segment of a webhook URL, safe to log; the token tail is not.
pub(crate) fn webhook_id(url: &str) -> &str {
    url.split('/').nth_back(1).unwrap_or("unknown")
}

/// Serializes tests that touch the process-wide webhook env var.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn lock_env() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
