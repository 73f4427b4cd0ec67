use std::time::Duration;

use image::DynamicImage;
use serde::Serialize;
use serde_json::json;

use crate::credentials::WebhookStore;
use crate::errors::AppResult;
use crate::image_input::{test_pattern, ImageInput};
use crate::poster::discord_client::WebhookClient;
use crate::poster::post::{post, PostOptions};
use crate::settings::Settings;

const CATEGORY: &str = "Discord";

/// Socket types the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputKind {
    Image,
    String,
    Boolean,
}

/// One input socket of a node schema.
#[derive(Debug, Clone, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub kind: InputKind,
    pub required: bool,
    /// Rendered as a connectable socket instead of a literal widget.
    pub force_input: bool,
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl InputSpec {
    fn required(name: &'static str, kind: InputKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            force_input: false,
            multiline: false,
            default: None,
        }
    }

    fn optional(name: &'static str, kind: InputKind, default: serde_json::Value) -> Self {
        Self {
            name,
            kind,
            required: false,
            force_input: false,
            multiline: false,
            default: Some(default),
        }
    }

    fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    fn force_input(mut self) -> Self {
        self.force_input = true;
        self
    }
}

/// Node descriptor handed to the host registry.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDescriptor {
    pub type_name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub inputs: Vec<InputSpec>,
}

fn store_from(settings: &Settings) -> WebhookStore {
    match &settings.credentials_dir {
        Some(dir) => WebhookStore::new(dir),
        None => WebhookStore::default(),
    }
}

fn client_from(settings: &Settings) -> AppResult<WebhookClient> {
    WebhookClient::with_timeout(Duration::from_secs(settings.request_timeout_secs))
}

/// Validates and stores the webhook URL. Emits the test card as the
/// placeholder output the host's data-flow model requires.
pub struct SetWebhook {
    store: WebhookStore,
}

impl SetWebhook {
    pub fn new(store: WebhookStore) -> Self {
        Self { store }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(store_from(settings))
    }

    pub fn descriptor() -> NodeDescriptor {
        NodeDescriptor {
            type_name: "DiscordSetWebhook",
            display_name: "Set Discord Webhook",
            category: CATEGORY,
            inputs: vec![InputSpec::required("URL", InputKind::String)],
        }
    }

    pub fn execute(&self, url: &str) -> AppResult<DynamicImage> {
        self.store.persist(url)?;
        Ok(test_pattern())
    }
}

/// Posts an image and/or message through the stored webhook; `message` and
/// `prepend_message` are literal widgets.
pub struct PostViaWebhook {
    store: WebhookStore,
    client: WebhookClient,
}

impl PostViaWebhook {
    pub fn new(store: WebhookStore, client: WebhookClient) -> Self {
        Self { store, client }
    }

    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self::new(store_from(settings), client_from(settings)?))
    }

    pub fn descriptor() -> NodeDescriptor {
        NodeDescriptor {
            type_name: "DiscordPostViaWebhook",
            display_name: "Use Discord Webhook",
            category: CATEGORY,
            inputs: vec![
                InputSpec::required("image", InputKind::Image),
                InputSpec::optional("send_Message", InputKind::Boolean, json!(false)),
                InputSpec::optional("send_Image", InputKind::Boolean, json!(true)),
                InputSpec::optional("message", InputKind::String, json!("")).multiline(),
                InputSpec::optional("prepend_message", InputKind::String, json!("")).multiline(),
            ],
        }
    }

    /// Runs the posting operation; the input image is passed through
    /// unchanged as the node's output.
    pub async fn execute(
        &self,
        image: Option<ImageInput>,
        opts: &PostOptions,
    ) -> AppResult<Option<ImageInput>> {
        post(&self.store, &self.client, image.as_ref(), opts).await?;
        Ok(image)
    }
}

/// Same operation as [`PostViaWebhook`], but `message` is a required
/// connectable input and `prepend_message` an optional one. The two nodes
/// share the posting function, not an implementation hierarchy.
pub struct PostViaWebhookWithInput {
    store: WebhookStore,
    client: WebhookClient,
}

impl PostViaWebhookWithInput {
    pub fn new(store: WebhookStore, client: WebhookClient) -> Self {
        Self { store, client }
    }

    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self::new(store_from(settings), client_from(settings)?))
    }

    pub fn descriptor() -> NodeDescriptor {
        NodeDescriptor {
            type_name: "DiscordPostViaWebhookWithInput",
            display_name: "Use Discord Webhook (+message input)",
            category: CATEGORY,
            inputs: vec![
                InputSpec::required("image", InputKind::Image),
                InputSpec::required("message", InputKind::String)
                    .multiline()
                    .force_input(),
                InputSpec::optional("send_Message", InputKind::Boolean, json!(false)),
                InputSpec::optional("send_Image", InputKind::Boolean, json!(true)),
                InputSpec::optional("prepend_message", InputKind::String, json!(""))
                    .multiline()
                    .force_input(),
            ],
        }
    }

    pub async fn execute(
        &self,
        image: Option<ImageInput>,
        opts: &PostOptions,
    ) -> AppResult<Option<ImageInput>> {
        post(&self.store, &self.client, image.as_ref(), opts).await?;
        Ok(image)
    }
}

/// Descriptors for every node this crate contributes to the host.
pub fn registry() -> Vec<NodeDescriptor> {
    vec![
        SetWebhook::descriptor(),
        PostViaWebhook::descriptor(),
        PostViaWebhookWithInput::descriptor(),
    ]
}
