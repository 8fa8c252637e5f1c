use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

use crate::error::Error;
use crate::extract;
use crate::signature;

/// Fixed reply sent when anything after the signature gate fails.
pub const APOLOGY: &str = "sorry, I couldn't generate your image.";

const KEY_PREFIX: &str = "generated_images";
const MAX_SLUG_LEN: usize = 64;

/// Time-limited download URL for a stored image. Expiry is final; there is
/// no renewal.
#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: OffsetDateTime,
}

/// What gets posted back into the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReplyMessage {
    Image { original_content_url: String, preview_image_url: String },
    Text { text: String },
}

impl ReplyMessage {
    pub fn image(url: &str) -> Self {
        Self::Image { original_content_url: url.to_owned(), preview_image_url: url.to_owned() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[async_trait]
pub trait GenerateImage {
    /// Turns a prompt into one decoded binary image. Single attempt.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, Error>;
}

#[async_trait]
pub trait StoreArtifact {
    /// Persists the image under `key` and mints a signed download URL.
    async fn store(&self, image: Vec<u8>, key: &str) -> Result<SignedUrl, Error>;
}

#[async_trait]
pub trait DispatchReply {
    /// Shows a "working on it" indicator in the user's chat. Best effort;
    /// implementations log failures instead of returning them.
    async fn send_working(&self, user_id: &str);

    /// Posts the final reply into the conversation.
    async fn send_result(&self, reply_token: &str, message: ReplyMessage) -> Result<(), Error>;
}

/// Composes the signature gate, extraction, generation, storage and reply
/// dispatch into the two entry-point flows. Built once at startup with the
/// real clients and shared for the life of the process.
pub struct Pipeline<G, S, D> {
    generator: G,
    store: S,
    dispatcher: D,
    channel_secret: Option<String>,
}

impl<G, S, D> Pipeline<G, S, D>
where
    G: GenerateImage + Send + Sync,
    S: StoreArtifact + Send + Sync,
    D: DispatchReply + Send + Sync,
{
    pub const fn new(generator: G, store: S, dispatcher: D, channel_secret: Option<String>) -> Self {
        Self { generator, store, dispatcher, channel_secret }
    }

    /// Webhook variant: authenticate, generate, store, reply with the image.
    ///
    /// Failures past the signature gate send one best-effort apology using
    /// the reply token salvaged from the raw body, so the user hears back
    /// even when typed extraction is what failed. Signature failures send
    /// nothing at all.
    pub async fn handle_webhook(
        &self,
        header_signature: Option<&str>,
        body: &[u8],
    ) -> Result<SignedUrl, Error> {
        let secret = self
            .channel_secret
            .as_deref()
            .ok_or(Error::Configuration("LINE_CHANNEL_SECRET"))?;

        let header_signature = header_signature.ok_or(Error::Authentication)?;
        if !signature::verify(header_signature, body, secret) {
            return Err(Error::Authentication);
        }
        log::debug!("signature verification passed");

        match self.run_webhook(body).await {
            Ok(signed) => Ok(signed),
            Err(err) => {
                log::error!("webhook pipeline failed: {err}");

                if let Some(reply_token) = extract::salvage_reply_token(body) {
                    if let Err(err) =
                        self.dispatcher.send_result(&reply_token, ReplyMessage::text(APOLOGY)).await
                    {
                        log::error!("apology reply failed: {err}");
                    }
                }

                Err(err)
            }
        }
    }

    async fn run_webhook(&self, body: &[u8]) -> Result<SignedUrl, Error> {
        let request = extract::webhook_request(body)?;
        log::info!("generating image for {:?}", request.prompt);

        if let Some(user_id) = &request.user_id {
            self.dispatcher.send_working(user_id).await;
        }

        let image = self.generator.generate(&request.prompt).await?;
        let signed = self.store.store(image, &object_key(&request.prompt, true)).await?;

        // The response is already decided; a failed reply only gets logged.
        if let Err(err) =
            self.dispatcher.send_result(&request.reply_token, ReplyMessage::image(&signed.url)).await
        {
            log::error!("image reply failed: {err}");
        }

        Ok(signed)
    }

    /// Direct variant: no authentication (callers are trusted internal
    /// services) and no reply dispatch; the URL is the whole response.
    pub async fn handle_direct(&self, body: &[u8]) -> Result<SignedUrl, Error> {
        let prompt = extract::direct_request(body)?;
        log::info!("generating image for {prompt:?}");

        let image = self.generator.generate(&prompt).await?;
        self.store.store(image, &object_key(&prompt, false)).await
    }
}

/// Builds a per-invocation storage key. The fresh UUID keeps concurrent and
/// repeated invocations from ever overwriting each other; the prompt slug
/// only exists to make keys human-readable.
fn object_key(prompt: &str, timestamped: bool) -> String {
    let id = Uuid::new_v4().simple();
    let slug = slug(prompt);

    if timestamped {
        let stamp = OffsetDateTime::now_utc()
            .format(format_description!("[year][month][day][hour][minute][second]"))
            .unwrap();
        format!("{KEY_PREFIX}/{stamp}_{id}/image_{slug}.jpg")
    } else {
        format!("{KEY_PREFIX}/{id}/image_{slug}.jpg")
    }
}

/// Reduces a prompt to a key-safe slug. Anything that could break or
/// traverse a storage key (slashes, control bytes, non-ASCII) becomes an
/// underscore.
fn slug(prompt: &str) -> String {
    prompt
        .chars()
        .take(MAX_SLUG_LEN)
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' { ch } else { '_' })
        .collect()
}
