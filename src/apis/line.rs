use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;

use crate::error::Error;
use crate::pipeline::{DispatchReply, ReplyMessage};

static REPLY_ENDPOINT: &str = "https://api.line.me/v2/bot/message/reply";
static LOADING_ENDPOINT: &str = "https://api.line.me/v2/bot/chat/loading/start";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyPayload<'a> {
    reply_token: &'a str,
    messages: [ReplyMessage; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadingPayload<'a> {
    chat_id: &'a str,
}

/// LINE Messaging API reply channel.
pub struct LineMessaging {
    http_client: reqwest::Client,
    access_token: Option<String>,
}

impl LineMessaging {
    pub const fn new(http_client: reqwest::Client, access_token: Option<String>) -> Self {
        Self { http_client, access_token }
    }

    async fn post<P: Serialize + Sync>(
        &self,
        endpoint: &str,
        token: &str,
        payload: &P,
    ) -> reqwest::Result<()> {
        self.http_client
            .post(endpoint)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[async_trait]
impl DispatchReply for LineMessaging {
    async fn send_working(&self, user_id: &str) {
        let Some(token) = self.access_token.as_deref() else {
            log::warn!("LINE_CHANNEL_ACCESS_TOKEN was not specified, skipping loading indicator");
            return;
        };

        // Cosmetic, so failures stop here.
        if let Err(err) = self.post(LOADING_ENDPOINT, token, &LoadingPayload { chat_id: user_id }).await
        {
            log::warn!("loading indicator failed: {err}");
        }
    }

    async fn send_result(&self, reply_token: &str, message: ReplyMessage) -> Result<(), Error> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(Error::Configuration("LINE_CHANNEL_ACCESS_TOKEN"))?;

        self.post(REPLY_ENDPOINT, token, &ReplyPayload { reply_token, messages: [message] })
            .await
            .map_err(|err| Error::Dispatch(err.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reply_payload_wire_shape() {
        let payload = ReplyPayload {
            reply_token: "T1",
            messages: [ReplyMessage::image("https://example.com/i.jpg")],
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "replyToken": "T1",
                "messages": [{
                    "type": "image",
                    "originalContentUrl": "https://example.com/i.jpg",
                    "previewImageUrl": "https://example.com/i.jpg",
                }],
            })
        );
    }

    #[test]
    fn test_loading_payload_wire_shape() {
        assert_eq!(
            serde_json::to_value(LoadingPayload { chat_id: "U1" }).unwrap(),
            serde_json::json!({ "chatId": "U1" })
        );
    }
}
