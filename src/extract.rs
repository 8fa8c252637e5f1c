use serde::Deserialize;

use crate::error::Error;

/// Everything the webhook pipeline needs from one platform event.
#[derive(Debug)]
pub struct WebhookRequest {
    pub prompt: String,
    pub user_id: Option<String>,
    pub reply_token: String,
}

#[derive(Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Event {
    source: Option<Source>,
    message: Option<EventMessage>,
    reply_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Source {
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct EventMessage {
    text: Option<String>,
}

#[derive(Deserialize)]
struct DirectPayload {
    input_text: Option<String>,
}

/// Parses a webhook body into the first event's prompt, reply token and
/// (optional) user id. Only the first event is handled; the platform sends
/// one per message in practice.
pub fn webhook_request(body: &[u8]) -> Result<WebhookRequest, Error> {
    let payload = serde_json::from_slice::<WebhookPayload>(body)
        .map_err(|err| Error::MalformedRequest(format!("body is not a webhook payload: {err}")))?;

    let event = payload
        .events
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedRequest("events array is missing or empty".into()))?;

    let prompt = event
        .message
        .and_then(|message| message.text)
        .ok_or_else(|| Error::MalformedRequest("event has no message text".into()))?;

    let reply_token = event
        .reply_token
        .ok_or_else(|| Error::MalformedRequest("event has no reply token".into()))?;

    Ok(WebhookRequest {
        prompt,
        user_id: event.source.and_then(|source| source.user_id),
        reply_token,
    })
}

/// Parses a direct API body into its prompt.
pub fn direct_request(body: &[u8]) -> Result<String, Error> {
    serde_json::from_slice::<DirectPayload>(body)
        .map_err(|err| Error::MalformedRequest(format!("body is not valid JSON: {err}")))?
        .input_text
        .ok_or_else(|| Error::MalformedRequest("input_text was not specified".into()))
}

/// Digs the reply token out of a raw body without schema validation, so the
/// failure branch can still apologize when typed extraction is what failed.
pub fn salvage_reply_token(body: &[u8]) -> Option<String> {
    let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;
    value.get("events")?.get(0)?.get("replyToken")?.as_str().map(str::to_owned)
}
