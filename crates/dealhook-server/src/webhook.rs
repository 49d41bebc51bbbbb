//! Webhook URL parsing.

use url::Url;

use crate::error::{Result, ServerError};

/// Credential and secret extracted from a webhook URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub credential: String,
    pub secret: String,
}

/// Parse an absolute http(s) webhook URL.
///
/// The last two non-empty path segments are the credential and the secret:
/// `https://discord.com/api/webhooks/{credential}/{secret}`. Segments are
/// percent-decoded; delivery re-encodes them.
pub fn parse_webhook_url(raw: &str) -> Result<WebhookTarget> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ServerError::BadRequest(format!("Invalid webhook URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ServerError::BadRequest(format!(
            "Webhook URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [.., credential, secret] => Ok(WebhookTarget {
            credential: decode_segment(credential)?,
            secret: decode_segment(secret)?,
        }),
        _ => Err(ServerError::BadRequest(
            "Webhook URL must end with /{channel_id}/{token}".to_string(),
        )),
    }
}

fn decode_segment(segment: &str) -> Result<String> {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .map_err(|_| ServerError::BadRequest("Webhook URL path is not valid UTF-8".to_string()))
}
