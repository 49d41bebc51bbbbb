//! Discord webhook delivery.

use std::sync::Arc;

use url::Url;

use crate::client::{Endpoint, error_for_status};
use crate::error::Result;

#[derive(Clone)]
pub struct DiscordClient {
    endpoint: Arc<Endpoint>,
}

impl DiscordClient {
    pub(crate) fn new(http: reqwest::Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(http, base_url)?,
        })
    }

    /// `{base}/api/webhooks/{credential}/{secret}`.
    pub fn webhook_url(&self, credential: &str, secret: &str) -> Result<Url> {
        let mut url = self.endpoint.url("api/webhooks/")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(credential)
            .push(secret);
        Ok(url)
    }

    /// POST a JSON payload to a webhook. Returns the upstream status on success.
    pub async fn deliver(&self, credential: &str, secret: &str, payload: &serde_json::Value) -> Result<u16> {
        let request = self
            .endpoint
            .http
            .post(self.webhook_url(credential, secret)?)
            .json(payload);
        let response = error_for_status(self.endpoint.send(request).await?).await?;
        Ok(response.status().as_u16())
    }
}
