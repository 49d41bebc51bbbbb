//! Price tracker (IsThereAnyDeal) API client.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{Endpoint, UpstreamResponse, decode, error_for_status, passthrough};
use crate::error::Result;

const WAITLIST_PATH: &str = "waitlist/games/v1";
const USER_INFO_PATH: &str = "user/info/v2";
const PROFILE_LINK_PATH: &str = "profiles/link/v1";
/// Shop 61 is Steam in the price tracker's shop catalogue.
const STEAM_LOOKUP_PATH: &str = "lookup/id/shop/61/v1";

/// Outcome of translating Steam app ids into price tracker game ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    /// Game ids for the app ids that matched.
    pub ids: Vec<String>,
    /// Number of app ids with no matching game.
    pub unmatched: usize,
}

/// Client for the authorized price tracker endpoints.
#[derive(Clone)]
pub struct ItadClient {
    endpoint: Arc<Endpoint>,
    api_key: Option<String>,
}

impl ItadClient {
    pub(crate) fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(http, base_url)?,
            api_key,
        })
    }

    /// GET the user's waitlist.
    pub async fn waitlist(&self, token: &str) -> Result<UpstreamResponse> {
        let request = self
            .endpoint
            .http
            .get(self.endpoint.url(WAITLIST_PATH)?)
            .bearer_auth(token);
        let response = self.endpoint.send(request).await?;
        passthrough(response).await
    }

    /// PUT game ids onto the waitlist. Returns the upstream status.
    pub async fn add_to_waitlist(&self, token: &str, ids: &[String]) -> Result<u16> {
        let request = self
            .endpoint
            .http
            .put(self.endpoint.url(WAITLIST_PATH)?)
            .bearer_auth(token)
            .json(ids);
        let response = self.endpoint.send(request).await?;
        Ok(response.status().as_u16())
    }

    /// DELETE game ids from the waitlist. Returns the upstream status.
    pub async fn remove_from_waitlist(&self, token: &str, ids: &[String]) -> Result<u16> {
        let request = self
            .endpoint
            .http
            .delete(self.endpoint.url(WAITLIST_PATH)?)
            .bearer_auth(token)
            .json(ids);
        let response = self.endpoint.send(request).await?;
        Ok(response.status().as_u16())
    }

    /// GET the authorized user's profile.
    pub async fn user_info(&self, token: &str) -> Result<UpstreamResponse> {
        let request = self
            .endpoint
            .http
            .get(self.endpoint.url(USER_INFO_PATH)?)
            .bearer_auth(token);
        let response = self.endpoint.send(request).await?;
        passthrough(response).await
    }

    /// PUT a profile link for an external account onto the user's profile.
    pub async fn link_profile(
        &self,
        token: &str,
        account_id: &str,
        account_name: &str,
    ) -> Result<UpstreamResponse> {
        let body = serde_json::json!({
            "accountId": account_id,
            "accountName": account_name,
        });
        let request = self
            .endpoint
            .http
            .put(self.endpoint.url(PROFILE_LINK_PATH)?)
            .bearer_auth(token)
            .json(&body);
        let response = self.endpoint.send(request).await?;
        passthrough(response).await
    }

    /// Translate Steam app ids into game ids, dropping the ones with no match.
    pub async fn lookup_steam_apps(&self, app_ids: &[u64]) -> Result<LookupResult> {
        if app_ids.is_empty() {
            return Ok(LookupResult::default());
        }

        let keys: Vec<String> = app_ids.iter().map(|id| format!("app/{id}")).collect();
        let mut request = self.endpoint.http.post(self.endpoint.url(STEAM_LOOKUP_PATH)?);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = error_for_status(self.endpoint.send(request.json(&keys)).await?).await?;
        let mapping: HashMap<String, Option<String>> = decode(response).await?;

        let mut result = LookupResult::default();
        for key in &keys {
            match mapping.get(key) {
                Some(Some(id)) => result.ids.push(id.clone()),
                _ => result.unmatched += 1,
            }
        }

        tracing::debug!(
            requested = keys.len(),
            matched = result.ids.len(),
            "Looked up Steam app ids"
        );
        Ok(result)
    }
}
