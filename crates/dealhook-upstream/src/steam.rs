//! Steam Web API client.

use std::sync::Arc;

use serde::Deserialize;

use crate::client::{Endpoint, decode, error_for_status};
use crate::error::{Result, UpstreamError};

const WISHLIST_PATH: &str = "IWishlistService/GetWishlist/v1";
const PLAYER_SUMMARIES_PATH: &str = "ISteamUser/GetPlayerSummaries/v0002/";

/// `communityvisibilitystate` value for a public profile.
const VISIBILITY_PUBLIC: u8 = 3;

#[derive(Debug, Deserialize)]
struct WishlistEnvelope {
    response: Option<WishlistBody>,
}

#[derive(Debug, Deserialize)]
struct WishlistBody {
    items: Option<Vec<WishlistItem>>,
}

#[derive(Debug, Deserialize)]
struct WishlistItem {
    appid: u64,
}

#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
    response: SummariesBody,
}

#[derive(Debug, Deserialize)]
struct SummariesBody {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    communityvisibilitystate: u8,
}

#[derive(Clone)]
pub struct SteamClient {
    endpoint: Arc<Endpoint>,
    api_key: Option<String>,
}

impl SteamClient {
    pub(crate) fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new(http, base_url)?,
            api_key,
        })
    }

    /// Whether a Web API key is configured, enabling [`Self::is_profile_public`].
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// App ids on the user's wishlist, or `None` when the wishlist is not public.
    pub async fn wishlist(&self, steam_id: &str) -> Result<Option<Vec<u64>>> {
        let request = self
            .endpoint
            .http
            .get(self.endpoint.url(WISHLIST_PATH)?)
            .query(&[("steamid", steam_id)]);
        let response = error_for_status(self.endpoint.send(request).await?).await?;
        let envelope: WishlistEnvelope = decode(response).await?;

        let body = envelope
            .response
            .ok_or_else(|| UpstreamError::Malformed("wishlist response missing 'response'".to_string()))?;

        Ok(body
            .items
            .map(|items| items.into_iter().map(|item| item.appid).collect()))
    }

    /// Whether the profile is public. Without an API key every profile is
    /// treated as public and the wishlist call decides.
    ///
    /// A non-success status or an unknown SteamID counts as not public.
    pub async fn is_profile_public(&self, steam_id: &str) -> Result<bool> {
        let Some(key) = &self.api_key else {
            return Ok(true);
        };

        let request = self
            .endpoint
            .http
            .get(self.endpoint.url(PLAYER_SUMMARIES_PATH)?)
            .query(&[("key", key.as_str()), ("steamids", steam_id)]);
        let response = self.endpoint.send(request).await?;
        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "Player summary lookup failed");
            return Ok(false);
        }

        let envelope: SummariesEnvelope = decode(response).await?;
        Ok(envelope
            .response
            .players
            .first()
            .is_some_and(|p| p.communityvisibilitystate == VISIBILITY_PUBLIC))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STEAM_ID: &str = "76561197960287930";

    fn client(server: &MockServer, key: Option<&str>) -> SteamClient {
        SteamClient::new(reqwest::Client::new(), &server.uri(), key.map(String::from)).unwrap()
    }

    #[tokio::test]
    async fn test_wishlist_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/IWishlistService/GetWishlist/v1"))
            .and(query_param("steamid", STEAM_ID))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"items": [{"appid": 10, "priority": 1}, {"appid": 20, "priority": 2}]}
            })))
            .mount(&server)
            .await;

        let items = client(&server, None).wishlist(STEAM_ID).await.unwrap();
        assert_eq!(items, Some(vec![10, 20]));
    }

    #[tokio::test]
    async fn test_wishlist_without_items_is_private() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": {}})))
            .mount(&server)
            .await;

        assert_eq!(client(&server, None).wishlist(STEAM_ID).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wishlist_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server, None).wishlist(STEAM_ID).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_profile_visibility() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ISteamUser/GetPlayerSummaries/v0002/"))
            .and(query_param("steamids", STEAM_ID))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"players": [{"steamid": STEAM_ID, "communityvisibilitystate": 1}]}
            })))
            .mount(&server)
            .await;

        assert!(!client(&server, Some("k")).is_profile_public(STEAM_ID).await.unwrap());
    }

    #[tokio::test]
    async fn test_profile_visibility_without_key_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        assert!(client(&server, None).is_profile_public(STEAM_ID).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_player_is_not_public() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": {"players": []}})))
            .mount(&server)
            .await;

        assert!(!client(&server, Some("k")).is_profile_public(STEAM_ID).await.unwrap());
    }
}
