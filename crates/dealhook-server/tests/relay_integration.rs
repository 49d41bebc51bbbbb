//! Adapter registration and event relay over a live server.

mod common;

use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_register_rejects_missing_and_bad_urls() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .client
        .post(server.url("/api/adapter"))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    let resp = server
        .client
        .post(server.url("/api/adapter"))
        .json(&json!({"url": "not a url"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "bad_request");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_webhook_conflicts() -> Result<()> {
    let server = common::TestServer::start().await?;
    server.register_channel("111", "same-secret").await?;

    let resp = server
        .client
        .post(server.url("/api/adapter"))
        .json(&json!({"url": "https://discord.com/api/webhooks/222/same-secret"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 409);

    Ok(())
}

#[tokio::test]
async fn test_update_repoints_channel() -> Result<()> {
    let server = common::TestServer::start().await?;
    let id = server.register_channel("111", "old").await?;

    let resp = server
        .client
        .patch(server.url(&format!("/api/adapter/{}", id)))
        .json(&json!({"url": "https://discord.com/api/webhooks/333/new"}))
        .send()
        .await?;
    assert!(resp.status().is_success());
    let body: Value = resp.json().await?;
    assert_eq!(body["document"]["identifier"], id);
    assert_eq!(body["document"]["channel_credential"], "333");
    assert_eq!(body["document"]["channel_secret"], "new");

    Ok(())
}

#[tokio::test]
async fn test_relay_delivers_payload() -> Result<()> {
    let server = common::TestServer::start().await?;
    let id = server.register_channel("123", "tok").await?;
    let payload = json!({"content": "Deal alert"});

    Mock::given(method("POST"))
        .and(path("/api/webhooks/123/tok"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let resp = server
        .client
        .post(server.url(&format!("/api/event/{}", id)))
        .json(&payload)
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], 200);
    assert_eq!(body["body"], payload);
    assert!(body["url"].as_str().unwrap_or_default().ends_with("/api/webhooks/123/tok"));

    // Delivery is detached; give it a moment before the mock verifies on drop.
    tokio::time::sleep(Duration::from_millis(300)).await;

    Ok(())
}

#[tokio::test]
async fn test_relay_preserves_encoded_webhook_path() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .client
        .post(server.url("/api/adapter"))
        .json(&json!({"url": "https://discord.com/api/webhooks/1/a%20b"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["document"]["channel_secret"], "a b");
    let id = body["document"]["identifier"].as_str().unwrap_or_default().to_string();

    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/a%20b"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server.upstream)
        .await;

    let resp = server
        .client
        .post(server.url(&format!("/api/event/{}", id)))
        .json(&json!({"content": "x"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await?;
    assert!(body["url"].as_str().unwrap_or_default().ends_with("/api/webhooks/1/a%20b"));

    tokio::time::sleep(Duration::from_millis(300)).await;

    Ok(())
}

#[tokio::test]
async fn test_relay_succeeds_when_delivery_fails() -> Result<()> {
    let server = common::TestServer::start().await?;
    let id = server.register_channel("123", "tok").await?;

    Mock::given(method("POST"))
        .and(path("/api/webhooks/123/tok"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server.upstream)
        .await;

    let resp = server
        .client
        .post(server.url(&format!("/api/event/{}", id)))
        .json(&json!({"content": "x"}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 200);

    Ok(())
}

#[tokio::test]
async fn test_relay_error_ordering() -> Result<()> {
    let server = common::TestServer::start().await?;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server.upstream)
        .await;

    // Malformed identifier wins over an empty body.
    let resp = server
        .client
        .post(server.url("/api/event/nope"))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    // Unknown identifier wins over an empty body.
    let resp = server
        .client
        .post(server.url(&format!("/api/event/{}", uuid::Uuid::new_v4())))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 404);

    let id = server.register_channel("123", "tok").await?;
    for empty in ["", "{}", "[]", "null"] {
        let resp = server
            .client
            .post(server.url(&format!("/api/event/{}", id)))
            .header("content-type", "application/json")
            .body(empty)
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 400, "body {:?}", empty);
    }

    Ok(())
}
