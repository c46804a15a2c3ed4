//! Login, cookie and token verification against a live admin API.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode, header};
use serde_json::{Value, json};

use lima_rose_integration_tests::{ADMIN_PASSWORD, TestServer};

#[tokio::test]
async fn test_login_cookie_authenticates_follow_up_requests() {
    let server = TestServer::start().await;
    let client = Client::builder().cookie_store(true).build().unwrap();

    let resp = client
        .post(server.url("/api/login"))
        .json(&json!({"username": "admin", "password": ADMIN_PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=86400"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");

    // No bearer header: the cookie alone must do
    let resp = client.get(server.url("/api/verify")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(server.url("/api/products"))
        .json(&json!({"name": "Clavel", "price": 12}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client.post(server.url("/api/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get(server.url("/api/verify")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_sets_no_cookie() {
    let server = TestServer::start().await;
    let client = Client::new();

    for body in [
        json!({"username": "admin", "password": "wrong"}),
        json!({"username": "someone", "password": ADMIN_PASSWORD}),
    ] {
        let resp = client
            .post(server.url("/login"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_verify_rejects_missing_and_forged_tokens() {
    let server = TestServer::start().await;
    let client = Client::new();
    let token = server.login(&client).await;

    let resp = client.get(server.url("/verify")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "No token provided");

    // Flip one character of the signature
    let mut forged = token.clone();
    let last = forged.pop().unwrap();
    forged.push(if last == 'A' { 'B' } else { 'A' });

    let resp = client
        .get(server.url("/verify"))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(server.url("/verify"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["userId"], 1);
}

#[tokio::test]
async fn test_upload_requires_auth() {
    let server = TestServer::start().await;
    let client = Client::new();

    let resp = client
        .post(server.url("/api/upload"))
        .json(&json!({"imageData": "aGVsbG8="}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = server.login(&client).await;
    let resp = client
        .post(server.url("/api/upload"))
        .bearer_auth(&token)
        .json(&json!({"imageData": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "No image data provided");
}
