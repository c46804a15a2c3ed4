//! Catalog CRUD over HTTP against a live admin API.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use lima_rose_integration_tests::TestServer;

async fn stats(server: &TestServer, client: &Client) -> Value {
    client
        .get(server.url("/api/stats"))
        .send()
        .await
        .expect("Stats request failed")
        .json()
        .await
        .expect("Stats body is not JSON")
}

#[tokio::test]
async fn test_products_served_at_root_and_under_api() {
    let server = TestServer::start().await;
    let client = Client::new();

    for path in ["/products", "/api/products"] {
        let resp = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["products"][0]["name"], "Ramo Emma");
        for section in ["ofertas", "vendidos", "especiales"] {
            assert!(body[section].is_array(), "missing section {section}");
        }
    }
}

#[tokio::test]
async fn test_create_update_delete_round() {
    let server = TestServer::start().await;
    let client = Client::new();
    let token = server.login(&client).await;
    let before = stats(&server, &client).await;

    let resp = client
        .post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Orquídea Blanca",
            "category": "plantas",
            "price": 150,
            "image": "https://images.example/orquidea.jpg",
            "featured": true,
            "filter": "especiales"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    let id = created["product"]["id"].as_i64().unwrap();
    assert!(created["product"]["created_at"].is_string());

    let resp = client
        .put(server.url(&format!("/api/products/{id}")))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Orquídea Blanca Premium",
            "image": "",
            "price": "",
            "filter": "ofertas"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["product"]["name"], "Orquídea Blanca Premium");
    assert_eq!(updated["product"]["image"], "https://images.example/orquidea.jpg");
    assert_eq!(updated["product"]["price"], 150.0);
    assert!(updated["product"]["updated_at"].is_string());

    let shown: Value = client
        .get(server.url(&format!("/api/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(shown["section"], "ofertas");

    let resp = client
        .delete(server.url(&format!("/api/products?id={id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Value = resp.json().await.unwrap();
    assert_eq!(deleted["deletedId"], id);

    assert_eq!(stats(&server, &client).await, before);
}

#[tokio::test]
async fn test_ids_are_never_reused() {
    let server = TestServer::start().await;
    let client = Client::new();
    let token = server.login(&client).await;

    let mut ids = Vec::new();
    for name in ["Rosa", "Tulipán"] {
        let body: Value = client
            .post(server.url("/products"))
            .bearer_auth(&token)
            .json(&json!({"name": name, "price": 30}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        ids.push(body["product"]["id"].as_i64().unwrap());
    }
    let last = *ids.last().unwrap();

    client
        .delete(server.url(&format!("/products/{last}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let body: Value = client
        .post(server.url("/products"))
        .bearer_auth(&token)
        .json(&json!({"name": "Lirio", "price": 30}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["product"]["id"].as_i64().unwrap() > last);
}

#[tokio::test]
async fn test_error_statuses() {
    let server = TestServer::start().await;
    let client = Client::new();
    let token = server.login(&client).await;

    let resp = client
        .put(server.url("/api/products?id=999"))
        .bearer_auth(&token)
        .json(&json!({"name": "Nada"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .delete(server.url("/api/products"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({"price": 10}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .patch(server.url("/api/products"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let resp = client.get(server.url("/api/orders")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Not found");
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let server = TestServer::start().await;
    let client = Client::new();
    let token = server.login(&client).await;

    let mut tasks = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        let token = token.clone();
        let url = server.url("/api/products");
        tasks.push(tokio::spawn(async move {
            let body: Value = client
                .post(url)
                .bearer_auth(token)
                .json(&json!({"name": format!("Ramo {i}"), "price": 50}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            body["product"]["id"].as_i64().unwrap()
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 10);
    assert_eq!(stats(&server, &client).await["totalProducts"], 13);
}
