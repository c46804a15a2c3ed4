//! The storefront client against a live admin API.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;

use lima_rose_core::{Catalog, ProductId, Section};
use lima_rose_integration_tests::TestServer;
use lima_rose_storefront::{
    CartManager, DEFAULT_RELATED_LIMIT, MemoryStorage, Namespaced, Occasion, PriceRange,
    StorefrontError,
};

#[tokio::test]
async fn test_client_reads_catalog_and_stats() {
    let server = TestServer::start().await;
    let client = server.catalog_client(Duration::from_secs(60));

    let catalog = client.catalog().await.unwrap();
    assert_eq!(catalog.len(), 3);

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total_products, 3);
    assert_eq!(stats.total_categories, 1);

    let (section, product) = client.product(ProductId::new(1)).await.unwrap();
    assert_eq!(section, Section::Products);
    assert_eq!(product.name, "Ramo Emma");

    assert!(matches!(
        client.product(ProductId::new(999)).await,
        Err(StorefrontError::ProductNotFound(_))
    ));
    assert_eq!(client.search("emma").await.unwrap().len(), 1);
    assert!(client.section(Section::Ofertas).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_client_shop_filters() {
    let server = TestServer::start().await;
    let client = server.catalog_client(Duration::from_secs(60));

    let mid = client.by_price_range(PriceRange::From200To300).await.unwrap();
    let mut names: Vec<_> = mid.iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["Corona Funeral", "Ramo Emma"]);

    let amor = client.by_occasion(Occasion::Amor).await.unwrap();
    assert_eq!(amor.len(), 1);
    assert_eq!(amor.first().unwrap().name, "Ramo Emma");

    let related = client
        .related(ProductId::new(1), DEFAULT_RELATED_LIMIT)
        .await
        .unwrap();
    assert_eq!(related.len(), 2);
    assert!(related.iter().all(|p| p.id != ProductId::new(1)));

    assert!(matches!(
        client.related(ProductId::new(999), DEFAULT_RELATED_LIMIT).await,
        Err(StorefrontError::ProductNotFound(_))
    ));
}

#[tokio::test]
async fn test_cache_serves_until_invalidated() {
    let server = TestServer::start().await;
    let client = server.catalog_client(Duration::from_secs(300));
    assert_eq!(client.catalog().await.unwrap().len(), 3);

    let http = Client::new();
    let token = server.login(&http).await;
    http.post(server.url("/api/products"))
        .bearer_auth(&token)
        .json(&json!({"name": "Gerberas", "price": 45}))
        .send()
        .await
        .unwrap();

    assert_eq!(client.catalog().await.unwrap().len(), 3);
    client.invalidate().await;
    assert_eq!(client.catalog().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_seeded_catalog_feeds_the_cart() {
    let catalog = Catalog::from_json_str(
        r#"{"ofertas": [{"id": 10, "name": "Girasoles", "price": 80, "featured": true}]}"#,
    )
    .unwrap();
    let server = TestServer::with_catalog(catalog).await;
    let client = server.catalog_client(Duration::from_secs(60));

    let featured = client.featured().await.unwrap();
    let girasoles = featured.first().unwrap();

    let mut cart = CartManager::open(Namespaced::new(MemoryStorage::new(), "limarose_")).unwrap();
    cart.add(girasoles, 2).unwrap();
    cart.add(girasoles, 1).unwrap();
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.subtotal(), Decimal::from(240));
}

#[tokio::test]
async fn test_api_errors_surface_status_and_message() {
    let server = TestServer::start().await;
    let base = url::Url::parse(&server.url("/nope")).unwrap();
    let client = lima_rose_storefront::CatalogClient::with_base_url(base, Duration::from_secs(1));

    match client.catalog().await {
        Err(StorefrontError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not found");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
