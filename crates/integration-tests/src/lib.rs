//! Integration tests for Lima Rose.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lima-rose-integration-tests
//! ```
//!
//! Each test starts its own admin API on an ephemeral port with a fresh
//! in-memory catalog, so tests never share state.
//!
//! # Test Categories
//!
//! - `admin_products` - Catalog CRUD over HTTP
//! - `admin_auth` - Login, cookies, token verification
//! - `storefront_client` - The storefront client against a live API

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use tokio::task::JoinHandle;
use url::Url;

use lima_rose_admin::services::auth::hash_password;
use lima_rose_admin::{AdminConfig, AppState, AuthConfig, ProductStore, app};
use lima_rose_core::Catalog;
use lima_rose_storefront::CatalogClient;

/// Password of the admin in every test server.
pub const ADMIN_PASSWORD: &str = "limarose2025";

/// Signing secret of every test server.
pub const TOKEN_SECRET: &str = "q8Zt3vN1xLw7RkP2mF9sJd4Hc6Yb0GaE";

/// An admin API running on `127.0.0.1` for the lifetime of the value.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server over the built-in catalog.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        Self::with_store(ProductStore::default()).await
    }

    /// Start a server over a given catalog.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn with_catalog(catalog: Catalog) -> Self {
        Self::with_store(ProductStore::new(catalog)).await
    }

    async fn with_store(store: ProductStore) -> Self {
        let password_hash = hash_password(ADMIN_PASSWORD).expect("Failed to hash password");
        let auth = AuthConfig::new(
            SecretString::from(password_hash),
            SecretString::from(TOKEN_SECRET),
        );
        let state = AppState::new(AdminConfig::new(auth), store);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app(state))
                .await
                .expect("Test server failed");
        });

        Self { addr, handle }
    }

    /// URL of a path on this server, e.g. `url("/api/products")`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A storefront client pointed at this server's `/api`.
    ///
    /// # Panics
    ///
    /// Panics if the server address does not form a URL.
    #[must_use]
    pub fn catalog_client(&self, cache_ttl: Duration) -> CatalogClient {
        let base = Url::parse(&self.url("/api")).expect("Invalid server URL");
        CatalogClient::with_base_url(base, cache_ttl)
    }

    /// Log in as the admin and return the token.
    ///
    /// # Panics
    ///
    /// Panics if the login fails.
    pub async fn login(&self, client: &reqwest::Client) -> String {
        let resp = client
            .post(self.url("/api/login"))
            .json(&serde_json::json!({"username": "admin", "password": ADMIN_PASSWORD}))
            .send()
            .await
            .expect("Login request failed");
        assert!(resp.status().is_success(), "login returned {}", resp.status());

        let body: serde_json::Value = resp.json().await.expect("Login body is not JSON");
        body["token"]
            .as_str()
            .expect("Login body has no token")
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
