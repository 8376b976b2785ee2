//! REST client for the configurator backend
//!
//! One method per endpoint. Authenticated calls attach a bearer token and
//! fail with [`ApiError::AuthRequired`] before any I/O when none is held.
//! Each call fails on its own; nothing is retried here.

mod error;
mod session;
mod wire;

pub use error::ApiError;
pub use session::{
    validate_email, validate_password, validate_registration, Metadata, Session, TokenStore,
};
pub use wire::{AuthToken, Profile, SubscriptionStatus};

use crate::catalog::{
    Category, Component, ComponentRef, MinPrice, Narrowing, Notification, Offer, SavedBuild,
    UseCaseBuild, UseCaseInfo,
};
use crate::config::Config;
use crate::workflow::{CompatibilityRequest, ComponentQuery};
use futures::stream::{self, StreamExt};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use wire::{
    list_or_empty, BrandsEnvelope, BuildRequest, LoginRequest, RegisterRequest,
    SubscribeRequest, TokenEnvelope, UnreadCount, UseCaseEnvelope,
};

/// Backend limit on ids per `/subscriptions/status` call
const STATUS_BATCH: usize = 200;

/// Whether a call carries the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("uconf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_url, Duration::from_secs(config.request_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, builder: RequestBuilder, auth: Auth) -> Result<RequestBuilder, ApiError> {
        match auth {
            Auth::None => Ok(builder),
            Auth::Bearer => {
                let token = self.token.as_deref().ok_or(ApiError::AuthRequired)?;
                Ok(builder.bearer_auth(token))
            }
        }
    }

    /// Send and check status, returning the raw body of a success response
    async fn send_raw(&self, builder: RequestBuilder, auth: Auth) -> Result<String, ApiError> {
        let response = self.prepare(builder, auth)?.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::UNAUTHORIZED && auth == Auth::Bearer {
            tracing::info!("Backend rejected token (401)");
            return Err(ApiError::SessionExpired);
        }

        let message = error::extract_error_message(&body);
        tracing::debug!(status = %status, message = %message, "Backend returned error status");
        Err(ApiError::Status { status, message })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let body = self.send_raw(builder, auth).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    /// `GET /config/components`: every component in a category
    pub async fn components(
        &self,
        category: Category,
        narrowing: &Narrowing,
    ) -> Result<Vec<Component>, ApiError> {
        let mut query: Vec<(&str, String)> = vec![("category", category.as_str().to_string())];
        if let Some(usecase) = narrowing.usecase {
            query.push(("usecase", usecase.as_str().to_string()));
        }
        if let Some(brand) = &narrowing.brand {
            query.push(("brand", brand.clone()));
        }
        let builder = self.http.get(self.url("/config/components")).query(&query);
        let list: Option<Vec<Component>> = self.send_json(builder, Auth::None).await?;
        Ok(list_or_empty(list))
    }

    /// `POST /config/compatible`: components compatible with the given bases
    pub async fn compatible(
        &self,
        request: &CompatibilityRequest,
    ) -> Result<Vec<Component>, ApiError> {
        let builder = self.http.post(self.url("/config/compatible")).json(request);
        let list: Option<Vec<Component>> = self.send_json(builder, Auth::None).await?;
        Ok(list_or_empty(list))
    }

    pub async fn fetch(&self, query: &ComponentQuery) -> Result<Vec<Component>, ApiError> {
        match query {
            ComponentQuery::Compatible(request) => self.compatible(request).await,
            ComponentQuery::All {
                category,
                narrowing,
            } => self.components(*category, narrowing).await,
        }
    }

    pub async fn brands(&self, category: Category) -> Result<Vec<String>, ApiError> {
        let builder = self
            .http
            .get(self.url("/config/brands"))
            .query(&[("category", category.as_str())]);
        let envelope: BrandsEnvelope = self.send_json(builder, Auth::None).await?;
        Ok(envelope.brands)
    }

    pub async fn usecases(&self) -> Result<Vec<UseCaseInfo>, ApiError> {
        let builder = self.http.get(self.url("/config/usecases"));
        let list: Option<Vec<UseCaseInfo>> = self.send_json(builder, Auth::None).await?;
        Ok(list.unwrap_or_default())
    }

    /// `GET /config/usecase/{tag}`: curated builds for a use case
    pub async fn usecase_builds(&self, tag: &str) -> Result<Vec<UseCaseBuild>, ApiError> {
        let builder = self.http.get(self.url(&format!("/config/usecase/{tag}")));
        let envelope: UseCaseEnvelope = self.send_json(builder, Auth::None).await?;
        Ok(envelope.components)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pricing
    // ─────────────────────────────────────────────────────────────────────────

    /// Lowest observed offer price; `None` when the component has no offers
    pub async fn min_price(&self, component_id: &str) -> Result<Option<f64>, ApiError> {
        let builder = self
            .http
            .get(self.url("/offers/min"))
            .query(&[("componentId", component_id)]);
        let min: MinPrice = self.send_json(builder, Auth::None).await?;
        Ok(min.min_price)
    }

    /// Per-card price lookups, `concurrency` at a time.
    ///
    /// Each lookup fails on its own: a failure yields `None` for that id
    /// and never affects the others.
    pub async fn min_prices(
        &self,
        ids: Vec<String>,
        concurrency: usize,
    ) -> HashMap<String, Option<f64>> {
        stream::iter(ids)
            .map(|id| async move {
                let price = match self.min_price(&id).await {
                    Ok(price) => price,
                    Err(e) => {
                        tracing::debug!(component = %id, error = %e, "Price unavailable");
                        None
                    }
                };
                (id, price)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }

    /// `GET /offers`: shop listings, cheapest first. Requires login.
    pub async fn offers(&self, component_id: &str) -> Result<Vec<Offer>, ApiError> {
        let builder = self
            .http
            .get(self.url("/offers"))
            .query(&[("componentId", component_id), ("sort", "priceAsc")]);
        let list: Option<Vec<Offer>> = self.send_json(builder, Auth::Bearer).await?;
        Ok(list.unwrap_or_default())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions & notifications
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn subscribe(&self, component_id: &str) -> Result<(), ApiError> {
        let builder = self
            .http
            .post(self.url("/subscriptions"))
            .json(&SubscribeRequest { component_id });
        self.send_raw(builder, Auth::Bearer).await.map(|_| ())
    }

    pub async fn unsubscribe(&self, component_id: &str) -> Result<(), ApiError> {
        let builder = self
            .http
            .delete(self.url(&format!("/subscriptions/{component_id}")));
        self.send_raw(builder, Auth::Bearer).await.map(|_| ())
    }

    /// Subscription flags for many components, batched to the backend limit
    pub async fn subscription_status(&self, ids: &[String]) -> Result<SubscriptionStatus, ApiError> {
        let mut merged = SubscriptionStatus::new();
        for chunk in ids.chunks(STATUS_BATCH) {
            let builder = self
                .http
                .get(self.url("/subscriptions/status"))
                .query(&[("ids", chunk.join(","))]);
            let part: SubscriptionStatus = self.send_json(builder, Auth::Bearer).await?;
            merged.extend(part);
        }
        Ok(merged)
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let builder = self.http.get(self.url("/notifications"));
        let list: Option<Vec<Notification>> = self.send_json(builder, Auth::Bearer).await?;
        Ok(list.unwrap_or_default())
    }

    pub async fn unread_count(&self) -> Result<u64, ApiError> {
        let builder = self.http.get(self.url("/notifications/count"));
        let count: UnreadCount = self.send_json(builder, Auth::Bearer).await?;
        Ok(count.unread)
    }

    pub async fn mark_read(&self, notification_id: &str) -> Result<(), ApiError> {
        let builder = self
            .http
            .post(self.url(&format!("/notifications/{notification_id}/read")));
        self.send_raw(builder, Auth::Bearer).await.map(|_| ())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken, ApiError> {
        let builder = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password });
        let envelope: TokenEnvelope = self.send_json(builder, Auth::None).await?;
        Ok(AuthToken {
            email: Some(email.to_string()),
            ..envelope.token
        })
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthToken, ApiError> {
        let builder = self.http.post(self.url("/auth/register")).json(&RegisterRequest {
            email,
            password,
            name,
        });
        let envelope: TokenEnvelope = self.send_json(builder, Auth::None).await?;
        Ok(AuthToken {
            email: Some(email.to_string()),
            ..envelope.token
        })
    }

    pub async fn me(&self) -> Result<Profile, ApiError> {
        let builder = self.http.get(self.url("/auth/me"));
        self.send_json(builder, Auth::Bearer).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saved builds
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn save_build(
        &self,
        name: &str,
        components: &[ComponentRef],
    ) -> Result<SavedBuild, ApiError> {
        let builder = self
            .http
            .post(self.url("/config/newconfig"))
            .json(&BuildRequest { name, components });
        self.send_json(builder, Auth::Bearer).await
    }

    pub async fn update_build(
        &self,
        id: &str,
        name: &str,
        components: &[ComponentRef],
    ) -> Result<SavedBuild, ApiError> {
        let builder = self
            .http
            .put(self.url(&format!("/config/newconfig/{id}")))
            .json(&BuildRequest { name, components });
        self.send_json(builder, Auth::Bearer).await
    }

    pub async fn user_builds(&self) -> Result<Vec<SavedBuild>, ApiError> {
        let builder = self.http.get(self.url("/config/userconf"));
        let list: Option<Vec<SavedBuild>> = self.send_json(builder, Auth::Bearer).await?;
        Ok(list.unwrap_or_default())
    }

    pub async fn delete_build(&self, id: &str) -> Result<(), ApiError> {
        let builder = self
            .http
            .delete(self.url(&format!("/config/newconfig/{id}")));
        self.send_raw(builder, Auth::Bearer).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UseCase;

    const CPU_LIST: &str = r#"[
        {"id":"cpu-1","name":"AMD Ryzen 9 7950X","category":"cpu","brand":"AMD","specs":{"socket":"AM5"}},
        {"id":"cpu-2","name":"Intel Core i9-13900K","category":"cpu","brand":"Intel","specs":{"socket":"LGA1700"}}
    ]"#;

    fn client(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(&server.url(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn components_passes_narrowing_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/config/components")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("category".into(), "cpu".into()),
                mockito::Matcher::UrlEncoded("usecase".into(), "gaming".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CPU_LIST)
            .create_async()
            .await;

        let narrowing = Narrowing {
            usecase: Some(UseCase::Gaming),
            brand: None,
        };
        let list = client(&server)
            .components(Category::Cpu, &narrowing)
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].spec("socket"), Some("AM5"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn null_list_decodes_as_empty() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/config/compatible")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let request = CompatibilityRequest {
            category: Category::Motherboard,
            bases: vec![],
            usecase: None,
            brand: None,
        };
        let list = client(&server).compatible(&request).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn authenticated_call_without_token_never_hits_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/notifications/count")
            .expect(0)
            .create_async()
            .await;

        let err = client(&server).unread_count().await.unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_with_token_means_session_expired() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/offers")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body(r#"{"error":"token expired"}"#)
            .create_async()
            .await;

        let api = client(&server).with_token(Some("stale".into()));
        let err = api.offers("cpu-1").await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn login_failure_keeps_backend_message() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"error":"invalid credentials"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .login("a@b.io", "password1")
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "invalid credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/config/brands")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server).brands(Category::Gpu).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/offers/min")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = client(&server).min_price("cpu-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[tokio::test]
    async fn min_prices_fail_independently() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/offers/min")
            .match_query(mockito::Matcher::UrlEncoded(
                "componentId".into(),
                "cpu-1".into(),
            ))
            .with_status(200)
            .with_body(r#"{"minPrice": 549.0}"#)
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/offers/min")
            .match_query(mockito::Matcher::UrlEncoded(
                "componentId".into(),
                "cpu-2".into(),
            ))
            .with_status(500)
            .create_async()
            .await;

        let prices = client(&server)
            .min_prices(vec!["cpu-1".into(), "cpu-2".into()], 4)
            .await;
        assert_eq!(prices.get("cpu-1"), Some(&Some(549.0)));
        assert_eq!(prices.get("cpu-2"), Some(&None));
    }

    #[tokio::test]
    async fn login_decodes_token_envelope() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(
                r#"{"token":{"access_token":"abc","expires_at":"2030-01-01T00:00:00Z",
                    "refresh_token":"r","refresh_expires_at":"2030-02-01T00:00:00Z"}}"#,
            )
            .create_async()
            .await;

        let token = client(&server)
            .login("user@example.com", "password1")
            .await
            .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.email.as_deref(), Some("user@example.com"));
        assert!(!token.is_expired(chrono::Utc::now()));
    }
}
