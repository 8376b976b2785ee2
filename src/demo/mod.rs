//! Demo backend: the configurator REST API served from memory
//!
//! Seeded catalog, simplified compatibility rules, bearer tokens issued at
//! login, and in-memory subscriptions, notifications and saved builds.
//! Enough for the TUI, the CLI and the load generator to run offline.
//!
//! Run with: uconf demo-server --bind 127.0.0.1:8080

mod catalog;
mod handlers;
mod rules;

pub use catalog::{DEMO_EMAIL, DEMO_PASSWORD};

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post},
    Router,
};
use handlers::{DemoData, DemoState};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Build the router over a fresh seeded state
pub fn router() -> Router {
    let state: DemoState = Arc::new(Mutex::new(DemoData::seeded()));

    Router::new()
        // Catalog
        .route("/config/components", get(handlers::get_components))
        .route("/config/compatible", post(handlers::post_compatible))
        .route("/config/brands", get(handlers::get_brands))
        .route("/config/usecases", get(handlers::get_usecases))
        .route("/config/usecase/:name", get(handlers::get_usecase_build))
        // Saved builds
        .route("/config/newconfig", post(handlers::post_build))
        .route(
            "/config/newconfig/:id",
            axum::routing::put(handlers::put_build).delete(handlers::delete_build),
        )
        .route("/config/userconf", get(handlers::get_user_builds))
        // Pricing
        .route("/offers", get(handlers::get_offers))
        .route("/offers/min", get(handlers::get_min_price))
        // Alerts
        .route("/subscriptions", post(handlers::post_subscription))
        .route(
            "/subscriptions/status",
            get(handlers::get_subscription_status),
        )
        .route(
            "/subscriptions/:component_id",
            delete(handlers::delete_subscription),
        )
        .route("/notifications", get(handlers::get_notifications))
        .route("/notifications/count", get(handlers::get_unread_count))
        .route("/notifications/:id/read", post(handlers::post_mark_read))
        // Auth
        .route("/auth/login", post(handlers::post_login))
        .route("/auth/register", post(handlers::post_register))
        .route("/auth/me", get(handlers::get_me))
        .with_state(state)
}

/// Serve until `shutdown_rx` fires
pub async fn serve(bind_addr: SocketAddr, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;
    let local = listener.local_addr()?;
    tracing::info!("Demo backend listening on http://{}", local);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Demo backend shut down gracefully");
    Ok(())
}

/// A demo backend running on a background task
pub struct DemoServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<()>>>,
}

impl DemoServer {
    /// Bind (port 0 picks a free port) and start serving
    pub async fn start(bind_addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .context("Failed to bind to address")?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, router())
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await
                .context("Server error")
        });

        tracing::debug!("Demo backend started on {}", addr);
        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for the server task
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Demo backend error: {:#}", e),
                Err(e) => tracing::warn!("Demo backend task failed: {}", e),
            }
        }
    }
}

impl Drop for DemoServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, ApiError};
    use crate::catalog::{Category, Narrowing, Selection};
    use crate::workflow::{build_compatibility_request, ListMode, Workflow};
    use std::time::Duration;

    async fn start() -> (DemoServer, ApiClient) {
        let server = DemoServer::start("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let client = ApiClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn compatible_motherboards_for_selected_cpu() {
        let (server, client) = start().await;

        let cpus = client
            .components(Category::Cpu, &Narrowing::default())
            .await
            .unwrap();
        let ryzen = cpus
            .into_iter()
            .find(|c| c.name == "AMD Ryzen 9 7950X")
            .unwrap();

        let mut selection = Selection::new();
        selection.select(ryzen);
        let request =
            build_compatibility_request(Category::Motherboard, &selection, &Narrowing::default());
        let boards = client.compatible(&request).await.unwrap();

        assert!(!boards.is_empty());
        assert!(boards.iter().all(|b| b.spec("socket") == Some("AM5")));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn workflow_refresh_against_backend() {
        let (server, client) = start().await;
        let mut wf = Workflow::new();

        assert!(wf.refresh(&client).await);
        let cpus = wf.visible();
        assert!(cpus.len() >= 2);

        let intel = cpus
            .iter()
            .find(|c| c.brand == "Intel")
            .cloned()
            .unwrap();
        wf.select(intel);
        wf.set_category(Category::Ram);
        assert!(wf.needs_fetch());
        assert!(wf.refresh(&client).await);
        // No motherboard picked, so every stick qualifies
        assert_eq!(wf.visible().len(), 3);

        wf.set_mode(ListMode::All);
        assert!(wf.refresh(&client).await);
        assert_eq!(wf.visible().len(), 3);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn login_then_authenticated_calls() {
        let (server, mut client) = start().await;

        let token = client.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        client.set_token(Some(token.access_token));

        assert_eq!(client.me().await.unwrap().email, DEMO_EMAIL);
        assert_eq!(client.unread_count().await.unwrap(), 2);

        let offers = client.offers("cpu-1").await.unwrap();
        assert_eq!(offers.len(), 3);
        assert!(offers.windows(2).all(|w| w[0].price <= w[1].price));

        let min = client.min_price("cpu-1").await.unwrap();
        assert_eq!(min, Some(offers[0].price));

        let list = client.notifications().await.unwrap();
        client.mark_read(&list[0].id).await.unwrap();
        assert_eq!(client.unread_count().await.unwrap(), 1);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn bad_credentials_and_stale_tokens() {
        let (server, client) = start().await;

        let err = client.login(DEMO_EMAIL, "wrong-password").await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));

        let stale = client.clone().with_token(Some("demo-bogus".into()));
        let err = stale.unread_count().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn register_conflict() {
        let (server, client) = start().await;
        client
            .register("new@uconf.dev", "password1", "New")
            .await
            .unwrap();
        let err = client
            .register("new@uconf.dev", "password1", "New")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::CONFLICT));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn saved_build_lifecycle() {
        let (server, mut client) = start().await;
        let token = client.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        client.set_token(Some(token.access_token));

        let cpus = client
            .components(Category::Cpu, &Narrowing::default())
            .await
            .unwrap();
        let mut selection = Selection::new();
        selection.select(cpus[0].clone());

        let saved = client
            .save_build("Workstation", &selection.to_component_refs())
            .await
            .unwrap();
        assert_eq!(saved.name, "Workstation");
        assert_eq!(saved.components.len(), 1);

        let renamed = client
            .update_build(&saved.id, "Render box", &selection.to_component_refs())
            .await
            .unwrap();
        assert_eq!(renamed.name, "Render box");

        assert_eq!(client.user_builds().await.unwrap().len(), 1);
        client.delete_build(&saved.id).await.unwrap();
        assert!(client.user_builds().await.unwrap().is_empty());

        let err = client.delete_build(&saved.id).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn subscriptions_roundtrip() {
        let (server, mut client) = start().await;
        let token = client.login(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        client.set_token(Some(token.access_token));

        client.subscribe("cpu-2").await.unwrap();
        let status = client
            .subscription_status(&["cpu-2".to_string(), "cpu-3".to_string()])
            .await
            .unwrap();
        assert_eq!(status.get("cpu-2"), Some(&true));
        assert_eq!(status.get("cpu-3"), Some(&false));

        client.unsubscribe("cpu-2").await.unwrap();
        let status = client
            .subscription_status(&["cpu-2".to_string()])
            .await
            .unwrap();
        assert_eq!(status.get("cpu-2"), Some(&false));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn metadata_endpoints() {
        let (server, client) = start().await;
        let brands = client.brands(Category::Cpu).await.unwrap();
        assert_eq!(brands, vec!["AMD".to_string(), "Intel".to_string()]);

        let usecases = client.usecases().await.unwrap();
        assert!(usecases.iter().any(|u| u.name() == "gaming"));

        let builds = client.usecase_builds("gaming").await.unwrap();
        assert_eq!(builds.len(), 1);
        let parts = &builds[0].components;
        let cpu = parts.iter().find(|c| c.category == Category::Cpu).unwrap();
        let board = parts
            .iter()
            .find(|c| c.category == Category::Motherboard)
            .unwrap();
        assert_eq!(cpu.spec("socket"), board.spec("socket"));

        let err = client.usecase_builds("racing").await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        server.shutdown().await;
    }
}
