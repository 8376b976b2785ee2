//! Unread-count polling and price-alert subscriptions
//!
//! The poller is a tokio task owned through a [`PollerHandle`]; dropping the
//! handle stops it, so its lifetime follows whichever view holds it.

use crate::api::{ApiClient, ApiError, SubscriptionStatus};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollUpdate {
    Unread(u64),
    Failed(String),
}

pub struct NotificationPoller;

impl NotificationPoller {
    /// Poll `GET /notifications/count` every `interval`, starting now.
    ///
    /// Fixed interval, no backoff. A failed poll is reported and the next
    /// tick tries again. The task ends when the handle is cancelled or
    /// dropped, or when the receiver goes away.
    pub fn spawn<T>(client: ApiClient, interval: Duration, sender: mpsc::Sender<T>) -> PollerHandle
    where
        T: From<PollUpdate> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let update = match client.unread_count().await {
                            Ok(n) => PollUpdate::Unread(n),
                            Err(e) => {
                                tracing::debug!("Unread count poll failed: {}", e);
                                PollUpdate::Failed(e.user_message())
                            }
                        };
                        if sender.send(T::from(update)).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Notification poller stopped");
        });

        PollerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Owner of a running poller
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop polling. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        // An in-flight request is abandoned rather than awaited
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscriptions
// ─────────────────────────────────────────────────────────────────────────────

/// Backend call implied by a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}

/// Locally known subscription flags, updated optimistically
#[derive(Debug, Clone, Default)]
pub struct SubscriptionSet {
    subscribed: HashSet<String>,
}

impl SubscriptionSet {
    pub fn is_subscribed(&self, component_id: &str) -> bool {
        self.subscribed.contains(component_id)
    }

    /// Merge flags from `GET /subscriptions/status`
    pub fn apply_status(&mut self, status: &SubscriptionStatus) {
        for (id, on) in status {
            if *on {
                self.subscribed.insert(id.clone());
            } else {
                self.subscribed.remove(id);
            }
        }
    }

    /// Flip the local flag and return the call that makes it true remotely
    pub fn toggle(&mut self, component_id: &str) -> SubscriptionAction {
        if self.subscribed.remove(component_id) {
            SubscriptionAction::Unsubscribe
        } else {
            self.subscribed.insert(component_id.to_string());
            SubscriptionAction::Subscribe
        }
    }

    /// Undo a toggle whose backend call failed
    pub fn rollback(&mut self, component_id: &str, action: SubscriptionAction) {
        match action {
            SubscriptionAction::Subscribe => {
                self.subscribed.remove(component_id);
            }
            SubscriptionAction::Unsubscribe => {
                self.subscribed.insert(component_id.to_string());
            }
        }
    }

    pub fn clear(&mut self) {
        self.subscribed.clear();
    }

    pub fn len(&self) -> usize {
        self.subscribed.len()
    }
}

/// Perform the backend call for an action
pub async fn apply_subscription(
    client: &ApiClient,
    component_id: &str,
    action: SubscriptionAction,
) -> Result<(), ApiError> {
    match action {
        SubscriptionAction::Subscribe => client.subscribe(component_id).await,
        SubscriptionAction::Unsubscribe => client.unsubscribe(component_id).await,
    }
}

/// Optimistic toggle: flip locally, call the backend, roll back on failure
pub async fn toggle_subscription(
    set: &mut SubscriptionSet,
    client: &ApiClient,
    component_id: &str,
) -> Result<SubscriptionAction, ApiError> {
    let action = set.toggle(component_id);
    if let Err(e) = apply_subscription(client, component_id, action).await {
        set.rollback(component_id, action);
        return Err(e);
    }
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::ServerGuard, token: Option<&str>) -> ApiClient {
        ApiClient::new(&server.url(), Duration::from_secs(2))
            .unwrap()
            .with_token(token.map(str::to_string))
    }

    #[tokio::test]
    async fn poller_reports_unread_count() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/notifications/count")
            .with_status(200)
            .with_body(r#"{"unread": 3}"#)
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::channel::<PollUpdate>(8);
        let mut handle =
            NotificationPoller::spawn(client(&server, Some("t")), Duration::from_millis(20), tx);

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(PollUpdate::Unread(3)));

        handle.cancel();
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn poller_reports_failures_without_stopping() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/notifications/count")
            .with_status(500)
            .expect_at_least(2)
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::channel::<PollUpdate>(8);
        let _handle =
            NotificationPoller::spawn(client(&server, Some("t")), Duration::from_millis(10), tx);

        for _ in 0..2 {
            let update = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap();
            assert!(matches!(update, Some(PollUpdate::Failed(_))));
        }
    }

    #[tokio::test]
    async fn dropping_handle_closes_channel() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/notifications/count")
            .with_status(200)
            .with_body(r#"{"unread": 0}"#)
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::channel::<PollUpdate>(8);
        let handle =
            NotificationPoller::spawn(client(&server, Some("t")), Duration::from_millis(10), tx);
        drop(handle);

        // The task owned the only sender; once it's gone recv yields None
        let drained = tokio::time::timeout(Duration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[test]
    fn toggle_and_rollback() {
        let mut set = SubscriptionSet::default();
        assert_eq!(set.toggle("cpu-1"), SubscriptionAction::Subscribe);
        assert!(set.is_subscribed("cpu-1"));

        set.rollback("cpu-1", SubscriptionAction::Subscribe);
        assert!(!set.is_subscribed("cpu-1"));

        set.toggle("cpu-1");
        assert_eq!(set.toggle("cpu-1"), SubscriptionAction::Unsubscribe);
        set.rollback("cpu-1", SubscriptionAction::Unsubscribe);
        assert!(set.is_subscribed("cpu-1"));
    }

    #[test]
    fn status_merge_overrides_local_flags() {
        let mut set = SubscriptionSet::default();
        set.toggle("a");
        let status: SubscriptionStatus =
            [("a".to_string(), false), ("b".to_string(), true)].into();
        set.apply_status(&status);
        assert!(!set.is_subscribed("a"));
        assert!(set.is_subscribed("b"));
    }

    #[tokio::test]
    async fn failed_subscribe_rolls_back() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/subscriptions")
            .with_status(500)
            .create_async()
            .await;

        let mut set = SubscriptionSet::default();
        let api = client(&server, Some("t"));
        let result = toggle_subscription(&mut set, &api, "cpu-1").await;
        assert!(result.is_err());
        assert!(!set.is_subscribed("cpu-1"));
    }

    #[tokio::test]
    async fn subscribe_without_login_rolls_back() {
        let server = mockito::Server::new_async().await;
        let mut set = SubscriptionSet::default();
        let api = client(&server, None);
        let err = toggle_subscription(&mut set, &api, "cpu-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired));
        assert_eq!(set.len(), 0);
    }
}
