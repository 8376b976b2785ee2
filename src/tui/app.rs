// App state for the configurator TUI
//
// Everything the screen shows lives here. Network calls never block the
// event loop: they run on spawned tasks and report back through
// `AppEvent`s on the app's channel, which `handle_event` applies.

use super::form::{AuthForm, FormKind};
use super::overlay::{BuildEntry, BuildSource, Overlay, OverlayAction};
use super::theme::Theme;
use super::toast::Toast;
use crate::api::{ApiClient, ApiError, AuthToken, Metadata, Session, SubscriptionStatus};
use crate::catalog::{
    Category, Component, Notification, Offer, SavedBuild, SelectOutcome, UseCase, UseCaseBuild,
};
use crate::config::Config;
use crate::logging::LogBuffer;
use crate::notifications::{
    apply_subscription, NotificationPoller, PollUpdate, PollerHandle, SubscriptionAction,
    SubscriptionSet,
};
use crate::workflow::Workflow;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Results of background work, delivered to the event loop
#[derive(Debug)]
pub enum AppEvent {
    MetadataLoaded(Metadata),
    ComponentsLoaded {
        generation: u64,
        result: Result<Vec<Component>, ApiError>,
    },
    PricesLoaded(HashMap<String, Option<f64>>),
    OffersLoaded {
        component_id: String,
        result: Result<Vec<Offer>, ApiError>,
    },
    SubscriptionStatus(Result<SubscriptionStatus, ApiError>),
    SubscriptionApplied {
        component_id: String,
        action: SubscriptionAction,
        result: Result<(), ApiError>,
    },
    NotificationsLoaded(Result<Vec<Notification>, ApiError>),
    MarkedRead {
        id: String,
        result: Result<(), ApiError>,
    },
    AuthCompleted(Result<AuthToken, ApiError>),
    BuildSaved(Result<SavedBuild, ApiError>),
    BuildsLoaded {
        curated: Option<Result<Vec<UseCaseBuild>, ApiError>>,
        saved: Option<Result<Vec<SavedBuild>, ApiError>>,
    },
    BuildDeleted {
        id: String,
        result: Result<(), ApiError>,
    },
    Poll(PollUpdate),
}

impl From<PollUpdate> for AppEvent {
    fn from(update: PollUpdate) -> Self {
        AppEvent::Poll(update)
    }
}

pub struct App {
    pub theme: Theme,
    pub workflow: Workflow,
    pub session: Session,
    pub log_buffer: LogBuffer,
    pub overlay: Option<Overlay>,
    pub toast: Option<Toast>,
    /// Highlighted row of the component list
    pub cursor: usize,
    /// Keys edit the search text while set
    pub search_mode: bool,
    /// Last polled unread count; `None` until the first poll answers
    pub unread: Option<u64>,
    pub subscriptions: SubscriptionSet,
    /// Saved build (id, name) the selection was loaded from
    pub loaded_build: Option<(String, String)>,
    pub spinner_frame: usize,
    pub should_quit: bool,
    client: ApiClient,
    poll_interval: Duration,
    price_concurrency: usize,
    /// Ids whose price was already asked for. A missing price is not cached,
    /// so without this a priceless component would be asked for forever.
    requested_prices: HashSet<String>,
    status_requested: HashSet<String>,
    poller: Option<PollerHandle>,
    tx: mpsc::Sender<AppEvent>,
}

impl App {
    /// Needs a running tokio runtime; background work starts immediately.
    pub fn new(
        config: &Config,
        session: Session,
        log_buffer: LogBuffer,
        tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self, ApiError> {
        let client = ApiClient::from_config(config)?.with_token(session.bearer());
        let mut app = Self {
            theme: Theme::default(),
            workflow: Workflow::new(),
            session,
            log_buffer,
            overlay: None,
            toast: None,
            cursor: 0,
            search_mode: false,
            unread: None,
            subscriptions: SubscriptionSet::default(),
            loaded_build: None,
            spinner_frame: 0,
            should_quit: false,
            client,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            price_concurrency: config.price_concurrency,
            requested_prices: HashSet::new(),
            status_requested: HashSet::new(),
            poller: None,
            tx,
        };

        app.load_metadata();
        if app.session.is_authenticated() {
            app.start_poller();
        }
        app.sync();
        Ok(app)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Background work
    // ─────────────────────────────────────────────────────────────────────────

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // Receiver gone means the TUI is shutting down
            let _ = tx.send(work.await).await;
        });
    }

    fn load_metadata(&self) {
        let client = self.client.clone();
        self.spawn(async move { AppEvent::MetadataLoaded(Metadata::fetch(&client).await) });
    }

    fn start_poller(&mut self) {
        self.poller = Some(NotificationPoller::spawn(
            self.client.clone(),
            self.poll_interval,
            self.tx.clone(),
        ));
    }

    fn stop_poller(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.cancel();
        }
        self.unread = None;
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(PollerHandle::is_running)
    }

    /// Start whatever the current view is missing: the component list, prices
    /// for listed and selected parts, and alert flags when logged in.
    pub fn sync(&mut self) {
        if self.workflow.needs_fetch() {
            let pending = self.workflow.begin_fetch();
            let client = self.client.clone();
            self.spawn(async move {
                let result = client.fetch(&pending.query).await;
                AppEvent::ComponentsLoaded {
                    generation: pending.generation,
                    result,
                }
            });
        }

        let mut ids = self.workflow.unpriced_ids();
        ids.extend(
            self.workflow
                .selection()
                .components()
                .filter(|c| !self.workflow.prices().contains(&c.id))
                .map(|c| c.id.clone()),
        );
        ids.retain(|id| self.requested_prices.insert(id.clone()));
        if !ids.is_empty() {
            let client = self.client.clone();
            let concurrency = self.price_concurrency;
            self.spawn(async move {
                AppEvent::PricesLoaded(client.min_prices(ids, concurrency).await)
            });
        }

        if self.session.is_authenticated() {
            let ids: Vec<String> = self
                .workflow
                .visible()
                .into_iter()
                .map(|c| c.id)
                .filter(|id| self.status_requested.insert(id.clone()))
                .collect();
            if !ids.is_empty() {
                let client = self.client.clone();
                self.spawn(async move {
                    AppEvent::SubscriptionStatus(client.subscription_status(&ids).await)
                });
            }
        }

        self.clamp_cursor();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    pub fn selected_component(&self) -> Option<Component> {
        self.workflow.visible().into_iter().nth(self.cursor)
    }

    pub fn account_label(&self) -> Option<String> {
        self.session
            .token()
            .map(|t| t.email.clone().unwrap_or_else(|| "logged in".to_string()))
    }

    fn clamp_cursor(&mut self) {
        let len = self.workflow.visible().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::info(message));
    }

    fn show_error(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::error(message));
    }

    /// Advance the spinner and drop an expired toast
    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    pub fn shutdown(&mut self) {
        self.stop_poller();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Open the login form unless logged in. Returns whether logged in.
    fn require_login(&mut self, prompt: &str) -> bool {
        if self.session.is_authenticated() {
            return true;
        }
        self.overlay = Some(Overlay::Auth(AuthForm::login().with_message(prompt)));
        false
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.session.logout() {
            tracing::warn!("Could not remove token file: {:#}", e);
        }
        self.client.set_token(None);
        self.stop_poller();
        self.subscriptions.clear();
        self.status_requested.clear();
        self.loaded_build = None;
        // Logging out drops cached metadata; fetch it again for browsing
        self.load_metadata();
    }

    fn expire_session(&mut self) {
        self.logout();
        self.overlay = Some(Overlay::Auth(
            AuthForm::login().with_message(ApiError::SessionExpired.user_message()),
        ));
    }

    /// Common handling for a failed call. Expired sessions go back to login;
    /// anything else becomes a toast.
    fn report(&mut self, e: &ApiError) {
        match e {
            ApiError::SessionExpired => self.expire_session(),
            ApiError::AuthRequired => {
                self.require_login(&e.user_message());
            }
            _ => self.show_error(e.user_message()),
        }
    }

    fn on_authenticated(&mut self, token: AuthToken) {
        let access = token.access_token.clone();
        let email = token.email.clone();
        if let Err(e) = self.session.login(token) {
            tracing::warn!("Could not store token: {:#}", e);
            if let Some(Overlay::Auth(form)) = &mut self.overlay {
                form.pending = false;
                form.message = Some("Could not save the session to disk.".to_string());
            }
            return;
        }
        self.client.set_token(Some(access));
        self.overlay = None;
        self.status_requested.clear();
        self.start_poller();
        self.show_toast(format!(
            "Logged in as {}",
            email.as_deref().unwrap_or("you")
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events from background work
    // ─────────────────────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::MetadataLoaded(metadata) => self.session.apply_metadata(metadata),

            AppEvent::ComponentsLoaded { generation, result } => {
                self.workflow.complete_fetch(generation, result);
            }

            AppEvent::PricesLoaded(prices) => {
                for (id, price) in prices {
                    self.workflow.record_price(&id, price);
                }
            }

            AppEvent::OffersLoaded {
                component_id,
                result,
            } => {
                let Some(Overlay::Offers {
                    component,
                    offers,
                    error,
                    ..
                }) = &mut self.overlay
                else {
                    return;
                };
                if component.id != component_id {
                    return;
                }
                match result {
                    Ok(list) => {
                        if let Some(cheapest) = list.first() {
                            let price = cheapest.price;
                            self.workflow.record_price(&component_id, Some(price));
                        }
                        *offers = Some(list);
                    }
                    Err(ApiError::SessionExpired) => self.expire_session(),
                    Err(e) => *error = Some(e.user_message()),
                }
            }

            AppEvent::SubscriptionStatus(result) => match result {
                Ok(status) if self.session.is_authenticated() => {
                    self.subscriptions.apply_status(&status)
                }
                Ok(_) => {}
                Err(ApiError::SessionExpired) => self.expire_session(),
                Err(e) => tracing::debug!("Subscription status unavailable: {}", e),
            },

            AppEvent::SubscriptionApplied {
                component_id,
                action,
                result,
            } => match result {
                Ok(()) => self.show_toast(match action {
                    SubscriptionAction::Subscribe => "Price alert on",
                    SubscriptionAction::Unsubscribe => "Price alert off",
                }),
                Err(e) => {
                    self.subscriptions.rollback(&component_id, action);
                    self.report(&e);
                }
            },

            AppEvent::NotificationsLoaded(result) => {
                let Some(Overlay::Notifications { items, error, .. }) = &mut self.overlay else {
                    return;
                };
                match result {
                    Ok(list) => {
                        let unread = list.iter().filter(|n| !n.is_read).count() as u64;
                        *items = Some(list);
                        self.unread = Some(unread);
                    }
                    Err(ApiError::SessionExpired) => self.expire_session(),
                    Err(e) => *error = Some(e.user_message()),
                }
            }

            AppEvent::MarkedRead { id, result } => match result {
                Ok(()) => {
                    if let Some(Overlay::Notifications {
                        items: Some(items), ..
                    }) = &mut self.overlay
                    {
                        if let Some(n) = items.iter_mut().find(|n| n.id == id) {
                            n.is_read = true;
                        }
                    }
                    self.unread = self.unread.map(|n| n.saturating_sub(1));
                }
                Err(e) => self.report(&e),
            },

            AppEvent::AuthCompleted(result) => match result {
                Ok(token) => self.on_authenticated(token),
                Err(e) => {
                    if let Some(Overlay::Auth(form)) = &mut self.overlay {
                        form.pending = false;
                        form.message = Some(match e.status().map(|s| s.as_u16()) {
                            Some(401) => "Wrong email or password.".to_string(),
                            _ => e.user_message(),
                        });
                    }
                }
            },

            AppEvent::BuildSaved(result) => match result {
                Ok(build) => {
                    self.overlay = None;
                    self.show_toast(format!("Saved \"{}\"", build.name));
                    self.loaded_build = Some((build.id, build.name));
                }
                Err(ApiError::SessionExpired) => self.expire_session(),
                Err(e) => {
                    if let Some(Overlay::SaveBuild { error, saving, .. }) = &mut self.overlay {
                        *saving = false;
                        *error = Some(e.user_message());
                    } else {
                        self.show_error(e.user_message());
                    }
                }
            },

            AppEvent::BuildsLoaded { curated, saved } => {
                let Some(Overlay::Builds {
                    entries, loading, ..
                }) = &mut self.overlay
                else {
                    return;
                };
                *loading = false;
                let mut failure = None;

                match curated {
                    Some(Ok(builds)) => entries.extend(builds.into_iter().map(|b| BuildEntry {
                        label: format!("★ {}", b.name),
                        source: BuildSource::Curated,
                        components: b.components,
                    })),
                    Some(Err(e)) => failure = Some(e),
                    None => {}
                }
                match saved {
                    Some(Ok(builds)) => entries.extend(builds.into_iter().map(|b| BuildEntry {
                        label: b.name,
                        source: BuildSource::Saved { id: b.id },
                        components: b.components,
                    })),
                    Some(Err(e)) => failure = Some(e),
                    None => {}
                }
                if let Some(e) = failure {
                    self.report(&e);
                }
            }

            AppEvent::BuildDeleted { id, result } => match result {
                Ok(()) => {
                    if let Some(Overlay::Builds {
                        entries, selected, ..
                    }) = &mut self.overlay
                    {
                        entries.retain(|e| e.source != BuildSource::Saved { id: id.clone() });
                        *selected = (*selected).min(entries.len().saturating_sub(1));
                    }
                    if self.loaded_build.as_ref().is_some_and(|(loaded, _)| *loaded == id) {
                        self.loaded_build = None;
                    }
                    self.show_toast("Build deleted");
                }
                Err(e) => self.report(&e),
            },

            AppEvent::Poll(update) => match update {
                // A poll answered after logout belongs to the old session
                PollUpdate::Unread(n) if self.session.is_authenticated() => {
                    self.unread = Some(n)
                }
                PollUpdate::Unread(_) => {}
                PollUpdate::Failed(msg) => tracing::debug!("Unread poll failed: {}", msg),
            },
        }
        self.sync();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Layered dispatch: overlay → search box → global → main view
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.overlay.is_some() {
            self.handle_overlay_key(key);
        } else if self.search_mode {
            self.handle_search_key(key);
        } else if !self.handle_global_key(key) {
            self.handle_main_key(key);
        }
        self.sync();
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) {
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        match overlay.handle_key(key) {
            OverlayAction::None => {}
            OverlayAction::Close => self.overlay = None,
            OverlayAction::SubmitAuth => self.submit_auth(),
            OverlayAction::SwitchAuth => {
                if let Some(Overlay::Auth(form)) = &self.overlay {
                    self.overlay = Some(Overlay::Auth(form.switched()));
                }
            }
            OverlayAction::OpenOffers(component) => self.open_offers(component),
            OverlayAction::ToggleAlert(id) => self.toggle_alert(&id),
            OverlayAction::MarkRead(id) => {
                let client = self.client.clone();
                self.spawn(async move {
                    let result = client.mark_read(&id).await;
                    AppEvent::MarkedRead { id, result }
                });
            }
            OverlayAction::SaveBuild { name, update } => {
                let client = self.client.clone();
                let refs = self.workflow.selection().to_component_refs();
                self.spawn(async move {
                    let result = match update {
                        Some(id) => client.update_build(&id, &name, &refs).await,
                        None => client.save_build(&name, &refs).await,
                    };
                    AppEvent::BuildSaved(result)
                });
            }
            OverlayAction::LoadBuild(index) => self.load_build(index),
            OverlayAction::DeleteBuild(index) => {
                let id = match &self.overlay {
                    Some(Overlay::Builds { entries, .. }) => match entries.get(index) {
                        Some(BuildEntry {
                            source: BuildSource::Saved { id },
                            ..
                        }) => id.clone(),
                        _ => return,
                    },
                    _ => return,
                };
                let client = self.client.clone();
                self.spawn(async move {
                    let result = client.delete_build(&id).await;
                    AppEvent::BuildDeleted { id, result }
                });
            }
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut search = self.workflow.filters().search.clone();
        match key.code {
            KeyCode::Enter => self.search_mode = false,
            KeyCode::Esc => {
                self.search_mode = false;
                search.clear();
            }
            KeyCode::Backspace => {
                search.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => search.push(c),
            _ => return,
        }
        self.workflow.set_search(search);
        self.cursor = 0;
    }

    /// Keys that work on the main screen regardless of list state
    fn handle_global_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.overlay = Some(Overlay::Help),
            KeyCode::Char('l') => {
                if self.session.is_authenticated() {
                    self.show_toast("Already logged in (L to log out)");
                } else {
                    self.overlay = Some(Overlay::Auth(AuthForm::login()));
                }
            }
            KeyCode::Char('R') if !self.session.is_authenticated() => {
                self.overlay = Some(Overlay::Auth(AuthForm::register()));
            }
            KeyCode::Char('L') if self.session.is_authenticated() => {
                self.logout();
                self.show_toast("Logged out");
            }
            KeyCode::Char('n') => {
                if self.require_login("Log in to see price notifications.") {
                    self.overlay = Some(Overlay::notifications());
                    let client = self.client.clone();
                    self.spawn(async move {
                        AppEvent::NotificationsLoaded(client.notifications().await)
                    });
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Right => self.set_category(self.workflow.category().next()),
            KeyCode::BackTab | KeyCode::Left => {
                self.set_category(self.workflow.category().prev())
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                if let Some(category) = Category::ALL.get(index) {
                    self.set_category(*category);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor += 1,
            KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.cursor = usize::MAX,
            KeyCode::PageUp => self.cursor = self.cursor.saturating_sub(10),
            KeyCode::PageDown => self.cursor = self.cursor.saturating_add(10),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('x') | KeyCode::Delete => {
                let category = self.workflow.category();
                if let Some(removed) = self.workflow.remove(category) {
                    self.show_toast(format!("Removed {}", removed.name));
                }
            }
            KeyCode::Char('X') => {
                if !self.workflow.selection().is_empty() {
                    self.workflow.load_build(Vec::new());
                    self.loaded_build = None;
                    self.show_toast("Build cleared");
                }
            }
            KeyCode::Char('/') => self.search_mode = true,
            KeyCode::Char('u') => {
                let next = self.workflow.filters().usecase.next();
                self.workflow.set_usecase(next);
                self.cursor = 0;
            }
            KeyCode::Char('b') => self.cycle_brand(),
            KeyCode::Char('s') => {
                let next = self.workflow.filters().sort.next();
                self.workflow.set_sort(next);
            }
            KeyCode::Char('c') => {
                let next = self.workflow.mode().toggle();
                self.workflow.set_mode(next);
                self.cursor = 0;
            }
            // Re-selecting the current category clears a failed fetch
            KeyCode::Char('r') => {
                let category = self.workflow.category();
                self.workflow.set_category(category);
            }
            KeyCode::Char('d') => {
                if let Some(component) = self.selected_component() {
                    self.overlay = Some(Overlay::Details(component));
                }
            }
            KeyCode::Char('o') => {
                if let Some(component) = self.selected_component() {
                    self.open_offers(component);
                }
            }
            KeyCode::Char('a') => {
                if let Some(component) = self.selected_component() {
                    self.toggle_alert(&component.id);
                }
            }
            KeyCode::Char('w') => self.open_save_build(),
            KeyCode::Char('B') => self.open_builds(),
            _ => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    fn set_category(&mut self, category: Category) {
        if self.workflow.set_category(category) {
            self.cursor = 0;
            self.search_mode = false;
        }
    }

    fn cycle_brand(&mut self) {
        let options = self.session.brand_options(self.workflow.category());
        let current = &self.workflow.filters().brand;
        let index = options.iter().position(|b| b == current).unwrap_or(0);
        if let Some(next) = options.get((index + 1) % options.len().max(1)) {
            self.workflow.set_brand(next.clone());
            self.cursor = 0;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(component) = self.selected_component() else {
            return;
        };
        let name = component.name.clone();
        match self.workflow.select(component) {
            SelectOutcome::Selected { replaced: Some(old) } => {
                self.show_toast(format!("Replaced {} with {}", old.name, name))
            }
            SelectOutcome::Selected { replaced: None } => self.show_toast(format!("Added {name}")),
            SelectOutcome::Deselected => self.show_toast(format!("Removed {name}")),
        }
    }

    fn open_offers(&mut self, component: Component) {
        if !self.require_login("Log in to see shop offers.") {
            return;
        }
        let id = component.id.clone();
        self.overlay = Some(Overlay::offers(component));
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.offers(&id).await;
            AppEvent::OffersLoaded {
                component_id: id,
                result,
            }
        });
    }

    /// Optimistic: the flag flips now and rolls back if the call fails
    fn toggle_alert(&mut self, component_id: &str) {
        if !self.require_login("Log in to set price alerts.") {
            return;
        }
        let action = self.subscriptions.toggle(component_id);
        let client = self.client.clone();
        let component_id = component_id.to_string();
        self.spawn(async move {
            let result = apply_subscription(&client, &component_id, action).await;
            AppEvent::SubscriptionApplied {
                component_id,
                action,
                result,
            }
        });
    }

    fn submit_auth(&mut self) {
        let Some(Overlay::Auth(form)) = &self.overlay else {
            return;
        };
        let client = self.client.clone();
        let kind = form.kind;
        let email = form.email.trim().to_string();
        let password = form.password.clone();
        let name = form.name.trim().to_string();
        self.spawn(async move {
            let result = match kind {
                FormKind::Login => client.login(&email, &password).await,
                FormKind::Register => client.register(&email, &password, &name).await,
            };
            AppEvent::AuthCompleted(result)
        });
    }

    fn open_save_build(&mut self) {
        if !self.require_login("Log in to save builds.") {
            return;
        }
        if self.workflow.selection().is_empty() {
            self.show_error("Pick at least one component first.");
            return;
        }
        let (name, update) = match &self.loaded_build {
            Some((id, name)) => (name.clone(), Some(id.clone())),
            None => (String::new(), None),
        };
        self.overlay = Some(Overlay::save_build(name, update));
    }

    fn open_builds(&mut self) {
        let usecase = self.workflow.filters().usecase;
        let authenticated = self.session.is_authenticated();
        if usecase == UseCase::All && !authenticated {
            self.show_error("Pick a use case (u) or log in to load builds.");
            return;
        }
        self.overlay = Some(Overlay::Builds {
            entries: Vec::new(),
            loading: true,
            selected: 0,
        });
        let client = self.client.clone();
        self.spawn(async move {
            let curated = match usecase {
                UseCase::All => None,
                other => Some(client.usecase_builds(other.as_str()).await),
            };
            let saved = if authenticated {
                Some(client.user_builds().await)
            } else {
                None
            };
            AppEvent::BuildsLoaded { curated, saved }
        });
    }

    fn load_build(&mut self, index: usize) {
        let Some(Overlay::Builds { entries, .. }) = self.overlay.take() else {
            return;
        };
        let Some(entry) = entries.into_iter().nth(index) else {
            return;
        };
        let count = entry.components.len();
        self.workflow.load_build(entry.components);
        self.loaded_build = match entry.source {
            BuildSource::Saved { id } => Some((id, entry.label.clone())),
            BuildSource::Curated => None,
        };
        self.cursor = 0;
        self.show_toast(format!("Loaded {} ({} parts)", entry.label, count));
    }
}
