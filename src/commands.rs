//! Handlers for the backend subcommands
//!
//! Each handler prints plain text to stdout; logs go to stderr.

use crate::api::{validate_email, validate_registration, ApiClient, Session, TokenStore};
use crate::catalog::{
    filter_and_sort, BrandFilter, Category, Component, FilterState, Narrowing, PriceCache,
    Selection, SortOrder, UseCase,
};
use crate::cli::{BuildsAction, NotificationsAction};
use crate::config::Config;
use crate::notifications::{NotificationPoller, PollUpdate};
use crate::util::{format_price, pad_to_width};
use crate::workflow::build_compatibility_request;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

const NAME_WIDTH: usize = 40;

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn token_store() -> Result<TokenStore> {
    TokenStore::default_path()
        .map(TokenStore::new)
        .context("Could not determine token file path")
}

/// Client carrying the stored token, if any
fn client_with_session(config: &Config) -> Result<(ApiClient, Session)> {
    let session = Session::restore(token_store()?);
    let client = ApiClient::from_config(config)?.with_token(session.bearer());
    Ok((client, session))
}

fn authed_client(config: &Config) -> Result<ApiClient> {
    let (client, session) = client_with_session(config)?;
    if !session.is_authenticated() {
        bail!("Not logged in. Run `uconf login --email <EMAIL>` first.");
    }
    Ok(client)
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn print_components(list: &[Component], prices: &PriceCache) {
    if list.is_empty() {
        println!("No components found.");
        return;
    }
    for c in list {
        println!(
            "{:<12} {} {:<10} {:>10}  {}",
            c.id,
            pad_to_width(&c.name, NAME_WIDTH),
            c.brand,
            format_price(prices.get(&c.id)),
            c.spec_summary()
        );
    }
}

async fn price_list(client: &ApiClient, list: &[Component], concurrency: usize) -> PriceCache {
    let ids = list.iter().map(|c| c.id.clone()).collect();
    let mut cache = PriceCache::default();
    for (id, price) in client.min_prices(ids, concurrency).await {
        cache.record(&id, price);
    }
    cache
}

/// Use case and brand flags as the configurator's filters; "all" values narrow nothing
fn filter_state(usecase: Option<UseCase>, brand: Option<&str>) -> FilterState {
    FilterState {
        usecase: usecase.unwrap_or_default(),
        brand: BrandFilter::parse(brand.unwrap_or_default()),
        ..FilterState::default()
    }
}

/// Look components up by id across every category
async fn resolve_ids(client: &ApiClient, ids: &[String]) -> Result<Vec<Component>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let lookups = Category::ALL.map(|category| async move {
        client.components(category, &Narrowing::default()).await
    });
    let mut by_id: HashMap<String, Component> = HashMap::new();
    for result in futures::future::join_all(lookups).await {
        for component in result? {
            by_id.insert(component.id.clone(), component);
        }
    }

    let missing: Vec<&str> = ids
        .iter()
        .filter(|id| !by_id.contains_key(id.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        bail!("Unknown component id(s): {}", missing.join(", "));
    }
    Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
}

fn selection_from(components: Vec<Component>) -> Selection {
    let mut selection = Selection::new();
    for component in components {
        // A repeated id would toggle its part back out
        if selection.contains(&component) {
            continue;
        }
        if selection.get(component.category).is_some() {
            tracing::warn!(
                category = %component.category,
                "More than one part for a category; keeping the last"
            );
        }
        selection.select(component);
    }
    selection
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

pub async fn components(
    config: &Config,
    category: Category,
    usecase: Option<UseCase>,
    brand: Option<String>,
    search: String,
    sort: Option<SortOrder>,
) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    let filters = FilterState {
        search,
        sort: sort.unwrap_or_default(),
        ..filter_state(usecase, brand.as_deref())
    };
    let list = client.components(category, &filters.narrowing()).await?;
    let prices = price_list(&client, &list, config.price_concurrency).await;
    let visible = filter_and_sort(&list, &filters.search, filters.sort, &prices);
    print_components(&visible, &prices);
    Ok(())
}

pub async fn compatible(
    config: &Config,
    category: Category,
    with: Vec<String>,
    usecase: Option<UseCase>,
    brand: Option<String>,
) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    let selection = selection_from(resolve_ids(&client, &with).await?);
    let narrowing = filter_state(usecase, brand.as_deref()).narrowing();

    let request = build_compatibility_request(category, &selection, &narrowing);
    tracing::debug!(bases = request.bases.len(), "Compatibility query");
    let list = client.compatible(&request).await?;
    let prices = price_list(&client, &list, config.price_concurrency).await;
    print_components(&list, &prices);
    Ok(())
}

pub async fn brands(config: &Config, category: Category) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    for brand in client.brands(category).await? {
        println!("{brand}");
    }
    Ok(())
}

pub async fn usecases(config: &Config) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    for info in client.usecases().await? {
        match info {
            crate::catalog::UseCaseInfo::Detailed {
                name,
                description: Some(description),
            } => println!("{:<12} {}", name, description),
            other => println!("{}", other.name()),
        }
    }
    Ok(())
}

pub async fn usecase(config: &Config, tag: &str) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    let builds = client.usecase_builds(tag).await?;
    if builds.is_empty() {
        println!("No curated builds for '{tag}'.");
    }
    for build in builds {
        println!("{}", build.name);
        for c in &build.components {
            println!("  {:<12} {:<12} {}", c.category.label(), c.id, c.name);
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pricing
// ─────────────────────────────────────────────────────────────────────────────

pub async fn offers(config: &Config, id: &str) -> Result<()> {
    let client = authed_client(config)?;
    let offers = client.offers(id).await?;
    if offers.is_empty() {
        println!("No offers for {id}.");
    }
    for offer in offers {
        println!(
            "{:<12} {:>10}  {:<10} {}",
            offer.shop_name,
            format_price(Some(offer.price)),
            offer.availability,
            offer.url
        );
    }
    Ok(())
}

pub async fn price(config: &Config, id: &str) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    println!("{}", format_price(client.min_price(id).await?));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

pub async fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    validate_email(email).map_err(anyhow::Error::msg)?;
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    let (client, mut session) = client_with_session(config)?;
    let token = client.login(email.trim(), &password).await?;
    session.login(token)?;
    println!("Logged in as {}", email.trim());
    Ok(())
}

pub async fn register(
    config: &Config,
    email: &str,
    name: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    validate_registration(email, &password, name).map_err(anyhow::Error::msg)?;

    let (client, mut session) = client_with_session(config)?;
    let token = client.register(email.trim(), &password, name.trim()).await?;
    session.login(token)?;
    println!("Registered and logged in as {}", email.trim());
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut session = Session::restore(token_store()?);
    session.logout()?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(config: &Config) -> Result<()> {
    let (client, session) = client_with_session(config)?;
    let Some(token) = session.token() else {
        println!("Not logged in.");
        return Ok(());
    };
    if token.is_expired(chrono::Utc::now()) {
        println!("Stored token has expired. Log in again.");
        return Ok(());
    }
    let profile = client.me().await?;
    println!("{} <{}>", profile.name, profile.email);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Saved builds
// ─────────────────────────────────────────────────────────────────────────────

pub async fn builds(config: &Config, action: BuildsAction) -> Result<()> {
    let client = authed_client(config)?;
    match action {
        BuildsAction::List => {
            let builds = client.user_builds().await?;
            if builds.is_empty() {
                println!("No saved builds.");
            }
            for build in builds {
                let updated = build
                    .updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{:<6} {} {:>2} parts  {}",
                    build.id,
                    pad_to_width(&build.name, 30),
                    build.components.len(),
                    updated
                );
            }
        }
        BuildsAction::Save { name, with } => {
            let selection = selection_from(resolve_ids(&client, &with).await?);
            let saved = client
                .save_build(&name, &selection.to_component_refs())
                .await?;
            println!("Saved build {} ({})", saved.id, saved.name);
        }
        BuildsAction::Update { id, name, with } => {
            let selection = selection_from(resolve_ids(&client, &with).await?);
            let saved = client
                .update_build(&id, &name, &selection.to_component_refs())
                .await?;
            println!("Updated build {} ({})", saved.id, saved.name);
        }
        BuildsAction::Delete { id } => {
            client.delete_build(&id).await?;
            println!("Deleted build {id}");
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Alerts
// ─────────────────────────────────────────────────────────────────────────────

pub async fn subscribe(config: &Config, id: &str, subscribe: bool) -> Result<()> {
    let client = authed_client(config)?;
    if subscribe {
        client.subscribe(id).await?;
        println!("Subscribed to {id}");
    } else {
        client.unsubscribe(id).await?;
        println!("Unsubscribed from {id}");
    }
    Ok(())
}

pub async fn subscriptions(config: &Config, ids: &[String]) -> Result<()> {
    let client = authed_client(config)?;
    let status = client.subscription_status(ids).await?;
    for id in ids {
        let flag = match status.get(id) {
            Some(true) => "subscribed",
            Some(false) => "-",
            None => "?",
        };
        println!("{:<12} {}", id, flag);
    }
    Ok(())
}

pub async fn notifications(config: &Config, action: NotificationsAction) -> Result<()> {
    let client = authed_client(config)?;
    match action {
        NotificationsAction::List => {
            let list = client.notifications().await?;
            if list.is_empty() {
                println!("No notifications.");
            }
            for n in list {
                println!(
                    "{:<6} {} {}  {}",
                    n.id,
                    if n.is_read { " " } else { "●" },
                    n.created_at.format("%Y-%m-%d %H:%M"),
                    n.headline()
                );
            }
        }
        NotificationsAction::Count => println!("{}", client.unread_count().await?),
        NotificationsAction::Read { id } => {
            client.mark_read(&id).await?;
            println!("Marked {id} as read");
        }
        NotificationsAction::Watch => watch(client, config.poll_interval_secs).await?,
    }
    Ok(())
}

/// Print unread-count changes until Ctrl-C
async fn watch(client: ApiClient, interval_secs: u64) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<PollUpdate>(16);
    let mut poller = NotificationPoller::spawn(client, Duration::from_secs(interval_secs), tx);
    eprintln!("Polling every {interval_secs}s. Ctrl-C to stop.");

    let mut last: Option<u64> = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = rx.recv() => match update {
                Some(PollUpdate::Unread(n)) if last != Some(n) => {
                    println!("{} unread", n);
                    last = Some(n);
                }
                Some(PollUpdate::Unread(_)) => {}
                Some(PollUpdate::Failed(msg)) => eprintln!("Poll failed: {msg}"),
                None => break,
            },
        }
    }
    poller.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoServer;

    #[tokio::test]
    async fn resolve_ids_finds_parts_across_categories() {
        let server = DemoServer::start("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let client = ApiClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();

        let parts = resolve_ids(&client, &["mb-1".to_string(), "cpu-1".to_string()])
            .await
            .unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].category, Category::Motherboard);

        let err = resolve_ids(&client, &["nope-9".to_string()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope-9"));
        server.shutdown().await;
    }

    #[test]
    fn selection_keeps_last_part_per_category() {
        let part = |id: &str| Component {
            id: id.to_string(),
            name: id.to_string(),
            category: Category::Cpu,
            brand: String::new(),
            specs: Default::default(),
        };
        let selection = selection_from(vec![part("cpu-1"), part("cpu-2")]);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.get(Category::Cpu).map(|c| c.id.as_str()), Some("cpu-2"));
    }

    #[test]
    fn repeated_id_keeps_the_part_selected() {
        let cpu = Component {
            id: "cpu-1".to_string(),
            name: "cpu-1".to_string(),
            category: Category::Cpu,
            brand: String::new(),
            specs: Default::default(),
        };
        let selection = selection_from(vec![cpu.clone(), cpu]);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.get(Category::Cpu).map(|c| c.id.as_str()), Some("cpu-1"));
    }

    #[test]
    fn all_brands_flag_narrows_nothing() {
        for value in ["all", "All Brands", "  "] {
            assert_eq!(filter_state(None, Some(value)).narrowing().brand, None);
        }
        let narrowing = filter_state(Some(UseCase::Gaming), Some(" AMD ")).narrowing();
        assert_eq!(narrowing.brand.as_deref(), Some("AMD"));
        assert_eq!(narrowing.usecase, Some(UseCase::Gaming));
        assert_eq!(filter_state(Some(UseCase::All), None).narrowing().usecase, None);
    }

    #[tokio::test]
    async fn compatible_omits_all_brands_from_body() {
        let mut server = mockito::Server::new_async().await;
        let literal = server
            .mock("POST", "/config/compatible")
            .match_body(mockito::Matcher::Regex(r#""brand""#.to_string()))
            .expect(0)
            .create_async()
            .await;
        let plain = server
            .mock("POST", "/config/compatible")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"category":"motherboard"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let config = Config {
            api_url: server.url(),
            ..Config::default()
        };
        compatible(
            &config,
            Category::Motherboard,
            vec![],
            None,
            Some("all brands".to_string()),
        )
        .await
        .unwrap();

        literal.assert_async().await;
        plain.assert_async().await;
    }
}
