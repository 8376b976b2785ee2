//! Route handlers for the demo backend

use super::catalog::{usecase_descriptions, Listing, DEMO_EMAIL, DEMO_NAME, DEMO_PASSWORD, SHOPS};
use super::rules::{is_compatible, ResolvedBases};
use crate::api::AuthToken;
use crate::catalog::{
    Category, Component, ComponentRef, Notification, Offer, SavedBuild, UseCase, UseCaseBuild,
};
use crate::workflow::{CompatibilityBase, CompatibilityRequest};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Most ids accepted by `/subscriptions/status`
const MAX_STATUS_IDS: usize = 200;

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Account {
    id: u64,
    password: String,
    name: String,
}

/// Everything the demo backend remembers
#[derive(Debug)]
pub struct DemoData {
    listings: Vec<Listing>,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    subscriptions: HashMap<String, HashSet<String>>,
    notifications: HashMap<String, Vec<Notification>>,
    builds: BTreeMap<u64, SavedBuild>,
    next_id: u64,
}

pub type DemoState = Arc<Mutex<DemoData>>;

impl DemoData {
    pub fn seeded() -> Self {
        let mut data = Self {
            listings: super::catalog::seed_listings(),
            accounts: HashMap::new(),
            tokens: HashMap::new(),
            subscriptions: HashMap::new(),
            notifications: HashMap::new(),
            builds: BTreeMap::new(),
            next_id: 1,
        };
        let id = data.next_id();
        data.accounts.insert(
            DEMO_EMAIL.to_string(),
            Account {
                id,
                password: DEMO_PASSWORD.to_string(),
                name: DEMO_NAME.to_string(),
            },
        );
        // A couple of unread alerts so the badge has something to show
        data.subscribe(DEMO_EMAIL, "gpu-1");
        data.subscribe(DEMO_EMAIL, "ssd-1");
        data
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn listing(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|l| l.component.id == id)
    }

    fn issue_token(&mut self, email: &str) -> AuthToken {
        let access_token = format!("demo-{}", random_hex());
        self.tokens.insert(access_token.clone(), email.to_string());
        let now = Utc::now();
        AuthToken {
            access_token,
            expires_at: Some(now + ChronoDuration::hours(24)),
            refresh_token: Some(format!("refresh-{}", random_hex())),
            refresh_expires_at: Some(now + ChronoDuration::days(30)),
            email: None,
        }
    }

    fn user(&self, headers: &HeaderMap) -> Result<String, DemoError> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .ok_or_else(|| DemoError::Unauthorized("missing bearer token".into()))?;
        self.tokens
            .get(token.trim())
            .cloned()
            .ok_or_else(|| DemoError::Unauthorized("invalid or expired token".into()))
    }

    /// Subscribe and emit a price-drop notification for the component
    fn subscribe(&mut self, email: &str, component_id: &str) {
        let newly = self
            .subscriptions
            .entry(email.to_string())
            .or_default()
            .insert(component_id.to_string());
        if !newly {
            return;
        }
        let Some(old_price) = self.listing(component_id).map(min_offer) else {
            return;
        };
        let id = self.next_id();
        self.notifications
            .entry(email.to_string())
            .or_default()
            .push(Notification {
                id: id.to_string(),
                component_id: component_id.to_string(),
                shop_id: SHOPS[0].to_string(),
                old_price,
                new_price: (old_price * 0.95).round(),
                is_read: false,
                created_at: Utc::now(),
            });
    }

    fn resolve_refs(&self, refs: &[ComponentRef]) -> Result<Vec<Component>, DemoError> {
        refs.iter()
            .map(|r| {
                self.listings
                    .iter()
                    .find(|l| l.component.category == r.category && l.component.name == r.name)
                    .map(|l| l.component.clone())
                    .ok_or_else(|| {
                        DemoError::BadRequest(format!("unknown {} '{}'", r.category, r.name))
                    })
            })
            .collect()
    }
}

fn lock(state: &DemoState) -> Result<MutexGuard<'_, DemoData>, DemoError> {
    state
        .lock()
        .map_err(|_| DemoError::Internal("state lock poisoned".into()))
}

fn random_hex() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let a = RandomState::new().build_hasher().finish();
    let b = RandomState::new().build_hasher().finish();
    format!("{:016x}{:016x}", a, b)
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error responses, rendered as `{"error": message}`
#[derive(Debug)]
pub enum DemoError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for DemoError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            DemoError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            DemoError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            DemoError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            DemoError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            DemoError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            DemoError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::debug!("Demo API error: {} - {}", status, message);

        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn parse_category(raw: Option<&str>) -> Result<Category, DemoError> {
    let raw = raw.ok_or_else(|| DemoError::BadRequest("category is required".into()))?;
    raw.parse()
        .map_err(|e: crate::catalog::UnknownCategory| DemoError::BadRequest(e.to_string()))
}

fn parse_usecase(raw: Option<&str>) -> Result<UseCase, DemoError> {
    match raw {
        None | Some("") => Ok(UseCase::All),
        Some(value) => value.parse().map_err(DemoError::BadRequest),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ComponentsQuery {
    category: Option<String>,
    usecase: Option<String>,
    brand: Option<String>,
    search: Option<String>,
}

fn matches_narrowing(listing: &Listing, usecase: UseCase, brand: Option<&str>) -> bool {
    listing.fits(usecase)
        && brand.map_or(true, |b| listing.component.brand.eq_ignore_ascii_case(b))
}

pub async fn get_components(
    State(state): State<DemoState>,
    Query(query): Query<ComponentsQuery>,
) -> Result<Json<Vec<Component>>, DemoError> {
    let category = parse_category(query.category.as_deref())?;
    let usecase = parse_usecase(query.usecase.as_deref())?;
    let search = query.search.unwrap_or_default().to_lowercase();
    let data = lock(&state)?;

    let list = data
        .listings
        .iter()
        .filter(|l| l.component.category == category)
        .filter(|l| matches_narrowing(l, usecase, query.brand.as_deref()))
        .filter(|l| search.is_empty() || l.component.name.to_lowercase().contains(&search))
        .map(|l| l.component.clone())
        .collect();
    Ok(Json(list))
}

pub async fn post_compatible(
    State(state): State<DemoState>,
    Json(request): Json<CompatibilityRequest>,
) -> Result<Json<Vec<Component>>, DemoError> {
    let data = lock(&state)?;
    let usecase = request.usecase.unwrap_or_default();
    let resolved = ResolvedBases::resolve(&request.bases, &data.listings);

    let list = data
        .listings
        .iter()
        .filter(|l| l.component.category == request.category)
        .filter(|l| matches_narrowing(l, usecase, request.brand.as_deref()))
        .filter(|l| is_compatible(&l.component, &resolved))
        .map(|l| l.component.clone())
        .collect();
    Ok(Json(list))
}

#[derive(Debug, Deserialize)]
pub struct BrandsQuery {
    category: Option<String>,
}

pub async fn get_brands(
    State(state): State<DemoState>,
    Query(query): Query<BrandsQuery>,
) -> Result<Json<Value>, DemoError> {
    let category = parse_category(query.category.as_deref())?;
    let data = lock(&state)?;
    let mut brands: Vec<String> = data
        .listings
        .iter()
        .filter(|l| l.component.category == category)
        .map(|l| l.component.brand.clone())
        .collect();
    brands.sort();
    brands.dedup();
    Ok(Json(json!({ "brands": brands })))
}

pub async fn get_usecases() -> Json<Value> {
    let list: Vec<Value> = usecase_descriptions()
        .into_iter()
        .map(|(usecase, description)| json!({ "name": usecase.as_str(), "description": description }))
        .collect();
    Json(Value::Array(list))
}

/// One curated build: for each category, the cheapest part for the use
/// case that works with what was already picked
pub async fn get_usecase_build(
    State(state): State<DemoState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, DemoError> {
    let usecase: UseCase = name
        .parse()
        .map_err(|_| DemoError::NotFound(format!("use case '{name}' not found")))?;
    let data = lock(&state)?;

    let mut picked: Vec<Component> = Vec::new();
    for category in Category::ALL {
        let bases: Vec<CompatibilityBase> = picked
            .iter()
            .map(|c| CompatibilityBase {
                category: c.category,
                key: c.name.clone(),
            })
            .collect();
        let resolved = ResolvedBases::resolve(&bases, &data.listings);
        let best = data
            .listings
            .iter()
            .filter(|l| l.component.category == category && l.fits(usecase))
            .filter(|l| is_compatible(&l.component, &resolved))
            .min_by(|a, b| a.base_price.total_cmp(&b.base_price));
        if let Some(listing) = best {
            picked.push(listing.component.clone());
        }
    }

    let build = UseCaseBuild {
        name: format!("{} build", usecase.label()),
        components: picked,
    };
    Ok(Json(json!({ "components": [build] })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Offers
// ─────────────────────────────────────────────────────────────────────────────

/// Shop quotes spread around the reference price
fn offers_for(listing: &Listing) -> Vec<Offer> {
    SHOPS
        .iter()
        .enumerate()
        .map(|(i, shop)| Offer {
            shop_name: shop.to_string(),
            price: (listing.base_price * (0.98 + 0.03 * i as f64)).round(),
            availability: if i == 2 { "2-3 days" } else { "in stock" }.to_string(),
            url: format!(
                "https://{}.example/product/{}",
                shop.to_lowercase(),
                listing.component.id
            ),
        })
        .collect()
}

fn min_offer(listing: &Listing) -> f64 {
    offers_for(listing)
        .iter()
        .map(|o| o.price)
        .fold(f64::INFINITY, f64::min)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffersQuery {
    component_id: Option<String>,
    sort: Option<String>,
}

pub async fn get_min_price(
    State(state): State<DemoState>,
    Query(query): Query<OffersQuery>,
) -> Result<Json<Value>, DemoError> {
    let id = query
        .component_id
        .ok_or_else(|| DemoError::BadRequest("componentId is required".into()))?;
    let data = lock(&state)?;
    let min = data.listing(&id).map(min_offer);
    Ok(Json(json!({ "minPrice": min })))
}

pub async fn get_offers(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Query(query): Query<OffersQuery>,
) -> Result<Json<Vec<Offer>>, DemoError> {
    let data = lock(&state)?;
    data.user(&headers)?;
    let id = query
        .component_id
        .ok_or_else(|| DemoError::BadRequest("componentId is required".into()))?;
    let listing = data
        .listing(&id)
        .ok_or_else(|| DemoError::NotFound(format!("component '{id}' not found")))?;

    let mut offers = offers_for(listing);
    match query.sort.as_deref() {
        Some("priceDesc") => offers.sort_by(|a, b| b.price.total_cmp(&a.price)),
        _ => offers.sort_by(|a, b| a.price.total_cmp(&b.price)),
    }
    Ok(Json(offers))
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscriptions & notifications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeBody {
    component_id: String,
}

pub async fn post_subscription(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Json(body): Json<SubscribeBody>,
) -> Result<(StatusCode, Json<Value>), DemoError> {
    let mut data = lock(&state)?;
    let email = data.user(&headers)?;
    if data.listing(&body.component_id).is_none() {
        return Err(DemoError::NotFound(format!(
            "component '{}' not found",
            body.component_id
        )));
    }
    data.subscribe(&email, &body.component_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "componentId": body.component_id, "subscribed": true })),
    ))
}

pub async fn delete_subscription(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Path(component_id): Path<String>,
) -> Result<StatusCode, DemoError> {
    let mut data = lock(&state)?;
    let email = data.user(&headers)?;
    if let Some(set) = data.subscriptions.get_mut(&email) {
        set.remove(&component_id);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    ids: Option<String>,
}

pub async fn get_subscription_status(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Result<Json<HashMap<String, bool>>, DemoError> {
    let data = lock(&state)?;
    let email = data.user(&headers)?;
    let raw = query
        .ids
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| DemoError::BadRequest("ids query param required".into()))?;
    let ids: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    if ids.len() > MAX_STATUS_IDS {
        return Err(DemoError::BadRequest(format!(
            "too many ids (max {MAX_STATUS_IDS})"
        )));
    }

    let subscribed = data.subscriptions.get(&email);
    let status = ids
        .into_iter()
        .map(|id| (id.to_string(), subscribed.is_some_and(|s| s.contains(id))))
        .collect();
    Ok(Json(status))
}

pub async fn get_notifications(
    State(state): State<DemoState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, DemoError> {
    let data = lock(&state)?;
    let email = data.user(&headers)?;
    let mut list = data.notifications.get(&email).cloned().unwrap_or_default();
    list.reverse();
    Ok(Json(list))
}

pub async fn get_unread_count(
    State(state): State<DemoState>,
    headers: HeaderMap,
) -> Result<Json<Value>, DemoError> {
    let data = lock(&state)?;
    let email = data.user(&headers)?;
    let unread = data
        .notifications
        .get(&email)
        .map_or(0, |list| list.iter().filter(|n| !n.is_read).count());
    Ok(Json(json!({ "unread": unread })))
}

pub async fn post_mark_read(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, DemoError> {
    let mut data = lock(&state)?;
    let email = data.user(&headers)?;
    let notification = data
        .notifications
        .get_mut(&email)
        .and_then(|list| list.iter_mut().find(|n| n.id == id))
        .ok_or_else(|| DemoError::NotFound(format!("notification '{id}' not found")))?;
    notification.is_read = true;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
    #[serde(default)]
    name: Option<String>,
}

pub async fn post_login(
    State(state): State<DemoState>,
    Json(body): Json<Credentials>,
) -> Result<Json<Value>, DemoError> {
    let mut data = lock(&state)?;
    let valid = data
        .accounts
        .get(&body.email)
        .is_some_and(|a| a.password == body.password);
    if !valid {
        return Err(DemoError::Unauthorized("invalid credentials".into()));
    }
    let token = data.issue_token(&body.email);
    Ok(Json(json!({ "token": token })))
}

pub async fn post_register(
    State(state): State<DemoState>,
    Json(body): Json<Credentials>,
) -> Result<Json<Value>, DemoError> {
    let name = body.name.unwrap_or_default();
    crate::api::validate_registration(&body.email, &body.password, &name)
        .map_err(DemoError::BadRequest)?;

    let mut data = lock(&state)?;
    if data.accounts.contains_key(&body.email) {
        return Err(DemoError::Conflict("user already exists".into()));
    }
    let id = data.next_id();
    data.accounts.insert(
        body.email.clone(),
        Account {
            id,
            password: body.password,
            name: name.clone(),
        },
    );
    let token = data.issue_token(&body.email);
    Ok(Json(json!({
        "user": { "id": id, "email": body.email, "name": name },
        "token": token,
    })))
}

pub async fn get_me(
    State(state): State<DemoState>,
    headers: HeaderMap,
) -> Result<Json<Value>, DemoError> {
    let data = lock(&state)?;
    let email = data.user(&headers)?;
    let account = data
        .accounts
        .get(&email)
        .ok_or_else(|| DemoError::NotFound("user not found".into()))?;
    Ok(Json(json!({ "id": account.id, "email": email, "name": account.name })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Saved builds
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BuildBody {
    name: String,
    #[serde(default)]
    components: Vec<ComponentRef>,
}

pub async fn post_build(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Json(body): Json<BuildBody>,
) -> Result<(StatusCode, Json<SavedBuild>), DemoError> {
    let mut data = lock(&state)?;
    let email = data.user(&headers)?;
    if body.name.trim().is_empty() {
        return Err(DemoError::BadRequest("name is required".into()));
    }
    let components = data.resolve_refs(&body.components)?;
    let id = data.next_id();
    let now = Utc::now();
    let build = SavedBuild {
        id: id.to_string(),
        name: body.name,
        owner_id: email,
        components,
        created_at: Some(now),
        updated_at: Some(now),
    };
    data.builds.insert(id, build.clone());
    Ok((StatusCode::CREATED, Json(build)))
}

pub async fn get_user_builds(
    State(state): State<DemoState>,
    headers: HeaderMap,
) -> Result<Json<Vec<SavedBuild>>, DemoError> {
    let data = lock(&state)?;
    let email = data.user(&headers)?;
    let list = data
        .builds
        .values()
        .filter(|b| b.owner_id == email)
        .cloned()
        .collect();
    Ok(Json(list))
}

fn owned_build_id(data: &DemoData, email: &str, raw: &str) -> Result<u64, DemoError> {
    let id: u64 = raw
        .parse()
        .map_err(|_| DemoError::NotFound("configuration not found".into()))?;
    match data.builds.get(&id) {
        None => Err(DemoError::NotFound("configuration not found".into())),
        Some(b) if b.owner_id != email => Err(DemoError::Forbidden("forbidden".into())),
        Some(_) => Ok(id),
    }
}

pub async fn put_build(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Json(body): Json<BuildBody>,
) -> Result<Json<SavedBuild>, DemoError> {
    let mut data = lock(&state)?;
    let email = data.user(&headers)?;
    let id = owned_build_id(&data, &email, &raw_id)?;
    let components = data.resolve_refs(&body.components)?;
    let build = data
        .builds
        .get_mut(&id)
        .ok_or_else(|| DemoError::NotFound("configuration not found".into()))?;
    build.name = body.name;
    build.components = components;
    build.updated_at = Some(Utc::now());
    Ok(Json(build.clone()))
}

pub async fn delete_build(
    State(state): State<DemoState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, DemoError> {
    let mut data = lock(&state)?;
    let email = data.user(&headers)?;
    let id = owned_build_id(&data, &email, &raw_id)?;
    data.builds.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}
