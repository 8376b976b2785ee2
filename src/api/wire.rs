//! Request and response bodies that only exist on the wire

use crate::catalog::{Component, ComponentRef, UseCaseBuild};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

/// Bearer token pair issued by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_at: Option<DateTime<Utc>>,
    /// Account the token was issued to; filled in locally after login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthToken {
    /// Whether the access token is known to be past its expiry
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenEnvelope {
    pub token: AuthToken,
}

/// Profile returned by `GET /auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: serde_json::Value,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct BrandsEnvelope {
    #[serde(default)]
    pub brands: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UseCaseEnvelope {
    #[serde(default)]
    pub components: Vec<UseCaseBuild>,
}

/// Body for creating or updating a saved build
#[derive(Debug, Serialize)]
pub(crate) struct BuildRequest<'a> {
    pub name: &'a str,
    pub components: &'a [ComponentRef],
}

/// Backends answer a list endpoint with `null` when nothing matched
pub(crate) fn list_or_empty(list: Option<Vec<Component>>) -> Vec<Component> {
    list.unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscribeRequest<'a> {
    pub component_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnreadCount {
    #[serde(default)]
    pub unread: u64,
}

/// `GET /subscriptions/status` maps component id -> subscribed
pub type SubscriptionStatus = HashMap<String, bool>;
