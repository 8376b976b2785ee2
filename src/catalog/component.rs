//! Read-only catalog data returned by the backend
//!
//! The client never mutates these. Field names follow the backend's JSON,
//! which mixes camelCase and Go-style PascalCase depending on the service.

use super::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A hardware component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub brand: String,
    /// Specification key -> value. Numbers and booleans are stringified on decode.
    #[serde(default, deserialize_with = "deserialize_specs")]
    pub specs: BTreeMap<String, String>,
}

impl Component {
    /// Look up a specification value
    pub fn spec(&self, key: &str) -> Option<&str> {
        self.specs.get(key).map(String::as_str)
    }

    /// Comma-joined spec values for one-line card display
    pub fn spec_summary(&self) -> String {
        self.specs
            .values()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Accept any JSON scalar as a spec value
fn deserialize_specs<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => return None,
                other => other.to_string(),
            };
            Some((k, value))
        })
        .collect())
}

/// A shop listing for a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub shop_name: String,
    pub price: f64,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub url: String,
}

/// Response of `GET /offers/min`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinPrice {
    #[serde(default)]
    pub min_price: Option<f64>,
}

/// A price-change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub component_id: String,
    /// Numeric on the notifications service
    #[serde(default, deserialize_with = "string_or_number")]
    pub shop_id: String,
    #[serde(default)]
    pub old_price: f64,
    #[serde(default)]
    pub new_price: f64,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// One-line description for lists
    pub fn headline(&self) -> String {
        let direction = if self.new_price < self.old_price {
            "dropped"
        } else {
            "changed"
        };
        format!(
            "{} price {} {:.0} -> {:.0} ({})",
            self.component_id, direction, self.old_price, self.new_price, self.shop_id
        )
    }
}

/// Ids arrive as JSON numbers from the config service and as strings elsewhere
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// A saved build ("configuration") owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBuild {
    #[serde(rename = "ID", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "OwnerId", default, deserialize_with = "string_or_number")]
    pub owner_id: String,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Use-case metadata from `GET /config/usecases`
///
/// Older backends return bare strings, newer ones objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UseCaseInfo {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl UseCaseInfo {
    pub fn name(&self) -> &str {
        match self {
            UseCaseInfo::Name(name) => name,
            UseCaseInfo::Detailed { name, .. } => name,
        }
    }
}

/// A curated build for a use case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseBuild {
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_specs_are_stringified() {
        let json = r#"{
            "id": "cpu-1",
            "name": "AMD Ryzen 9 7950X",
            "category": "cpu",
            "brand": "AMD",
            "specs": {"cores": 16, "socket": "AM5", "unlocked": true, "note": null}
        }"#;
        let c: Component = serde_json::from_str(json).unwrap();
        assert_eq!(c.spec("cores"), Some("16"));
        assert_eq!(c.spec("socket"), Some("AM5"));
        assert_eq!(c.spec("unlocked"), Some("true"));
        assert_eq!(c.spec("note"), None);
    }

    #[test]
    fn missing_brand_and_specs_default_to_empty() {
        let c: Component =
            serde_json::from_str(r#"{"id":"x","name":"X","category":"ram"}"#).unwrap();
        assert!(c.brand.is_empty());
        assert!(c.specs.is_empty());
    }

    #[test]
    fn saved_build_uses_backend_field_names() {
        let json = r#"{
            "ID": 42, "Name": "Workstation", "OwnerId": 7,
            "components": [], "CreatedAt": "2024-05-01T10:00:00Z", "UpdatedAt": "2024-05-01T10:00:00Z"
        }"#;
        let build: SavedBuild = serde_json::from_str(json).unwrap();
        assert_eq!(build.id, "42");
        assert_eq!(build.name, "Workstation");
        assert_eq!(build.owner_id, "7");
        assert!(build.created_at.is_some());
    }

    #[test]
    fn usecase_info_accepts_strings_and_objects() {
        let list: Vec<UseCaseInfo> =
            serde_json::from_str(r#"["office", {"name": "gaming", "description": "Games"}]"#)
                .unwrap();
        assert_eq!(list[0].name(), "office");
        assert_eq!(list[1].name(), "gaming");
    }

    #[test]
    fn notification_accepts_numeric_ids() {
        let json = r#"[{
            "id": 11, "componentId": "cpu-1", "shopId": 3,
            "oldPrice": 30000, "newPrice": 28500, "isRead": false,
            "createdAt": "2024-05-01T10:00:00Z"
        }]"#;
        let list: Vec<Notification> = serde_json::from_str(json).unwrap();
        assert_eq!(list[0].id, "11");
        assert_eq!(list[0].shop_id, "3");
        assert!(list[0].headline().contains("dropped"));
    }
}
