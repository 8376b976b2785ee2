//! Compatibility query builder

use crate::catalog::{Category, Narrowing, Selection, UseCase};
use serde::{Deserialize, Serialize};

/// One already-chosen component, described by its compatibility key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityBase {
    pub category: Category,
    /// Display name, or the category's key attribute (CPU socket)
    #[serde(rename = "name")]
    pub key: String,
}

/// Body of `POST /config/compatible`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRequest {
    pub category: Category,
    pub bases: Vec<CompatibilityBase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usecase: Option<UseCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

/// Whether the list shows only compatible parts or the whole category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListMode {
    #[default]
    Compatible,
    All,
}

impl ListMode {
    pub fn toggle(self) -> Self {
        match self {
            ListMode::Compatible => ListMode::All,
            ListMode::All => ListMode::Compatible,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListMode::Compatible => "compatible only",
            ListMode::All => "all parts",
        }
    }
}

/// A list query for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentQuery {
    Compatible(CompatibilityRequest),
    All {
        category: Category,
        narrowing: Narrowing,
    },
}

impl ComponentQuery {
    pub fn category(&self) -> Category {
        match self {
            ComponentQuery::Compatible(request) => request.category,
            ComponentQuery::All { category, .. } => *category,
        }
    }
}

/// Build the compatibility request for `target`.
///
/// Every selected component except the one in `target` itself becomes a
/// base. A category that declares a key attribute submits that spec value;
/// a component missing the attribute falls back to its name.
pub fn build_compatibility_request(
    target: Category,
    selection: &Selection,
    narrowing: &Narrowing,
) -> CompatibilityRequest {
    let bases = selection
        .iter()
        .filter(|(category, _)| *category != target)
        .map(|(category, component)| {
            let key = category
                .compatibility_key_spec()
                .and_then(|spec| component.spec(spec))
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(component.name.as_str());
            CompatibilityBase {
                category,
                key: key.to_string(),
            }
        })
        .collect();

    CompatibilityRequest {
        category: target,
        bases,
        usecase: narrowing.usecase,
        brand: narrowing.brand.clone(),
    }
}

/// Query for the current view
pub fn build_query(
    target: Category,
    mode: ListMode,
    selection: &Selection,
    narrowing: &Narrowing,
) -> ComponentQuery {
    match mode {
        ListMode::Compatible => {
            ComponentQuery::Compatible(build_compatibility_request(target, selection, narrowing))
        }
        ListMode::All => ComponentQuery::All {
            category: target,
            narrowing: narrowing.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Component;
    use std::collections::BTreeMap;

    fn comp(id: &str, name: &str, category: Category, specs: &[(&str, &str)]) -> Component {
        Component {
            id: id.to_string(),
            name: name.to_string(),
            category,
            brand: String::new(),
            specs: specs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn ryzen() -> Component {
        comp(
            "cpu-1",
            "AMD Ryzen 9 7950X",
            Category::Cpu,
            &[("socket", "AM5"), ("cores", "16")],
        )
    }

    #[test]
    fn cpu_base_uses_socket_not_name() {
        let mut selection = Selection::new();
        selection.select(ryzen());

        let request =
            build_compatibility_request(Category::Motherboard, &selection, &Narrowing::default());
        assert_eq!(
            request.bases,
            vec![CompatibilityBase {
                category: Category::Cpu,
                key: "AM5".into()
            }]
        );
    }

    #[test]
    fn other_categories_use_name() {
        let mut selection = Selection::new();
        selection.select(comp(
            "mb-1",
            "ASUS ROG STRIX B650E-F",
            Category::Motherboard,
            &[("form_factor", "ATX")],
        ));
        let request = build_compatibility_request(Category::Case, &selection, &Narrowing::default());
        assert_eq!(request.bases[0].key, "ASUS ROG STRIX B650E-F");
    }

    #[test]
    fn cpu_without_socket_falls_back_to_name() {
        let mut selection = Selection::new();
        selection.select(comp("cpu-9", "Mystery CPU", Category::Cpu, &[]));
        let request =
            build_compatibility_request(Category::Motherboard, &selection, &Narrowing::default());
        assert_eq!(request.bases[0].key, "Mystery CPU");
    }

    #[test]
    fn target_category_is_excluded() {
        let mut selection = Selection::new();
        selection.select(ryzen());
        selection.select(comp("ram-1", "32GB DDR5", Category::Ram, &[]));

        let request = build_compatibility_request(Category::Cpu, &selection, &Narrowing::default());
        assert_eq!(request.bases.len(), 1);
        assert_eq!(request.bases[0].category, Category::Ram);
    }

    #[test]
    fn wire_shape_omits_all_filters() {
        let mut selection = Selection::new();
        selection.select(ryzen());
        let request =
            build_compatibility_request(Category::Motherboard, &selection, &Narrowing::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "category": "motherboard",
                "bases": [{"category": "cpu", "name": "AM5"}]
            })
        );

        let narrowing = Narrowing {
            usecase: Some(UseCase::Gaming),
            brand: Some("ASUS".into()),
        };
        let json = serde_json::to_value(build_compatibility_request(
            Category::Motherboard,
            &selection,
            &narrowing,
        ))
        .unwrap();
        assert_eq!(json["usecase"], "gaming");
        assert_eq!(json["brand"], "ASUS");
    }

    #[test]
    fn all_mode_carries_no_bases() {
        let mut selection = Selection::new();
        selection.select(ryzen());
        let query = build_query(
            Category::Motherboard,
            ListMode::All,
            &selection,
            &Narrowing::default(),
        );
        assert_eq!(
            query,
            ComponentQuery::All {
                category: Category::Motherboard,
                narrowing: Narrowing::default()
            }
        );
    }
}
