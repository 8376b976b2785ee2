//! Filter state and client-side search/sort
//!
//! Use-case and brand narrow the query server-side. Search text and sort
//! order are applied locally to whatever list came back.

use super::{Component, PriceCache};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Curated intended-purpose tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UseCase {
    #[default]
    All,
    Office,
    Htpc,
    Gaming,
    Streamer,
    Design,
    Video,
    Cad,
    Dev,
    Enthusiast,
    Nas,
}

impl UseCase {
    pub const ALL: [UseCase; 11] = [
        UseCase::All,
        UseCase::Office,
        UseCase::Htpc,
        UseCase::Gaming,
        UseCase::Streamer,
        UseCase::Design,
        UseCase::Video,
        UseCase::Cad,
        UseCase::Dev,
        UseCase::Enthusiast,
        UseCase::Nas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::All => "all",
            UseCase::Office => "office",
            UseCase::Htpc => "htpc",
            UseCase::Gaming => "gaming",
            UseCase::Streamer => "streamer",
            UseCase::Design => "design",
            UseCase::Video => "video",
            UseCase::Cad => "cad",
            UseCase::Dev => "dev",
            UseCase::Enthusiast => "enthusiast",
            UseCase::Nas => "nas",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UseCase::All => "All use cases",
            UseCase::Office => "Office",
            UseCase::Htpc => "Home theater",
            UseCase::Gaming => "Gaming",
            UseCase::Streamer => "Streaming",
            UseCase::Design => "Graphic design",
            UseCase::Video => "Video editing",
            UseCase::Cad => "CAD / 3D",
            UseCase::Dev => "Development",
            UseCase::Enthusiast => "Enthusiast",
            UseCase::Nas => "Home server / NAS",
        }
    }

    /// Cycle to the next tag (wraps)
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|u| *u == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|u| u.as_str() == needle)
            .ok_or_else(|| format!("unknown use case '{s}'"))
    }
}

impl Serialize for UseCase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UseCase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Active brand narrowing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BrandFilter {
    #[default]
    All,
    Brand(String),
}

impl BrandFilter {
    /// Label shown for the unfiltered option
    pub const ALL_LABEL: &'static str = "all brands";

    /// Parse a user-facing value; "all"/"all brands"/"" mean no narrowing
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("all")
            || trimmed.eq_ignore_ascii_case(Self::ALL_LABEL)
        {
            BrandFilter::All
        } else {
            BrandFilter::Brand(trimmed.to_string())
        }
    }

    pub fn as_option(&self) -> Option<&str> {
        match self {
            BrandFilter::All => None,
            BrandFilter::Brand(b) => Some(b),
        }
    }
}

impl fmt::Display for BrandFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrandFilter::All => f.write_str(Self::ALL_LABEL),
            BrandFilter::Brand(b) => f.write_str(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    None,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub fn next(self) -> Self {
        match self {
            SortOrder::None => SortOrder::PriceAsc,
            SortOrder::PriceAsc => SortOrder::PriceDesc,
            SortOrder::PriceDesc => SortOrder::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::None => "unsorted",
            SortOrder::PriceAsc => "price ↑",
            SortOrder::PriceDesc => "price ↓",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(SortOrder::None),
            "asc" | "priceasc" => Ok(SortOrder::PriceAsc),
            "desc" | "pricedesc" => Ok(SortOrder::PriceDesc),
            other => Err(format!("unknown sort order '{other}' (expected asc, desc, none)")),
        }
    }
}

/// Transient filters for the active category
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub usecase: UseCase,
    pub brand: BrandFilter,
    pub search: String,
    pub sort: SortOrder,
}

impl FilterState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Server-side part of the filters
    pub fn narrowing(&self) -> Narrowing {
        Narrowing {
            usecase: match self.usecase {
                UseCase::All => None,
                other => Some(other),
            },
            brand: self.brand.as_option().map(str::to_string),
        }
    }
}

/// Optional narrowing passed through to the backend. `None` is omitted from
/// the request rather than sent as "all".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Narrowing {
    pub usecase: Option<UseCase>,
    pub brand: Option<String>,
}

/// Apply search text and price ordering to a fetched list.
///
/// Pure: the same inputs always produce the same output. Components without
/// a cached price order as 0, so they lead an ascending sort.
pub fn filter_and_sort(
    list: &[Component],
    search: &str,
    sort: SortOrder,
    prices: &PriceCache,
) -> Vec<Component> {
    let needle = search.trim().to_lowercase();
    let mut out: Vec<Component> = list
        .iter()
        .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    match sort {
        SortOrder::None => {}
        SortOrder::PriceAsc => out.sort_by(|a, b| {
            prices
                .price_or_zero(&a.id)
                .total_cmp(&prices.price_or_zero(&b.id))
        }),
        SortOrder::PriceDesc => out.sort_by(|a, b| {
            prices
                .price_or_zero(&b.id)
                .total_cmp(&prices.price_or_zero(&a.id))
        }),
    }

    out
}
