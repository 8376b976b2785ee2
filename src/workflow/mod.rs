//! Selection & compatibility workflow
//!
//! Owns the active category, filters, selection, price cache and fetched
//! lists. Fetches are tagged with a generation number; only the result of
//! the most recently issued fetch is applied, so a slow response for a view
//! the user already left can't overwrite the current one.

mod query;

pub use query::{
    build_compatibility_request, build_query, CompatibilityBase, CompatibilityRequest,
    ComponentQuery, ListMode,
};

use crate::api::{ApiClient, ApiError};
use crate::catalog::{
    filter_and_sort, BrandFilter, Category, Component, FilterState, Narrowing, PriceCache,
    SelectOutcome, Selection, SortOrder, UseCase,
};
use std::collections::HashMap;

/// A fetch handed out by [`Workflow::begin_fetch`]
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub generation: u64,
    pub query: ComponentQuery,
}

/// Last failed fetch for the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub message: String,
    pub retryable: bool,
}

impl From<&ApiError> for FetchError {
    fn from(e: &ApiError) -> Self {
        Self {
            message: e.user_message(),
            retryable: e.is_retryable(),
        }
    }
}

/// What a cached list was fetched for
#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewKey {
    category: Category,
    mode: ListMode,
    narrowing: Narrowing,
    revision: u64,
}

#[derive(Debug, Clone)]
struct InFlight {
    generation: u64,
    key: ViewKey,
}

#[derive(Debug, Default)]
pub struct Workflow {
    category: Category,
    filters: FilterState,
    selection: Selection,
    prices: PriceCache,
    mode: ListMode,
    results: HashMap<(Category, ListMode), (ViewKey, Vec<Component>)>,
    generation: u64,
    in_flight: Option<InFlight>,
    error: Option<FetchError>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn prices(&self) -> &PriceCache {
        &self.prices
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| f.key == self.current_key())
    }

    fn current_key(&self) -> ViewKey {
        ViewKey {
            category: self.category,
            mode: self.mode,
            narrowing: self.filters.narrowing(),
            revision: self.selection.revision(),
        }
    }

    /// Fetched list for the current view, if it is still valid
    fn cached(&self) -> Option<&[Component]> {
        let key = self.current_key();
        self.results
            .get(&(self.category, self.mode))
            .filter(|(cached_key, _)| *cached_key == key)
            .map(|(_, list)| list.as_slice())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Category & filters
    // ─────────────────────────────────────────────────────────────────────────

    /// Switch the active category. Filters reset to defaults on a change.
    /// Re-selecting the current category clears a failed fetch so it can be
    /// retried.
    pub fn set_category(&mut self, category: Category) -> bool {
        self.error = None;
        if category == self.category {
            return false;
        }
        tracing::debug!(from = %self.category, to = %category, "Category changed");
        self.category = category;
        self.filters.reset();
        true
    }

    pub fn set_usecase(&mut self, usecase: UseCase) {
        if self.filters.usecase != usecase {
            self.filters.usecase = usecase;
            self.invalidate();
        }
    }

    pub fn set_brand(&mut self, brand: BrandFilter) {
        if self.filters.brand != brand {
            self.filters.brand = brand;
            self.invalidate();
        }
    }

    /// Client-side only; never refetches
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filters.search = search.into();
    }

    /// Client-side only; never refetches
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.filters.sort = sort;
    }

    pub fn set_mode(&mut self, mode: ListMode) {
        if self.mode != mode {
            self.mode = mode;
            self.error = None;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn select(&mut self, component: Component) -> SelectOutcome {
        let outcome = self.selection.select(component);
        self.invalidate();
        outcome
    }

    pub fn remove(&mut self, category: Category) -> Option<Component> {
        let removed = self.selection.remove(category);
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    /// Replace the selection with a saved or curated build
    pub fn load_build(&mut self, components: impl IntoIterator<Item = Component>) {
        self.selection.clear();
        for component in components {
            if !self.selection.contains(&component) {
                self.selection.select(component);
            }
        }
        self.invalidate();
    }

    pub fn record_price(&mut self, id: &str, price: Option<f64>) {
        self.prices.record(id, price);
    }

    /// Total of the selected parts, `None` until every price is known
    pub fn total(&self) -> Option<f64> {
        self.prices.total_for(self.selection.components())
    }

    /// Drop every fetched list; the base set or narrowing changed
    fn invalidate(&mut self) {
        self.results.clear();
        self.error = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fetching
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the current view has no list and none is on its way
    pub fn needs_fetch(&self) -> bool {
        self.cached().is_none() && !self.is_loading() && self.error.is_none()
    }

    /// Issue a new fetch for the current view. Any fetch issued earlier is
    /// now stale.
    pub fn begin_fetch(&mut self) -> PendingFetch {
        self.generation += 1;
        let key = self.current_key();
        let query = build_query(self.category, self.mode, &self.selection, &key.narrowing);
        self.in_flight = Some(InFlight {
            generation: self.generation,
            key,
        });
        self.error = None;
        PendingFetch {
            generation: self.generation,
            query,
        }
    }

    /// Apply a fetch result. Returns `false` (and changes nothing) unless
    /// `generation` is the latest one issued.
    pub fn complete_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<Component>, ApiError>,
    ) -> bool {
        let in_flight = match self.in_flight.take() {
            Some(f) if f.generation == generation && generation == self.generation => f,
            other => {
                self.in_flight = other;
                tracing::debug!(
                    generation,
                    latest = self.generation,
                    "Discarding stale fetch result"
                );
                return false;
            }
        };

        let current = in_flight.key == self.current_key();
        match result {
            Ok(list) => {
                tracing::debug!(
                    category = %in_flight.key.category,
                    count = list.len(),
                    "Fetched components"
                );
                self.results.insert(
                    (in_flight.key.category, in_flight.key.mode),
                    (in_flight.key, list),
                );
            }
            Err(e) => {
                tracing::warn!(category = %in_flight.key.category, "Fetch failed: {}", e);
                if current {
                    self.error = Some(FetchError::from(&e));
                }
            }
        }
        true
    }

    /// Fetch the current view now
    pub async fn refresh(&mut self, client: &ApiClient) -> bool {
        let pending = self.begin_fetch();
        let result = client.fetch(&pending.query).await;
        self.complete_fetch(pending.generation, result)
    }

    /// Current list after search and sort
    pub fn visible(&self) -> Vec<Component> {
        filter_and_sort(
            self.cached().unwrap_or_default(),
            &self.filters.search,
            self.filters.sort,
            &self.prices,
        )
    }

    /// Ids in the current list without a cached price
    pub fn unpriced_ids(&self) -> Vec<String> {
        self.cached()
            .unwrap_or_default()
            .iter()
            .filter(|c| !self.prices.contains(&c.id))
            .map(|c| c.id.clone())
            .collect()
    }
}
