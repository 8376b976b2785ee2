//! Catalog domain: categories, components, filters, and the selection store

mod category;
mod component;
mod filters;
mod price_cache;
mod selection;

pub use category::{Category, UnknownCategory};
pub use component::{
    Component, MinPrice, Notification, Offer, SavedBuild, UseCaseBuild, UseCaseInfo,
};
pub use filters::{filter_and_sort, BrandFilter, FilterState, Narrowing, SortOrder, UseCase};
pub use price_cache::PriceCache;
pub use selection::{ComponentRef, SelectOutcome, Selection};
