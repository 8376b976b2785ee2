//! Observed minimum prices, keyed by component id
//!
//! The list endpoints don't return prices; each card resolves its own
//! minimum price and the result lands here. Sorting and build totals read it.

use super::Component;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PriceCache {
    prices: HashMap<String, f64>,
}

impl PriceCache {
    /// Record a lookup result. `None` (price unavailable) clears any old value.
    pub fn record(&mut self, id: &str, price: Option<f64>) {
        match price {
            Some(p) if p.is_finite() => {
                self.prices.insert(id.to_string(), p);
            }
            _ => {
                self.prices.remove(id);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.prices.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.prices.contains_key(id)
    }

    /// Price used for ordering; unknown prices order as 0
    pub fn price_or_zero(&self, id: &str) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    /// Sum of prices, or `None` unless every component has a known price
    pub fn total_for<'a, I>(&self, components: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a Component>,
    {
        components
            .into_iter()
            .try_fold(0.0, |acc, c| self.get(&c.id).map(|p| acc + p))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn comp(id: &str) -> Component {
        Component {
            id: id.to_string(),
            name: id.to_uppercase(),
            category: Category::Ram,
            brand: String::new(),
            specs: Default::default(),
        }
    }

    #[test]
    fn total_requires_every_price() {
        let mut cache = PriceCache::default();
        let parts = [comp("a"), comp("b")];
        cache.record("a", Some(120.0));
        assert_eq!(cache.total_for(&parts), None);

        cache.record("b", Some(80.5));
        assert_eq!(cache.total_for(&parts), Some(200.5));
    }

    #[test]
    fn unavailable_price_clears_entry() {
        let mut cache = PriceCache::default();
        cache.record("a", Some(10.0));
        cache.record("a", None);
        assert!(!cache.contains("a"));
        assert_eq!(cache.price_or_zero("a"), 0.0);
    }

    #[test]
    fn empty_build_totals_zero() {
        let cache = PriceCache::default();
        assert_eq!(cache.total_for(std::iter::empty()), Some(0.0));
    }
}
