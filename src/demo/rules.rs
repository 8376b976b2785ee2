//! Simplified compatibility rules for the demo backend
//!
//! A rule only rejects when both sides carry the attribute it compares;
//! missing data never makes a part incompatible.

use super::catalog::Listing;
use crate::catalog::{Category, Component};
use crate::workflow::CompatibilityBase;
use std::collections::{BTreeMap, HashMap};

/// Headroom added on top of CPU + GPU draw when sizing a PSU
pub const PSU_HEADROOM_W: f64 = 150.0;

type Specs = BTreeMap<String, String>;

/// Attributes known for each base category
#[derive(Debug, Default)]
pub struct ResolvedBases {
    specs: HashMap<Category, Specs>,
}

impl ResolvedBases {
    /// Look bases up in the catalog by name. A CPU base whose key matches no
    /// name is taken as a socket, so only the socket is known for it.
    pub fn resolve(bases: &[CompatibilityBase], listings: &[Listing]) -> Self {
        let mut specs = HashMap::new();
        for base in bases {
            let found = listings.iter().find(|l| {
                l.component.category == base.category
                    && l.component.name.eq_ignore_ascii_case(&base.key)
            });
            match (found, base.category) {
                (Some(listing), _) => {
                    specs.insert(base.category, listing.component.specs.clone());
                }
                (None, Category::Cpu) => {
                    let mut cpu = Specs::new();
                    cpu.insert("socket".to_string(), base.key.clone());
                    specs.insert(Category::Cpu, cpu);
                }
                (None, other) => {
                    tracing::debug!(category = %other, key = %base.key, "Unknown base ignored");
                }
            }
        }
        Self { specs }
    }

    fn get(&self, category: Category, key: &str) -> Option<&str> {
        self.specs
            .get(&category)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    fn number(&self, category: Category, key: &str) -> Option<f64> {
        self.get(category, key).and_then(|v| v.trim().parse().ok())
    }
}

fn same(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => true,
    }
}

/// Whether a comma-separated list contains `value`
fn listed(list: Option<&str>, value: Option<&str>) -> bool {
    match (list, value) {
        (Some(list), Some(value)) => list
            .split(',')
            .any(|item| item.trim().eq_ignore_ascii_case(value.trim())),
        _ => true,
    }
}

fn at_most(value: Option<f64>, limit: Option<f64>) -> bool {
    match (value, limit) {
        (Some(v), Some(l)) => v <= l,
        _ => true,
    }
}

fn num(component: &Component, key: &str) -> Option<f64> {
    component.spec(key).and_then(|v| v.trim().parse().ok())
}

/// Whether `candidate` works with every resolved base
pub fn is_compatible(candidate: &Component, bases: &ResolvedBases) -> bool {
    use Category::*;
    let spec = |key: &str| candidate.spec(key);

    match candidate.category {
        Cpu => {
            same(spec("socket"), bases.get(Motherboard, "socket"))
                && listed(bases.get(Cooler, "sockets"), spec("socket"))
        }
        Motherboard => {
            same(spec("socket"), bases.get(Cpu, "socket"))
                && same(spec("ram_type"), bases.get(Ram, "ram_type"))
                && listed(bases.get(Case, "form_factors"), spec("form_factor"))
        }
        Ram => same(spec("ram_type"), bases.get(Motherboard, "ram_type")),
        Case => {
            listed(spec("form_factors"), bases.get(Motherboard, "form_factor"))
                && at_most(bases.number(Gpu, "length_mm"), num(candidate, "max_gpu_length_mm"))
        }
        Gpu => {
            at_most(num(candidate, "length_mm"), bases.number(Case, "max_gpu_length_mm"))
                && psu_fits(
                    bases.number(Psu, "power_w"),
                    bases.number(Cpu, "tdp_w"),
                    num(candidate, "tdp_w"),
                )
        }
        Cooler => listed(spec("sockets"), bases.get(Cpu, "socket")),
        Psu => psu_fits(
            num(candidate, "power_w"),
            bases.number(Cpu, "tdp_w"),
            bases.number(Gpu, "tdp_w"),
        ),
        Hdd | Ssd => true,
    }
}

fn psu_fits(power: Option<f64>, cpu_draw: Option<f64>, gpu_draw: Option<f64>) -> bool {
    match power {
        Some(power) => {
            power >= cpu_draw.unwrap_or(0.0) + gpu_draw.unwrap_or(0.0) + PSU_HEADROOM_W
        }
        None => true,
    }
}
