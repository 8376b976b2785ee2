//! Selection store: at most one chosen component per category
//!
//! Entries are always indexed by the component's own category, never by the
//! category being browsed, so a RAM stick can't end up in the CPU slot.

use super::{Category, Component};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of [`Selection::select`]
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// Component now occupies its slot; `replaced` is the previous occupant
    Selected { replaced: Option<Component> },
    /// The same component was already selected and has been cleared
    Deselected,
}

/// `{category, name}` pair sent when saving a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    pub category: Category,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    slots: BTreeMap<Category, Component>,
    revision: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a component into its category slot.
    ///
    /// Selecting the component that already occupies the slot (same id)
    /// clears it; anything else replaces the occupant.
    pub fn select(&mut self, component: Component) -> SelectOutcome {
        let category = component.category;
        let same = self
            .slots
            .get(&category)
            .is_some_and(|held| held.id == component.id);

        self.revision += 1;
        if same {
            self.slots.remove(&category);
            SelectOutcome::Deselected
        } else {
            let replaced = self.slots.insert(category, component);
            SelectOutcome::Selected { replaced }
        }
    }

    /// Clear a slot. Returns the removed component, `None` if already empty.
    pub fn remove(&mut self, category: Category) -> Option<Component> {
        let removed = self.slots.remove(&category);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.slots.is_empty() {
            self.slots.clear();
            self.revision += 1;
        }
    }

    pub fn get(&self, category: Category) -> Option<&Component> {
        self.slots.get(&category)
    }

    /// Whether this exact component (by id) is selected
    pub fn contains(&self, component: &Component) -> bool {
        self.slots
            .get(&component.category)
            .is_some_and(|held| held.id == component.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &Component)> {
        self.slots.iter().map(|(c, comp)| (*c, comp))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bumped on every mutation that changed the contents
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn to_component_refs(&self) -> Vec<ComponentRef> {
        self.slots
            .iter()
            .map(|(category, c)| ComponentRef {
                category: *category,
                name: c.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(id: &str, category: Category) -> Component {
        Component {
            id: id.to_string(),
            name: format!("{id} name"),
            category,
            brand: String::new(),
            specs: BTreeMap::new(),
        }
    }

    #[test]
    fn select_twice_toggles_off() {
        let mut sel = Selection::new();
        let cpu = comp("cpu-1", Category::Cpu);

        assert_eq!(
            sel.select(cpu.clone()),
            SelectOutcome::Selected { replaced: None }
        );
        assert!(sel.contains(&cpu));

        assert_eq!(sel.select(cpu.clone()), SelectOutcome::Deselected);
        assert!(sel.get(Category::Cpu).is_none());
        assert!(sel.is_empty());
    }

    #[test]
    fn select_replaces_other_component_in_slot() {
        let mut sel = Selection::new();
        sel.select(comp("cpu-1", Category::Cpu));
        let outcome = sel.select(comp("cpu-2", Category::Cpu));
        match outcome {
            SelectOutcome::Selected { replaced: Some(old) } => assert_eq!(old.id, "cpu-1"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(sel.get(Category::Cpu).unwrap().id, "cpu-2");
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn double_remove_is_noop() {
        let mut sel = Selection::new();
        sel.select(comp("gpu-1", Category::Gpu));
        assert!(sel.remove(Category::Gpu).is_some());
        let rev = sel.revision();
        assert!(sel.remove(Category::Gpu).is_none());
        assert_eq!(sel.revision(), rev);
        assert!(sel.is_empty());
    }

    #[test]
    fn indexes_by_component_category() {
        let mut sel = Selection::new();
        // Picked while the cpu tab was being browsed
        sel.select(comp("ram-1", Category::Ram));
        assert!(sel.get(Category::Cpu).is_none());
        assert_eq!(sel.get(Category::Ram).unwrap().id, "ram-1");
        for (category, c) in sel.iter() {
            assert_eq!(c.category, category);
        }
    }

    #[test]
    fn revision_tracks_real_mutations() {
        let mut sel = Selection::new();
        assert_eq!(sel.revision(), 0);
        sel.select(comp("psu-1", Category::Psu));
        assert_eq!(sel.revision(), 1);
        sel.clear();
        assert_eq!(sel.revision(), 2);
        sel.clear();
        assert_eq!(sel.revision(), 2);
    }

    #[test]
    fn component_refs_follow_category_order() {
        let mut sel = Selection::new();
        sel.select(comp("psu-1", Category::Psu));
        sel.select(comp("cpu-1", Category::Cpu));
        let refs = sel.to_component_refs();
        assert_eq!(refs[0].category, Category::Cpu);
        assert_eq!(refs[1].category, Category::Psu);
        assert_eq!(refs[1].name, "psu-1 name");
    }
}
