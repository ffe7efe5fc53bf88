//! Client-held selection set.
//!
//! Items are keyed by scene name: selecting the same object twice does not
//! charge for it twice. Insertion order is kept so the order's `specs` list
//! reads the way the user picked things.
//!
//! The editor's presets ([`SelectionMode`]) replace the whole selection in
//! one step and are remembered until the user edits the set by hand.

use streetcredit_types::{constants, CreditError, Credits, Result, SelectionItem, SelectionMode};

use crate::quote::{quote, Quote};

/// Objects the user has marked for export.
#[derive(Debug, Clone)]
pub struct Selection {
    items: Vec<SelectionItem>,
    mode: Option<SelectionMode>,
    max_items: usize,
}

impl Selection {
    /// Create an empty selection with the default size cap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            mode: None,
            max_items: constants::MAX_SELECTION_ITEMS,
        }
    }

    /// Create an empty selection holding at most `max_items`.
    #[must_use]
    pub fn with_capacity(max_items: usize) -> Self {
        Self {
            items: Vec::with_capacity(max_items.min(64)),
            mode: None,
            max_items,
        }
    }

    /// Add `item`. Returns `false` if an item with the same name was
    /// already selected (the selection is unchanged).
    ///
    /// # Errors
    /// Returns `SelectionFull` when the cap is reached.
    pub fn select(&mut self, item: SelectionItem) -> Result<bool> {
        if self.contains(&item.name) {
            return Ok(false);
        }
        if self.items.len() >= self.max_items {
            return Err(CreditError::SelectionFull {
                max: self.max_items,
            });
        }
        self.items.push(item);
        self.mode = None;
        Ok(true)
    }

    /// Remove the item named `name`. Returns whether anything was removed.
    pub fn deselect(&mut self, name: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|it| it.name != name);
        let removed = self.items.len() != before;
        if removed {
            self.mode = None;
        }
        removed
    }

    /// Replace the selection with the objects in `scene` that `mode`
    /// covers. Returns how many were selected.
    ///
    /// # Errors
    /// Returns `SelectionFull` when the preset exceeds the cap; the
    /// selection is left empty.
    pub fn select_preset(&mut self, mode: SelectionMode, scene: &[SelectionItem]) -> Result<usize> {
        self.clear();
        for item in scene.iter().filter(|it| mode.includes(&it.name)) {
            if let Err(e) = self.select(item.clone()) {
                self.clear();
                return Err(e);
            }
        }
        self.mode = Some(mode);
        tracing::debug!(%mode, selected = self.items.len(), "preset selected");
        Ok(self.items.len())
    }

    /// The road and both sidewalks.
    pub fn select_road_set(&mut self, scene: &[SelectionItem]) -> Result<usize> {
        self.select_preset(SelectionMode::Road, scene)
    }

    /// Every exportable street object: the road, both sidewalks, and all
    /// trees and buildings.
    pub fn select_street_set(&mut self, scene: &[SelectionItem]) -> Result<usize> {
        self.select_preset(SelectionMode::Everything, scene)
    }

    /// The preset the current selection came from, if it was not edited
    /// since.
    #[must_use]
    pub fn mode(&self) -> Option<SelectionMode> {
        self.mode
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|it| it.name == name)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.mode = None;
    }

    #[must_use]
    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quote the current selection at `unit_price`.
    pub fn quote(&self, unit_price: Credits) -> Result<Quote> {
        quote(&self.items, unit_price)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Vec<SelectionItem> {
        vec![
            SelectionItem::dummy("Road"),
            SelectionItem::dummy("Sidewalk Left"),
            SelectionItem::dummy("Sidewalk Right"),
            SelectionItem::dummy("Road Line"),
            SelectionItem::dummy("Tree Trunk 0"),
            SelectionItem::dummy("Tree Foliage 0"),
            SelectionItem::dummy("Building 0"),
            SelectionItem::dummy("Ground"),
            SelectionItem::dummy("Street Light 1"),
        ]
    }

    #[test]
    fn select_and_count() {
        let mut sel = Selection::new();
        assert!(sel.select(SelectionItem::dummy("Road")).unwrap());
        assert!(sel.select(SelectionItem::dummy("Tree 1")).unwrap());
        assert_eq!(sel.len(), 2);
        assert!(!sel.is_empty());
    }

    #[test]
    fn reselecting_same_name_is_noop() {
        let mut sel = Selection::new();
        sel.select(SelectionItem::dummy("Road")).unwrap();
        assert!(!sel.select(SelectionItem::dummy("Road")).unwrap());
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn deselect_removes() {
        let mut sel = Selection::new();
        sel.select(SelectionItem::dummy("Road")).unwrap();
        assert!(sel.deselect("Road"));
        assert!(!sel.deselect("Road"));
        assert!(sel.is_empty());
    }

    #[test]
    fn selection_full() {
        let mut sel = Selection::with_capacity(2);
        sel.select(SelectionItem::dummy("a")).unwrap();
        sel.select(SelectionItem::dummy("b")).unwrap();
        let err = sel.select(SelectionItem::dummy("c")).unwrap_err();
        assert!(matches!(err, CreditError::SelectionFull { max: 2 }));
    }

    #[test]
    fn street_set_picks_road_sidewalks_trees_buildings() {
        let mut sel = Selection::new();
        sel.select(SelectionItem::dummy("Ground")).unwrap();
        let n = sel.select_street_set(&scene()).unwrap();
        assert_eq!(n, 6);
        assert!(sel.contains("Road"));
        assert!(sel.contains("Tree Foliage 0"));
        assert!(!sel.contains("Road Line"));
        assert!(!sel.contains("Ground"));
        assert!(!sel.contains("Street Light 1"));
        assert_eq!(sel.mode(), Some(SelectionMode::Everything));
    }

    #[test]
    fn road_set_picks_roadway_only() {
        let mut sel = Selection::new();
        let n = sel.select_road_set(&scene()).unwrap();
        assert_eq!(n, 3);
        assert!(sel.contains("Sidewalk Right"));
        assert!(!sel.contains("Tree Trunk 0"));
        assert!(!sel.contains("Building 0"));
        assert_eq!(sel.mode(), Some(SelectionMode::Road));
        assert_eq!(sel.quote(3).unwrap().total(), Some(9));
    }

    #[test]
    fn hand_edit_forgets_preset() {
        let mut sel = Selection::new();
        sel.select_road_set(&scene()).unwrap();
        assert!(!sel.deselect("Ground"));
        assert_eq!(sel.mode(), Some(SelectionMode::Road));
        sel.select(SelectionItem::dummy("Building 0")).unwrap();
        assert_eq!(sel.mode(), None);

        sel.select_street_set(&scene()).unwrap();
        assert!(sel.deselect("Road"));
        assert_eq!(sel.mode(), None);
    }

    #[test]
    fn oversized_preset_leaves_selection_empty() {
        let mut sel = Selection::with_capacity(2);
        let err = sel.select_road_set(&scene()).unwrap_err();
        assert!(matches!(err, CreditError::SelectionFull { max: 2 }));
        assert!(sel.is_empty());
        assert_eq!(sel.mode(), None);
    }

    #[test]
    fn empty_selection_quotes_nothing() {
        let sel = Selection::new();
        assert_eq!(sel.quote(3).unwrap(), Quote::NothingSelected);
    }

    #[test]
    fn selection_quote_uses_item_count() {
        let mut sel = Selection::new();
        for item in SelectionItem::dummies(3) {
            sel.select(item).unwrap();
        }
        assert_eq!(sel.quote(3).unwrap().total(), Some(9));
    }
}
