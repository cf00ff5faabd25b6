use std::collections::BTreeSet;

use serde::Serialize;

use super::domain::ApplicationId;

/// Tri-state summary for a "select all" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMark {
    None,
    Partial,
    All,
}

/// Applications chosen for a batch action. Every operation takes the current
/// visible id list, and membership is always a subset of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionManager {
    selected: BTreeSet<ApplicationId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Ids that are not visible are ignored.
    pub fn toggle(&mut self, id: &ApplicationId, visible: &[ApplicationId]) -> bool {
        if !visible.contains(id) {
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.clone());
        }
        true
    }

    pub fn select_all(&mut self, visible: &[ApplicationId]) {
        self.selected = visible.iter().cloned().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop members that are no longer visible. Returns how many were dropped.
    pub fn retain_visible(&mut self, visible: &[ApplicationId]) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| visible.contains(id));
        before - self.selected.len()
    }

    pub fn is_all_selected(&self, visible: &[ApplicationId]) -> bool {
        !self.selected.is_empty() && self.selected.len() == visible.len()
    }

    pub fn is_indeterminate(&self, visible: &[ApplicationId]) -> bool {
        !self.selected.is_empty() && self.selected.len() < visible.len()
    }

    pub fn mark(&self, visible: &[ApplicationId]) -> SelectionMark {
        if self.is_all_selected(visible) {
            SelectionMark::All
        } else if self.is_indeterminate(visible) {
            SelectionMark::Partial
        } else {
            SelectionMark::None
        }
    }

    pub fn contains(&self, id: &ApplicationId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<ApplicationId> {
        self.selected.iter().cloned().collect()
    }
}
