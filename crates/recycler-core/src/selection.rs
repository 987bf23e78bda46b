//! Focused-entry holder for detail views.
//!
//! Works over any id source (the item catalog or the character roster) via
//! the `SelectableSource` trait.

use tracing::debug;

use crate::catalog::Catalog;
use crate::roster::Roster;

/// Anything that can answer "does this id exist?"
pub trait SelectableSource {
    fn has_entry(&self, id: &str) -> bool;
}

impl SelectableSource for Catalog {
    fn has_entry(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl SelectableSource for Roster {
    fn has_entry(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start focused on `id` (the showcase opens on its first entry)
    pub fn focused_on(id: impl Into<String>) -> Self {
        Self { selected: Some(id.into()) }
    }

    /// Focus `id` if the source knows it; otherwise leave focus unchanged.
    /// Returns true when the id is now focused.
    pub fn select<S: SelectableSource + ?Sized>(&mut self, source: &S, id: &str) -> bool {
        if !source.has_entry(id) {
            debug!("Ignoring selection of unknown id {}", id);
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_known_item() {
        let catalog = Catalog::builtin();
        let mut selection = SelectionState::new();
        assert!(selection.select(&catalog, "case-alpha"));
        assert_eq!(selection.selected(), Some("case-alpha"));
    }

    #[test]
    fn test_select_unknown_is_noop() {
        let catalog = Catalog::builtin();
        let mut selection = SelectionState::focused_on("case-alpha");
        assert!(!selection.select(&catalog, "does-not-exist"));
        assert_eq!(selection.selected(), Some("case-alpha"));
    }

    #[test]
    fn test_select_over_roster() {
        let roster = Roster::builtin();
        let mut selection = SelectionState::focused_on("jett");
        assert!(selection.select(&roster, "viper"));
        assert_eq!(selection.selected(), Some("viper"));
        assert!(!selection.select(&roster, "rtx-4090-reforged"));
    }
}
