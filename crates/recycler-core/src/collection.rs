//! ============================================================================
//! Collection State - Wishlist, Cart and Inventory
//! ============================================================================
//! Three independent id collections owned by one shopper:
//! - Wishlist: set semantics, mutated only by toggling
//! - Cart: ordered multiset, occurrences removed by position
//! - Inventory: ordered multiset, filled at checkout, drained by case opening
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::types::*;

/// A supply case held in inventory, grouped with its count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeldContainer {
    pub id: ItemId,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionState {
    wishlist: Vec<ItemId>,
    cart: Vec<ItemId>,
    inventory: Vec<ItemId>,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Wishlist
    // ========================================================================

    /// Add the id if absent, remove it if present.
    /// Returns true when the id is wishlisted after the call.
    pub fn toggle_wishlist(&mut self, id: &str) -> bool {
        if let Some(pos) = self.wishlist.iter().position(|w| w == id) {
            self.wishlist.remove(pos);
            debug!("Wishlist -{}", id);
            false
        } else {
            self.wishlist.push(id.to_string());
            debug!("Wishlist +{}", id);
            true
        }
    }

    pub fn is_wishlisted(&self, id: &str) -> bool {
        self.wishlist.iter().any(|w| w == id)
    }

    pub fn wishlist(&self) -> &[ItemId] {
        &self.wishlist
    }

    // ========================================================================
    // Cart
    // ========================================================================

    pub fn add_to_cart(&mut self, id: &str) {
        self.cart.push(id.to_string());
        debug!("Cart +{} ({} lines)", id, self.cart.len());
    }

    /// Remove the occurrence at `position`. Out of range is a no-op.
    pub fn remove_from_cart(&mut self, position: usize) -> Option<ItemId> {
        if position >= self.cart.len() {
            debug!("Cart remove ignored: position {} of {}", position, self.cart.len());
            return None;
        }
        Some(self.cart.remove(position))
    }

    pub fn cart(&self) -> &[ItemId] {
        &self.cart
    }

    pub fn cart_total(&self, catalog: &Catalog) -> f64 {
        catalog.total_of(&self.cart)
    }

    /// Append every cart occurrence to inventory and clear the cart in one
    /// step. Returns the number of occurrences migrated.
    pub fn move_cart_to_inventory(&mut self) -> usize {
        let migrated = std::mem::take(&mut self.cart);
        let count = migrated.len();
        self.inventory.extend(migrated);
        debug!("Moved {} cart lines into inventory", count);
        count
    }

    // ========================================================================
    // Inventory
    // ========================================================================

    /// Remove the first occurrence of `id`. Returns whether one was removed.
    pub fn remove_from_inventory(&mut self, id: &str) -> bool {
        match self.inventory.iter().position(|i| i == id) {
            Some(pos) => {
                self.inventory.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn inventory(&self) -> &[ItemId] {
        &self.inventory
    }

    pub fn inventory_count(&self, id: &str) -> usize {
        self.inventory.iter().filter(|i| *i == id).count()
    }

    /// Distinct containers in inventory with their counts, in catalog order
    pub fn containers_in_inventory(&self, catalog: &Catalog) -> Vec<HeldContainer> {
        catalog
            .items()
            .iter()
            .filter(|item| item.is_container())
            .map(|item| HeldContainer {
                id: item.id.clone(),
                count: self.inventory_count(&item.id),
            })
            .filter(|held| held.count > 0)
            .collect()
    }

    /// Grant an item straight into inventory (case rewards)
    pub(crate) fn grant(&mut self, id: &str) {
        self.inventory.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(ids: &[ItemId]) -> Vec<ItemId> {
        let mut v = ids.to_vec();
        v.sort();
        v
    }

    #[test]
    fn test_wishlist_toggle_is_own_inverse() {
        for id in ["gpuX", "cpuY", "unknown-id"] {
            let mut state = CollectionState::new();
            state.toggle_wishlist("caseA");
            let before = state.wishlist().to_vec();

            state.toggle_wishlist(id);
            state.toggle_wishlist(id);

            assert_eq!(state.wishlist(), before.as_slice(), "double toggle of {}", id);
        }
    }

    #[test]
    fn test_wishlist_has_set_semantics() {
        let mut state = CollectionState::new();
        assert!(state.toggle_wishlist("gpuX"));
        assert!(state.is_wishlisted("gpuX"));
        assert!(!state.toggle_wishlist("gpuX"));
        assert!(!state.is_wishlisted("gpuX"));
        assert!(state.wishlist().is_empty());
    }

    #[test]
    fn test_cart_allows_duplicates() {
        let mut state = CollectionState::new();
        state.add_to_cart("gpuX");
        state.add_to_cart("gpuX");
        assert_eq!(state.cart().len(), 2);
    }

    #[test]
    fn test_remove_from_cart_by_position() {
        let mut state = CollectionState::new();
        state.add_to_cart("gpuX");
        state.add_to_cart("cpuY");
        state.add_to_cart("gpuX");

        assert_eq!(state.remove_from_cart(1), Some("cpuY".to_string()));
        assert_eq!(state.cart(), &["gpuX".to_string(), "gpuX".to_string()]);
    }

    #[test]
    fn test_remove_from_cart_out_of_range_is_noop() {
        let mut state = CollectionState::new();
        state.add_to_cart("gpuX");
        state.add_to_cart("cpuY");
        let before = state.clone();

        assert_eq!(state.remove_from_cart(5), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_move_cart_preserves_multiset() {
        let carts: [&[&str]; 3] = [&[], &["gpuX"], &["gpuX", "gpuX", "cpuY", "caseA"]];
        for cart in carts {
            let mut state = CollectionState::new();
            state.inventory.push("caseA".into());
            for id in cart {
                state.add_to_cart(id);
            }
            let cart_snapshot = state.cart().to_vec();
            let inventory_before = state.inventory().to_vec();

            let moved = state.move_cart_to_inventory();

            assert_eq!(moved, cart.len());
            assert!(state.cart().is_empty());
            let mut expected = inventory_before;
            expected.extend(cart_snapshot);
            assert_eq!(sorted(state.inventory()), sorted(&expected));
        }
    }

    #[test]
    fn test_remove_from_inventory_takes_first_match() {
        let mut state = CollectionState::new();
        state.inventory = vec!["caseA".into(), "gpuX".into(), "caseA".into()];

        assert!(state.remove_from_inventory("caseA"));
        assert_eq!(state.inventory(), &["gpuX".to_string(), "caseA".to_string()]);
        assert!(!state.remove_from_inventory("cpuY"));
        assert_eq!(state.inventory_count("caseA"), 1);
    }

    #[test]
    fn test_containers_in_inventory_grouped() {
        let catalog = Catalog::builtin();
        let mut state = CollectionState::new();
        state.inventory = vec![
            "case-omega".into(),
            "case-alpha".into(),
            "rx-6800-revival".into(),
            "case-alpha".into(),
        ];

        let held = state.containers_in_inventory(&catalog);
        assert_eq!(
            held,
            vec![
                HeldContainer { id: "case-alpha".into(), count: 2 },
                HeldContainer { id: "case-omega".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_cart_total() {
        let catalog = Catalog::builtin();
        let mut state = CollectionState::new();
        state.add_to_cart("case-alpha");
        state.add_to_cart("case-alpha");
        state.add_to_cart("mouse-ghost-lite");
        assert_eq!(state.cart_total(&catalog), 25.0 + 25.0 + 59.0);
    }
}
