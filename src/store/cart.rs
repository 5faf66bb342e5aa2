//! Cart line items and the persisted cart store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::Product,
    store::{
        persist::{PersistedStore, StoreState},
        storage::StorageBackend,
    },
};

/// Storage slot of the cart.
pub const CART_STORAGE_KEY: &str = "hat-store-cart";

/// One cart line, keyed by product id and size.
///
/// Display fields are captured when the line is first added and are not
/// refreshed from the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: Uuid,
    pub size: String,
    pub name: String,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub image: Option<String>,
    pub slug: String,
    pub quantity: u32,
}

impl CartLineItem {
    fn from_product(product: &Product, size: &str, quantity: u32) -> Self {
        Self {
            id: product.id,
            size: size.to_string(),
            name: product.name.clone(),
            price: product.price,
            sale_price: product.sale_price,
            image: product.image.clone(),
            slug: product.slug.clone(),
            quantity,
        }
    }

    pub fn matches(&self, id: Uuid, size: &str) -> bool {
        self.id == id && self.size == size
    }

    /// Sale price when there is one, list price otherwise.
    pub fn effective_price(&self) -> i64 {
        self.sale_price.unwrap_or(self.price)
    }

    /// Effective price times quantity, saturating at the `i64` bounds.
    pub fn line_total(&self) -> i64 {
        self.effective_price().saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    pub items: Vec<CartLineItem>,
}

impl CartState {
    /// Add `quantity` of a product in a size.
    ///
    /// An existing `(id, size)` line is incremented in place; otherwise a new
    /// line is appended. A zero quantity changes nothing.
    pub fn add_item(&mut self, product: &Product, size: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|line| line.matches(product.id, size)) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self
                .items
                .push(CartLineItem::from_product(product, size, quantity)),
        }
    }

    /// Remove and return the line, if there is one.
    pub fn remove_item(&mut self, id: Uuid, size: &str) -> Option<CartLineItem> {
        let index = self.items.iter().position(|line| line.matches(id, size))?;
        Some(self.items.remove(index))
    }

    /// Set a line's quantity. Zero removes the line; a missing line is ignored.
    pub fn update_item_quantity(&mut self, id: Uuid, size: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_item(id, size);
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|line| line.matches(id, size)) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get_item(&self, id: Uuid, size: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|line| line.matches(id, size))
    }

    /// Sum of quantities over all lines.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn subtotal(&self) -> i64 {
        self.items
            .iter()
            .map(CartLineItem::line_total)
            .fold(0, i64::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl StoreState for CartState {
    /// Merge repeated `(id, size)` lines and drop empty ones.
    fn normalize(&mut self) {
        let mut merged: Vec<CartLineItem> = Vec::with_capacity(self.items.len());
        for line in self.items.drain(..) {
            if line.quantity == 0 {
                continue;
            }
            match merged.iter_mut().find(|kept| kept.matches(line.id, &line.size)) {
                Some(kept) => kept.quantity = kept.quantity.saturating_add(line.quantity),
                None => merged.push(line),
            }
        }
        self.items = merged;
    }
}

/// The cart, mirrored into its storage slot after every action.
#[derive(Debug)]
pub struct CartStore {
    inner: PersistedStore<CartState>,
}

impl CartStore {
    /// Open the cart and load the persisted lines.
    pub fn open(storage: Option<Arc<dyn StorageBackend>>) -> Self {
        Self {
            inner: PersistedStore::open(CART_STORAGE_KEY, storage),
        }
    }

    pub(crate) fn detached(storage: Option<Arc<dyn StorageBackend>>) -> Self {
        Self {
            inner: PersistedStore::detached(CART_STORAGE_KEY, storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(None)
    }

    pub fn state(&self) -> &CartState {
        self.inner.state()
    }

    pub fn items(&self) -> &[CartLineItem] {
        &self.inner.state().items
    }

    pub fn add_item(&mut self, product: &Product, size: &str, quantity: u32) {
        self.inner.update(|cart| cart.add_item(product, size, quantity));
    }

    pub fn remove_item(&mut self, id: Uuid, size: &str) {
        self.inner.update(|cart| {
            cart.remove_item(id, size);
        });
    }

    pub fn update_item_quantity(&mut self, id: Uuid, size: &str, quantity: u32) {
        self.inner
            .update(|cart| cart.update_item_quantity(id, size, quantity));
    }

    pub fn clear_cart(&mut self) {
        self.inner.update(CartState::clear);
    }

    pub fn total_items(&self) -> u64 {
        self.state().total_items()
    }

    pub fn subtotal(&self) -> i64 {
        self.state().subtotal()
    }

    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        self.inner.snapshot()
    }

    pub(crate) fn persisted_mut(&mut self) -> &mut PersistedStore<CartState> {
        &mut self.inner
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;
    use chrono::Utc;

    pub(crate) fn product(name: &str, price: i64, sale_price: Option<i64>) -> Product {
        Product {
            id: Uuid::new_v4(),
            slug: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            description: Some(format!("{name} description")),
            price,
            sale_price,
            image: Some(format!("/images/{}.jpg", name.to_lowercase())),
            collection: Some("Classics".to_string()),
            sizes: vec!["S".into(), "M".into(), "L".into()],
            rating: 0.0,
            review_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn repeated_adds_accumulate_on_one_line() {
        let fedora = product("Fedora", 50, None);
        let mut cart = CartState::default();

        cart.add_item(&fedora, "M", 1);
        cart.add_item(&fedora, "M", 2);
        cart.add_item(&fedora, "M", 4);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.get_item(fedora.id, "M").unwrap().quantity, 7);
    }

    #[test]
    fn sizes_are_separate_lines() {
        let fedora = product("Fedora", 50, None);
        let mut cart = CartState::default();

        cart.add_item(&fedora, "M", 1);
        cart.add_item(&fedora, "L", 1);

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.total_items(), 2);
    }

    #[test]
    fn increments_keep_insertion_order() {
        let fedora = product("Fedora", 50, None);
        let beanie = product("Beanie", 20, None);
        let mut cart = CartState::default();

        cart.add_item(&fedora, "M", 1);
        cart.add_item(&beanie, "One Size", 1);
        cart.add_item(&fedora, "M", 1);

        let names: Vec<_> = cart.items.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Fedora", "Beanie"]);
    }

    #[test]
    fn zero_quantity_add_is_ignored() {
        let fedora = product("Fedora", 50, None);
        let mut cart = CartState::default();
        cart.add_item(&fedora, "M", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let fedora = product("Fedora", 50, None);
        let mut cart = CartState::default();
        cart.add_item(&fedora, "M", 1);

        assert!(cart.remove_item(fedora.id, "M").is_some());
        assert!(cart.remove_item(fedora.id, "M").is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn quantity_zero_removes_the_line() {
        let fedora = product("Fedora", 50, None);
        let mut cart = CartState::default();
        cart.add_item(&fedora, "M", 3);

        cart.update_item_quantity(fedora.id, "M", 5);
        assert_eq!(cart.get_item(fedora.id, "M").unwrap().quantity, 5);

        cart.update_item_quantity(fedora.id, "M", 0);
        assert!(cart.get_item(fedora.id, "M").is_none());

        // Missing lines are not created by a quantity update.
        cart.update_item_quantity(fedora.id, "S", 2);
        assert!(cart.is_empty());
    }

    #[test]
    fn subtotal_uses_sale_price_when_present() {
        let panama = product("Panama", 50, Some(40));
        let beanie = product("Beanie", 20, None);
        let mut cart = CartState::default();

        cart.add_item(&panama, "M", 2);
        cart.add_item(&beanie, "One Size", 1);

        assert_eq!(cart.get_item(panama.id, "M").unwrap().effective_price(), 40);
        assert_eq!(cart.subtotal(), 100);
    }

    #[test]
    fn display_fields_are_captured_at_add_time() {
        let mut fedora = product("Fedora", 50, None);
        let mut cart = CartState::default();
        cart.add_item(&fedora, "M", 1);

        fedora.price = 75;
        fedora.name = "Fedora Deluxe".into();
        cart.add_item(&fedora, "M", 1);

        let line = cart.get_item(fedora.id, "M").unwrap();
        assert_eq!(line.price, 50);
        assert_eq!(line.name, "Fedora");
    }

    #[test]
    fn store_round_trips_through_storage() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::open(Some(storage.clone()));
        cart.add_item(&product("Fedora", 50, Some(45)), "M", 2);
        cart.add_item(&product("Beanie", 20, None), "One Size", 1);
        let before = cart.items().to_vec();

        drop(cart);
        let reopened = CartStore::open(Some(storage));
        assert_eq!(reopened.items(), before.as_slice());
    }

    #[test]
    fn malformed_slot_opens_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(CART_STORAGE_KEY, "[[[").unwrap();

        let cart = CartStore::open(Some(storage));
        assert!(cart.state().is_empty());
    }

    #[test]
    fn clear_cart_empties_everything() {
        let mut cart = CartStore::in_memory();
        cart.add_item(&product("Fedora", 50, None), "M", 2);
        cart.clear_cart();
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.subtotal(), 0);
    }

    #[test]
    fn huge_totals_saturate() {
        let crown = product("Crown", i64::MAX / 2, None);
        let mut cart = CartState::default();
        cart.add_item(&crown, "M", u32::MAX);
        cart.add_item(&crown, "L", 3);

        assert_eq!(cart.get_item(crown.id, "M").unwrap().line_total(), i64::MAX);
        assert_eq!(cart.subtotal(), i64::MAX);
    }

    #[test]
    fn duplicate_lines_in_slot_are_merged_on_load() {
        let fedora = product("Fedora", 50, None);
        let mut line = CartLineItem::from_product(&fedora, "M", 2);
        let mut empty = line.clone();
        empty.size = "L".into();
        empty.quantity = 0;
        let state = CartState {
            items: vec![line.clone(), empty, line.clone()],
        };
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                CART_STORAGE_KEY,
                &serde_json::json!({ "state": state, "version": 0 }).to_string(),
            )
            .unwrap();

        let cart = CartStore::open(Some(storage));
        line.quantity = 4;
        assert_eq!(cart.items(), [line].as_slice());
    }
}
