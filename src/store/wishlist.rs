//! Saved-for-later items and the persisted wishlist store.

use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::Product,
    store::{
        cart::CartLineItem,
        persist::{PersistedStore, StoreState},
        storage::StorageBackend,
    },
};

/// Storage slot of the wishlist.
pub const WISHLIST_STORAGE_KEY: &str = "hat-store-wishlist";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub image: Option<String>,
    pub slug: String,
    pub description: Option<String>,
    pub collection: Option<String>,
}

impl From<&Product> for WishlistItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            sale_price: product.sale_price,
            image: product.image.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            collection: product.collection.clone(),
        }
    }
}

// Cart lines do not carry description or collection.
impl From<&CartLineItem> for WishlistItem {
    fn from(line: &CartLineItem) -> Self {
        Self {
            id: line.id,
            name: line.name.clone(),
            price: line.price,
            sale_price: line.sale_price,
            image: line.image.clone(),
            slug: line.slug.clone(),
            description: None,
            collection: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistState {
    pub items: Vec<WishlistItem>,
}

impl WishlistState {
    /// Add an item unless one with the same id is already saved.
    ///
    /// Returns `true` when the item was inserted.
    pub fn add_item(&mut self, item: WishlistItem) -> bool {
        if self.is_in_wishlist(item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove_item(&mut self, id: Uuid) -> Option<WishlistItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Add when absent, remove when present. Returns whether the item is saved afterwards.
    pub fn toggle_item(&mut self, item: WishlistItem) -> bool {
        if self.remove_item(item.id).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_in_wishlist(&self, id: Uuid) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn get_item(&self, id: Uuid) -> Option<&WishlistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl StoreState for WishlistState {
    /// Keep the first entry for each id.
    fn normalize(&mut self) {
        let mut seen = HashSet::with_capacity(self.items.len());
        self.items.retain(|item| seen.insert(item.id));
    }
}

#[derive(Debug)]
pub struct WishlistStore {
    inner: PersistedStore<WishlistState>,
}

impl WishlistStore {
    pub fn open(storage: Option<Arc<dyn StorageBackend>>) -> Self {
        Self {
            inner: PersistedStore::open(WISHLIST_STORAGE_KEY, storage),
        }
    }

    pub(crate) fn detached(storage: Option<Arc<dyn StorageBackend>>) -> Self {
        Self {
            inner: PersistedStore::detached(WISHLIST_STORAGE_KEY, storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(None)
    }

    pub fn state(&self) -> &WishlistState {
        self.inner.state()
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.inner.state().items
    }

    pub fn add_item(&mut self, product: &Product) -> bool {
        self.inner.update(|list| list.add_item(product.into()))
    }

    pub fn remove_item(&mut self, id: Uuid) {
        self.inner.update(|list| {
            list.remove_item(id);
        });
    }

    pub fn toggle_item(&mut self, product: &Product) -> bool {
        self.inner.update(|list| list.toggle_item(product.into()))
    }

    pub fn clear_wishlist(&mut self) {
        self.inner.update(WishlistState::clear);
    }

    pub fn is_in_wishlist(&self, id: Uuid) -> bool {
        self.state().is_in_wishlist(id)
    }

    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        self.inner.snapshot()
    }

    pub(crate) fn persisted_mut(&mut self) -> &mut PersistedStore<WishlistState> {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{cart::tests::product, storage::MemoryStorage};

    #[test]
    fn adding_twice_keeps_one_entry() {
        let trilby = product("Trilby", 35, None);
        let mut wishlist = WishlistStore::in_memory();

        assert!(wishlist.add_item(&trilby));
        assert!(!wishlist.add_item(&trilby));
        assert_eq!(wishlist.items().len(), 1);
    }

    #[test]
    fn toggle_alternates_between_saved_and_not() {
        let trilby = product("Trilby", 35, None);
        let mut wishlist = WishlistStore::in_memory();

        assert!(wishlist.toggle_item(&trilby));
        assert!(wishlist.is_in_wishlist(trilby.id));
        assert!(!wishlist.toggle_item(&trilby));
        assert!(!wishlist.is_in_wishlist(trilby.id));
    }

    #[test]
    fn remove_missing_is_a_no_op() {
        let mut wishlist = WishlistStore::in_memory();
        wishlist.add_item(&product("Trilby", 35, None));
        wishlist.remove_item(Uuid::new_v4());
        assert_eq!(wishlist.items().len(), 1);
    }

    #[test]
    fn clear_and_reopen() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let mut wishlist = WishlistStore::open(Some(storage.clone()));
        wishlist.add_item(&product("Trilby", 35, None));
        wishlist.add_item(&product("Bowler", 60, Some(55)));

        let reopened = WishlistStore::open(Some(storage.clone()));
        assert_eq!(reopened.items(), wishlist.items());

        wishlist.clear_wishlist();
        let reopened = WishlistStore::open(Some(storage));
        assert!(reopened.state().is_empty());
    }

    #[test]
    fn repeated_ids_in_slot_load_once() {
        let trilby = WishlistItem::from(&product("Trilby", 35, None));
        let bowler = WishlistItem::from(&product("Bowler", 60, None));
        let state = WishlistState {
            items: vec![trilby.clone(), bowler.clone(), trilby.clone()],
        };
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                WISHLIST_STORAGE_KEY,
                &serde_json::json!({ "state": state, "version": 0 }).to_string(),
            )
            .unwrap();

        let wishlist = WishlistStore::open(Some(storage));
        assert_eq!(wishlist.items(), [trilby, bowler].as_slice());
    }
}
