//! Cart and wishlist together, with the actions that span both.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    models::Product,
    store::{
        cart::CartStore,
        hydration::{CartView, Hydrated, WishlistView},
        storage::StorageBackend,
        wishlist::{WishlistItem, WishlistStore},
    },
};

/// Size recorded for wishlist items moved into the cart.
pub const ONE_SIZE: &str = "One Size";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderSide {
    Server,
    Client,
}

/// Owner of both stores.
///
/// Every action takes `&mut self` and finishes before returning, so a
/// cross-store action is never observed half-applied. Both slots are written
/// once the in-memory transition is complete.
#[derive(Debug)]
pub struct Storefront {
    cart: CartStore,
    wishlist: WishlistStore,
    side: RenderSide,
    mounted: bool,
}

impl Storefront {
    /// A storefront for server rendering: no storage and never ready.
    pub fn server() -> Self {
        Self {
            cart: CartStore::detached(None),
            wishlist: WishlistStore::detached(None),
            side: RenderSide::Server,
            mounted: false,
        }
    }

    /// A client storefront. Persisted state is read on [`mount`](Self::mount).
    ///
    /// `None` storage runs memory-only.
    pub fn client(storage: Option<Arc<dyn StorageBackend>>) -> Self {
        Self {
            cart: CartStore::detached(storage.clone()),
            wishlist: WishlistStore::detached(storage),
            side: RenderSide::Client,
            mounted: false,
        }
    }

    /// Finish the first client mount: rehydrate both stores and open the gate.
    ///
    /// Calling it again is a no-op; on a server storefront it does nothing.
    pub fn mount(&mut self) {
        if self.side == RenderSide::Server {
            tracing::debug!("mount ignored on server storefront");
            return;
        }
        if self.mounted {
            return;
        }
        self.cart.persisted_mut().rehydrate();
        self.wishlist.persisted_mut().rehydrate();
        self.mounted = true;
        tracing::debug!(
            cart_lines = self.cart.items().len(),
            wishlist_items = self.wishlist.items().len(),
            "storefront hydrated"
        );
    }

    pub fn is_ready(&self) -> bool {
        self.mounted
    }

    pub fn use_cart(&self) -> Hydrated<CartView> {
        if !self.mounted {
            return Hydrated::pending();
        }
        Hydrated::ready(self.cart.state().into())
    }

    pub fn use_wishlist(&self) -> Hydrated<WishlistView> {
        if !self.mounted {
            return Hydrated::pending();
        }
        Hydrated::ready(self.wishlist.state().into())
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    pub fn wishlist(&self) -> &WishlistStore {
        &self.wishlist
    }

    pub fn wishlist_mut(&mut self) -> &mut WishlistStore {
        &mut self.wishlist
    }

    /// Move a cart line into the wishlist, dropping its size.
    ///
    /// The line is removed even when the product is already saved. Returns
    /// `false` when there was no such line.
    pub fn move_to_wishlist(&mut self, id: Uuid, size: &str) -> bool {
        let Some(line) = self.cart.persisted_mut().state_mut().remove_item(id, size) else {
            return false;
        };
        self.wishlist
            .persisted_mut()
            .state_mut()
            .add_item(WishlistItem::from(&line));
        self.flush_both();
        true
    }

    /// Move one wishlist item into the cart with quantity 1.
    pub fn move_to_cart(&mut self, id: Uuid, size: &str) -> bool {
        let Some(item) = self.wishlist.persisted_mut().state_mut().remove_item(id) else {
            return false;
        };
        self.cart
            .persisted_mut()
            .state_mut()
            .add_item(&product_from_wishlist(&item), size, 1);
        self.flush_both();
        true
    }

    /// Add one of every wishlist item to the cart in the placeholder size.
    ///
    /// The wishlist is left as it is. Returns the number of items added.
    pub fn add_all_to_cart(&mut self) -> usize {
        let items = self.wishlist.items().to_vec();
        let cart = self.cart.persisted_mut().state_mut();
        for item in &items {
            cart.add_item(&product_from_wishlist(item), ONE_SIZE, 1);
        }
        self.flush_both();
        items.len()
    }

    fn flush_both(&mut self) {
        self.cart.persisted_mut().flush();
        self.wishlist.persisted_mut().flush();
    }
}

// Only the fields a cart line captures matter here.
fn product_from_wishlist(item: &WishlistItem) -> Product {
    Product {
        id: item.id,
        slug: item.slug.clone(),
        name: item.name.clone(),
        description: item.description.clone(),
        price: item.price,
        sale_price: item.sale_price,
        image: item.image.clone(),
        collection: item.collection.clone(),
        sizes: Vec::new(),
        rating: 0.0,
        review_count: 0,
        created_at: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        cart::{CART_STORAGE_KEY, tests::product},
        storage::MemoryStorage,
        wishlist::WISHLIST_STORAGE_KEY,
    };

    fn mounted() -> (Storefront, Arc<dyn StorageBackend>) {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        let mut shop = Storefront::client(Some(storage.clone()));
        shop.mount();
        (shop, storage)
    }

    #[test]
    fn move_to_wishlist_removes_line_and_saves_item() {
        let (mut shop, _) = mounted();
        let fedora = product("Fedora", 50, None);
        shop.cart_mut().add_item(&fedora, "M", 2);

        assert!(shop.move_to_wishlist(fedora.id, "M"));
        assert!(shop.cart().state().is_empty());
        assert!(shop.wishlist().is_in_wishlist(fedora.id));
    }

    #[test]
    fn moving_twice_does_not_duplicate() {
        let (mut shop, _) = mounted();
        let fedora = product("Fedora", 50, None);
        shop.cart_mut().add_item(&fedora, "M", 1);
        shop.cart_mut().add_item(&fedora, "L", 1);

        assert!(shop.move_to_wishlist(fedora.id, "M"));
        assert!(shop.move_to_wishlist(fedora.id, "L"));
        assert!(!shop.move_to_wishlist(fedora.id, "L"));

        assert!(shop.cart().state().is_empty());
        assert_eq!(shop.wishlist().items().len(), 1);
    }

    #[test]
    fn move_to_wishlist_on_missing_line_changes_nothing() {
        let (mut shop, _) = mounted();
        assert!(!shop.move_to_wishlist(Uuid::new_v4(), "M"));
        assert!(shop.wishlist().state().is_empty());
    }

    #[test]
    fn add_all_to_cart_uses_one_size_and_keeps_wishlist() {
        let (mut shop, _) = mounted();
        let trilby = product("Trilby", 35, None);
        let bowler = product("Bowler", 60, Some(55));
        shop.wishlist_mut().add_item(&trilby);
        shop.wishlist_mut().add_item(&bowler);

        assert_eq!(shop.add_all_to_cart(), 2);
        assert_eq!(shop.add_all_to_cart(), 2);

        let cart = shop.cart().state();
        assert_eq!(cart.get_item(trilby.id, ONE_SIZE).unwrap().quantity, 2);
        assert_eq!(cart.get_item(bowler.id, ONE_SIZE).unwrap().effective_price(), 55);
        assert_eq!(shop.wishlist().items().len(), 2);
    }

    #[test]
    fn move_to_cart_takes_item_out_of_wishlist() {
        let (mut shop, _) = mounted();
        let trilby = product("Trilby", 35, None);
        shop.wishlist_mut().add_item(&trilby);

        assert!(shop.move_to_cart(trilby.id, ONE_SIZE));
        assert!(!shop.wishlist().is_in_wishlist(trilby.id));
        assert_eq!(shop.cart().total_items(), 1);
    }

    #[test]
    fn cross_store_moves_persist_both_slots() {
        let (mut shop, storage) = mounted();
        let fedora = product("Fedora", 50, None);
        shop.cart_mut().add_item(&fedora, "M", 1);
        shop.move_to_wishlist(fedora.id, "M");

        let mut reloaded = Storefront::client(Some(storage.clone()));
        reloaded.mount();
        assert!(reloaded.cart().state().is_empty());
        assert!(reloaded.wishlist().is_in_wishlist(fedora.id));
        assert!(storage.get(CART_STORAGE_KEY).unwrap().is_some());
        assert!(storage.get(WISHLIST_STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn accessors_report_pending_until_mounted() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorage::new());
        {
            let mut shop = Storefront::client(Some(storage.clone()));
            shop.mount();
            shop.cart_mut().add_item(&product("Fedora", 50, None), "M", 3);
        }

        let mut shop = Storefront::client(Some(storage));
        let before = shop.use_cart();
        assert!(!before.is_ready);
        assert_eq!(before.value, CartView::default());

        shop.mount();
        let after = shop.use_cart();
        assert!(after.is_ready);
        assert_eq!(after.value.total_items, 3);
        assert_eq!(after.value.subtotal, 150);
    }

    #[test]
    fn server_storefront_never_becomes_ready() {
        let mut shop = Storefront::server();
        shop.mount();
        assert!(!shop.is_ready());

        shop.wishlist_mut().add_item(&product("Trilby", 35, None));
        let view = shop.use_wishlist();
        assert!(!view.is_ready);
        assert!(view.value.is_empty());
    }
}
