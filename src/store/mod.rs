//! Client-side cart and wishlist state.
//!
//! Each store keeps its collection in memory and mirrors it into a durable
//! local slot after every action. [`Storefront`] owns both stores, runs the
//! actions that span them, and gates reads behind the hydration flag.

pub mod cart;
pub mod hydration;
pub mod persist;
pub mod storage;
pub mod storefront;
pub mod wishlist;

pub use cart::{CART_STORAGE_KEY, CartLineItem, CartState, CartStore};
pub use hydration::{CartView, Hydrated, WishlistView};
pub use persist::{PersistedStore, STORE_VERSION, StoreState};
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
pub use storefront::{ONE_SIZE, Storefront};
pub use wishlist::{WISHLIST_STORAGE_KEY, WishlistItem, WishlistState, WishlistStore};
