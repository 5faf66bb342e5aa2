//! Read models handed out by the hydration-safe accessors.
//!
//! Before the first client mount every accessor returns the empty
//! placeholder with `is_ready == false`, so a server render and the first
//! client render agree.

use uuid::Uuid;

use crate::store::{
    cart::{CartLineItem, CartState},
    wishlist::{WishlistItem, WishlistState},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated<T> {
    pub is_ready: bool,
    pub value: T,
}

impl<T: Default> Hydrated<T> {
    pub fn pending() -> Self {
        Self {
            is_ready: false,
            value: T::default(),
        }
    }
}

impl<T> Hydrated<T> {
    pub fn ready(value: T) -> Self {
        Self {
            is_ready: true,
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub total_items: u64,
    pub subtotal: i64,
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self {
            items: state.items.clone(),
            total_items: state.total_items(),
            subtotal: state.subtotal(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WishlistView {
    pub items: Vec<WishlistItem>,
}

impl WishlistView {
    pub fn contains(&self, id: Uuid) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&WishlistState> for WishlistView {
    fn from(state: &WishlistState) -> Self {
        Self {
            items: state.items.clone(),
        }
    }
}
