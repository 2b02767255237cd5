//! Locally persisted cart and wishlist.
//!
//! Both collections live in session storage as JSON arrays (`cart`,
//! `wishlist`) and are written back after every mutation. Corrupt stored JSON
//! loads as an empty collection.

#[cfg(test)]
#[path = "cart_test.rs"]
mod cart_test;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::api::types::Product;
use crate::storage::{SessionStorage, StorageError, load_json, save_json};

pub const CART_KEY: &str = "cart";
pub const WISHLIST_KEY: &str = "wishlist";

/// One cart line. Lines are keyed by `(product_id, size)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(alias = "_id")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub size: String,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn from_product(product: &Product, size: &str, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image: product.images.first().cloned().unwrap_or_default(),
            price: product.price,
            size: size.to_owned(),
            quantity,
        }
    }

    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    fn is_line(&self, product_id: &str, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    #[serde(alias = "_id")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl From<&Product> for WishlistItem {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            image: product.images.first().cloned().unwrap_or_default(),
            price: product.price,
            sizes: product.sizes.clone(),
        }
    }
}

// =============================================================================
// CART
// =============================================================================

pub struct Cart {
    storage: Arc<dyn SessionStorage>,
    items: Mutex<Vec<CartItem>>,
}

impl Cart {
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let items = load_json(storage.as_ref(), CART_KEY).unwrap_or_default();
        Self { storage, items: Mutex::new(items) }
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.items.lock().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Add a line, merging with an existing `(product, size)` line.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn add(&self, item: CartItem) -> Result<(), StorageError> {
        if item.quantity == 0 {
            return Ok(());
        }
        let mut items = self.items.lock();
        match items.iter_mut().find(|line| line.is_line(&item.product_id, &item.size)) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => items.push(item),
        }
        save_json(self.storage.as_ref(), CART_KEY, &*items)
    }

    /// Set a line's quantity; zero removes the line. Unknown lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn update_quantity(&self, product_id: &str, size: &str, quantity: u32) -> Result<(), StorageError> {
        if quantity == 0 {
            return self.remove(product_id, size);
        }
        let mut items = self.items.lock();
        if let Some(line) = items.iter_mut().find(|line| line.is_line(product_id, size)) {
            line.quantity = quantity;
        }
        save_json(self.storage.as_ref(), CART_KEY, &*items)
    }

    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove(&self, product_id: &str, size: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock();
        items.retain(|line| !line.is_line(product_id, size));
        save_json(self.storage.as_ref(), CART_KEY, &*items)
    }

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.items.lock().clear();
        self.storage.remove(CART_KEY)
    }

    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.lock().iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.items.lock().iter().map(CartItem::line_total).sum()
    }
}

// =============================================================================
// WISHLIST
// =============================================================================

pub struct Wishlist {
    storage: Arc<dyn SessionStorage>,
    items: Mutex<Vec<WishlistItem>>,
}

impl Wishlist {
    #[must_use]
    pub fn load(storage: Arc<dyn SessionStorage>) -> Self {
        let items = load_json(storage.as_ref(), WISHLIST_KEY).unwrap_or_default();
        Self { storage, items: Mutex::new(items) }
    }

    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.items.lock().clone()
    }

    #[must_use]
    pub fn contains(&self, product_id: &str) -> bool {
        self.items.lock().iter().any(|item| item.product_id == product_id)
    }

    /// Returns `false` when the product was already present.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be persisted.
    pub fn add(&self, item: WishlistItem) -> Result<bool, StorageError> {
        let mut items = self.items.lock();
        if items.iter().any(|existing| existing.product_id == item.product_id) {
            return Ok(false);
        }
        items.push(item);
        save_json(self.storage.as_ref(), WISHLIST_KEY, &*items)?;
        Ok(true)
    }

    /// Returns `false` when the product was not present.
    ///
    /// # Errors
    ///
    /// Returns an error if the wishlist cannot be persisted.
    pub fn remove(&self, product_id: &str) -> Result<bool, StorageError> {
        let mut items = self.items.lock();
        let before = items.len();
        items.retain(|item| item.product_id != product_id);
        if items.len() == before {
            return Ok(false);
        }
        save_json(self.storage.as_ref(), WISHLIST_KEY, &*items)?;
        Ok(true)
    }

    /// Move a product into `cart` with `size` (or its first listed size).
    /// Returns `false` when the product is not on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if either collection cannot be persisted.
    pub fn move_to_cart(&self, product_id: &str, size: Option<&str>, cart: &Cart) -> Result<bool, StorageError> {
        let Some(item) = self.items.lock().iter().find(|item| item.product_id == product_id).cloned() else {
            return Ok(false);
        };
        let size = size
            .map(str::to_owned)
            .or_else(|| item.sizes.first().cloned())
            .unwrap_or_default();
        cart.add(CartItem {
            product_id: item.product_id.clone(),
            name: item.name,
            image: item.image,
            price: item.price,
            size,
            quantity: 1,
        })?;
        self.remove(&item.product_id)?;
        tracing::debug!(%product_id, "moved wishlist item to cart");
        Ok(true)
    }
}
