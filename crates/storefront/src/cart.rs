//! Cart persisted in device storage.
//!
//! [`CartManager`] loads the cart once when opened and writes it back after
//! every change, so a restarted client picks up where it left off. A change
//! only reaches memory once it has been saved.

use rust_decimal::Decimal;

use lima_rose_core::{Cart, CartError, CartItem, Product, ProductId};

use crate::error::StorefrontError;
use crate::storage::{DeviceStorage, Namespaced};

/// Storage name of the cart, before the namespace prefix.
pub const CART_KEY: &str = "cart";

/// A cart bound to device storage.
#[derive(Debug)]
pub struct CartManager<S> {
    storage: Namespaced<S>,
    cart: Cart,
}

impl<S: DeviceStorage> CartManager<S> {
    /// Open the stored cart, or an empty one when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Storage` if storage cannot be read.
    pub fn open(storage: Namespaced<S>) -> Result<Self, StorefrontError> {
        let cart = storage.load::<Cart>(CART_KEY)?.unwrap_or_default();
        tracing::debug!(lines = cart.line_count(), "Opened cart");
        Ok(Self { storage, cart })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.cart.subtotal()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns a cart error for a zero quantity or a full cart, or a storage
    /// error if the cart cannot be saved.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<CartItem, StorefrontError> {
        self.commit(|cart| cart.add(product, quantity).cloned())
    }

    /// Remove a line. Returns the removed line, if there was one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cart cannot be saved.
    pub fn remove(&mut self, product_id: ProductId) -> Result<Option<CartItem>, StorefrontError> {
        let mut next = self.cart.clone();
        let removed = next.remove(product_id);
        if removed.is_some() {
            self.storage.save(CART_KEY, &next)?;
            self.cart = next;
        }
        Ok(removed)
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns a cart error if the product is not in the cart, or a storage
    /// error if the cart cannot be saved.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), StorefrontError> {
        self.commit(|cart| cart.update_quantity(product_id, quantity))
    }

    /// # Errors
    ///
    /// Same as [`update_quantity`](Self::update_quantity).
    pub fn increase(&mut self, product_id: ProductId) -> Result<(), StorefrontError> {
        self.commit(|cart| cart.increase(product_id))
    }

    /// Decrease by one; a line at 1 is removed.
    ///
    /// # Errors
    ///
    /// Same as [`update_quantity`](Self::update_quantity).
    pub fn decrease(&mut self, product_id: ProductId) -> Result<(), StorefrontError> {
        self.commit(|cart| cart.decrease(product_id))
    }

    /// Empty the cart and drop it from storage.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the stored cart cannot be removed.
    pub fn clear(&mut self) -> Result<(), StorefrontError> {
        self.storage.remove(CART_KEY)?;
        self.cart.clear();
        Ok(())
    }

    /// Apply `change` to a copy of the cart, save the copy, then keep it.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Cart) -> Result<T, CartError>,
    ) -> Result<T, StorefrontError> {
        let mut next = self.cart.clone();
        let out = change(&mut next)?;
        self.storage.save(CART_KEY, &next)?;
        self.cart = next;
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use lima_rose_core::NewProduct;

    use super::*;
    use crate::storage::{FileStorage, MemoryStorage, StorageError};

    fn product(id: i64, price: Decimal) -> Product {
        NewProduct::new(format!("Flor {id}"), price).into_product(ProductId::new(id), chrono::Utc::now())
    }

    fn memory_manager() -> CartManager<MemoryStorage> {
        CartManager::open(Namespaced::new(MemoryStorage::new(), "limarose_")).unwrap()
    }

    #[test]
    fn test_add_saves_under_prefixed_key() {
        let mut manager = memory_manager();
        manager.add(&product(1, Decimal::new(1000, 2)), 2).unwrap();

        let stored = manager.storage.inner().get("limarose_cart").unwrap().unwrap();
        let cart: Cart = serde_json::from_str(&stored).unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_cart_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("limarose-cart-{}", uuid::Uuid::new_v4()));
        {
            let mut manager =
                CartManager::open(Namespaced::new(FileStorage::new(&dir), "limarose_")).unwrap();
            manager.add(&product(1, Decimal::new(2099, 1)), 1).unwrap();
            manager.add(&product(2, Decimal::new(500, 1)), 3).unwrap();
            manager.add(&product(1, Decimal::new(2099, 1)), 1).unwrap();
        }

        let reopened =
            CartManager::open(Namespaced::new(FileStorage::new(&dir), "limarose_")).unwrap();
        assert_eq!(reopened.items().len(), 2);
        assert_eq!(reopened.item_count(), 5);
        assert_eq!(reopened.subtotal(), Decimal::new(5698, 1));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_decrease_and_clear() {
        let mut manager = memory_manager();
        manager.add(&product(1, Decimal::ONE), 1).unwrap();
        manager.decrease(ProductId::new(1)).unwrap();
        assert!(manager.is_empty());

        manager.add(&product(2, Decimal::ONE), 4).unwrap();
        manager.clear().unwrap();
        assert!(manager.is_empty());
        assert!(manager.storage.inner().get("limarose_cart").unwrap().is_none());
    }

    #[test]
    fn test_errors_leave_storage_untouched() {
        let mut manager = memory_manager();
        let err = manager.add(&product(1, Decimal::ONE), 0).unwrap_err();
        assert!(matches!(err, StorefrontError::Cart(CartError::ZeroQuantity)));
        assert!(manager.storage.inner().keys().is_empty());

        let err = manager.increase(ProductId::new(9)).unwrap_err();
        assert!(matches!(err, StorefrontError::Cart(CartError::NotInCart(_))));
    }

    /// Memory storage whose writes can be switched off.
    struct ReadOnlyAfter {
        inner: MemoryStorage,
        read_only: AtomicBool,
    }

    impl DeviceStorage for ReadOnlyAfter {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.read_only.load(Ordering::SeqCst) {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source: std::io::Error::other("read-only"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.set(key, "")?;
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_save_keeps_memory_in_sync_with_storage() {
        let storage = ReadOnlyAfter {
            inner: MemoryStorage::new(),
            read_only: AtomicBool::new(false),
        };
        let mut manager = CartManager::open(Namespaced::new(storage, "limarose_")).unwrap();
        manager.add(&product(1, Decimal::ONE), 2).unwrap();
        manager.storage.inner().read_only.store(true, Ordering::SeqCst);

        assert!(manager.add(&product(2, Decimal::ONE), 1).is_err());
        assert!(manager.increase(ProductId::new(1)).is_err());
        assert!(manager.remove(ProductId::new(1)).is_err());
        assert!(manager.clear().is_err());

        assert_eq!(manager.items().len(), 1);
        assert_eq!(manager.item_count(), 2);
        let stored = manager.storage.inner().get("limarose_cart").unwrap().unwrap();
        let cart: Cart = serde_json::from_str(&stored).unwrap();
        assert_eq!(&cart, manager.cart());
    }
}
