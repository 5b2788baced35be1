//! Local persistence adapter for the anonymous cart.
//!
//! A durable key-value scope holding one serialized line-item array -
//! nothing more. The sync engine is the only writer; UI code never
//! touches the adapter directly. When a session is authenticated the
//! adapter is not consulted at all.

use std::sync::Mutex;

use tracing::warn;

use four_fun_core::CartSnapshot;

/// Session-scoped storage for the anonymous cart snapshot.
pub trait LocalStore: Send + Sync {
    /// Load the persisted snapshot, if any.
    fn load(&self) -> Option<CartSnapshot>;

    /// Persist a snapshot, replacing any previous one.
    fn save(&self, snapshot: &CartSnapshot);

    /// Discard the persisted snapshot.
    fn clear(&self);
}

/// In-process implementation of [`LocalStore`].
///
/// Stores the snapshot as serialized JSON, exactly what a browser-storage
/// backed adapter would hold, so serialization faults surface here rather
/// than only in production adapters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> Option<CartSnapshot> {
        let slot = self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let raw = slot.as_ref()?;
        match serde_json::from_str(raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable local cart snapshot");
                None
            }
        }
    }

    fn save(&self, snapshot: &CartSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(raw) => {
                let mut slot = self
                    .slot
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                *slot = Some(raw);
            }
            Err(e) => warn!(error = %e, "Failed to serialize local cart snapshot"),
        }
    }

    fn clear(&self) {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use four_fun_core::{Cart, EntityRef, Product, ProductId, ProductKind};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn snapshot_with_one_line() -> CartSnapshot {
        let product = Product {
            id: ProductId::new("a"),
            name: "Game".to_string(),
            description: String::new(),
            price: Decimal::new(1999, 2),
            stock: 1,
            image_url: "/placeholder.png".to_string(),
            platform: EntityRef::new("pc", "PC"),
            genre: EntityRef::new("action", "Action"),
            kind: ProductKind::Digital,
            developer: "Studio".to_string(),
            rating: 0.0,
            release_date: Utc::now(),
        };
        let mut cart = Cart::new();
        cart.add(&product, 2);
        cart.snapshot()
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = MemoryStore::new();
        let snapshot = snapshot_with_one_line();

        store.save(&snapshot);
        assert_eq!(store.load(), Some(snapshot));
    }

    #[test]
    fn test_load_empty_store() {
        let store = MemoryStore::new();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_discards_snapshot() {
        let store = MemoryStore::new();
        store.save(&snapshot_with_one_line());
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let store = MemoryStore::new();
        store.save(&snapshot_with_one_line());
        store.save(&CartSnapshot::default());
        assert_eq!(store.load(), Some(CartSnapshot::default()));
    }
}
