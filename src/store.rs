use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub is_available: bool,
}

/// Request body for create and replace. Any `id` sent by the client is dropped here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl Item {
    fn from_input(id: u64, input: ItemInput) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            price: input.price,
            is_available: input.is_available,
        }
    }
}

#[derive(Debug)]
struct Inner {
    items: Vec<Item>,
    next_id: u64,
}

/// In-memory item collection, kept in insertion order.
#[derive(Debug)]
pub struct ItemStore {
    inner: Mutex<Inner>,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    // Each operation is a single step over the Vec, so a panic elsewhere
    // cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    pub fn get(&self, id: u64) -> Result<Item, StoreError> {
        self.lock()
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Store a new item under the next sequential id. Ids are never reused.
    pub fn create(&self, input: ItemInput) -> Item {
        let mut inner = self.lock();
        let item = Item::from_input(inner.next_id, input);
        inner.next_id += 1;
        inner.items.push(item.clone());
        item
    }

    /// Replace the item in place. The stored id is always `id`.
    pub fn update(&self, id: u64, input: ItemInput) -> Result<Item, StoreError> {
        let mut inner = self.lock();
        let slot = inner
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        *slot = Item::from_input(id, input);
        Ok(slot.clone())
    }

    pub fn delete(&self, id: u64) -> Result<Item, StoreError> {
        let mut inner = self.lock();
        let pos = inner
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(inner.items.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn input(name: &str, price: f64) -> ItemInput {
        ItemInput {
            name: name.into(),
            description: None,
            price,
            is_available: true,
        }
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = ItemStore::new();
        assert_eq!(store.create(input("a", 1.0)).id, 1);
        assert_eq!(store.create(input("b", 2.0)).id, 2);
        assert_eq!(store.create(input("c", 3.0)).id, 3);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = ItemStore::new();
        store.create(input("a", 1.0));
        let b = store.create(input("b", 2.0));
        store.delete(b.id).unwrap();
        store.delete(1).unwrap();
        assert!(store.is_empty());

        let c = store.create(input("c", 3.0));
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_client_id_is_dropped() {
        let store = ItemStore::new();
        store.create(input("first", 1.0));
        let body: ItemInput =
            serde_json::from_str(r#"{"id": 999, "name": "x", "price": 1.0}"#).unwrap();
        let item = store.create(body);
        assert_eq!(item.id, 2);
        assert!(item.is_available);
        assert_eq!(item.description, None);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let store = ItemStore::new();
        store.create(input("a", 1.0));
        store.create(input("b", 2.0));
        store.create(input("c", 3.0));
        let names: Vec<String> = store.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let store = ItemStore::new();
        store.create(input("a", 1.0));
        store.create(input("b", 2.0));
        store.create(input("c", 3.0));

        let updated = store
            .update(
                2,
                ItemInput {
                    name: "B".into(),
                    description: Some("changed".into()),
                    price: 20.0,
                    is_available: false,
                },
            )
            .unwrap();
        assert_eq!(updated.id, 2);
        assert_eq!(updated.description.as_deref(), Some("changed"));

        let items = store.list();
        assert_eq!(items[1], updated);
        assert_eq!(items[0].name, "a");
        assert_eq!(items[2].name, "c");
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let store = ItemStore::new();
        store.create(input("a", 1.0));
        assert_eq!(store.get(42), Err(StoreError::NotFound(42)));
        assert_eq!(store.update(42, input("x", 1.0)), Err(StoreError::NotFound(42)));
        assert_eq!(store.delete(42), Err(StoreError::NotFound(42)));

        store.delete(1).unwrap();
        assert_eq!(store.get(1), Err(StoreError::NotFound(1)));
        assert_eq!(store.delete(1), Err(StoreError::NotFound(1)));
    }

    #[test]
    fn test_concurrent_creates_get_unique_ids() {
        let store = Arc::new(ItemStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| store.create(input(&format!("{t}-{i}"), 1.0)).id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(ids.len(), 400);
        assert_eq!(store.len(), 400);
        assert_eq!(ids.iter().max(), Some(&400));
    }
}
