//! In-memory document store
//!
//! Backs the test suite and embedded single-process deployments. Documents
//! are kept per collection in insertion order, so an empty sort yields
//! creation order, matching the behavior of a fresh document database
//! collection scan.

use super::{Condition, DocumentStore, Filter, Page, SortKey, SortOrder};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory [`DocumentStore`] implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn doc_id(doc: &Value) -> Option<&str> {
    doc.get("id").and_then(Value::as_str)
}

fn matches(doc: &Value, filter: &Filter) -> bool {
    filter.conditions().iter().all(|condition| match condition {
        Condition::Eq(field, expected) => doc.get(field).unwrap_or(&Value::Null) == expected,
        Condition::ContainsCi(field, needle) => doc
            .get(field)
            .and_then(Value::as_str)
            .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
        Condition::ArrayContains(field, expected) => doc
            .get(field)
            .and_then(Value::as_array)
            .map(|items| items.contains(expected))
            .unwrap_or(false),
    })
}

/// Total order over JSON values for sorting: null < bool < number < string
/// < everything else. RFC 3339 timestamps sort correctly as strings.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn sort_docs(docs: &mut [Value], sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for key in sort {
            let left = a.get(&key.field).unwrap_or(&Value::Null);
            let right = b.get(&key.field).unwrap_or(&Value::Null);
            let ordering = match key.order {
                SortOrder::Asc => compare_values(left, right),
                SortOrder::Desc => compare_values(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut doc: Value) -> Result<String> {
        let existing = doc_id(&doc).filter(|id| !id.is_empty()).map(str::to_string);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                if let Some(obj) = doc.as_object_mut() {
                    obj.insert("id".to_string(), Value::String(id.clone()));
                }
                id
            }
        };

        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default().push(doc);
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc_id(doc) == Some(id)))
            .cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        page: Page,
        sort: &[SortKey],
    ) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        let mut results: Vec<Value> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| matches(doc, filter)).cloned().collect())
            .unwrap_or_default();

        sort_docs(&mut results, sort);

        Ok(results
            .into_iter()
            .skip(page.skip)
            .take(page.limit)
            .collect())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(doc) = docs.iter_mut().find(|doc| doc_id(doc) == Some(id)) else {
            return Ok(0);
        };
        if let Some(obj) = doc.as_object_mut() {
            for (key, value) in fields {
                obj.insert(key, value);
            }
        }
        Ok(1)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| doc_id(doc) != Some(id));
        Ok((before - docs.len()) as u64)
    }

    async fn delete_by_filter(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| !matches(doc, filter));
        Ok((before - docs.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| matches(doc, filter)).count() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryStore::new();
        let id = store
            .insert("items", json!({"name": "first"}))
            .await
            .unwrap();
        assert!(!id.is_empty());

        let doc = store.find_by_id("items", &id).await.unwrap().unwrap();
        assert_eq!(doc["name"], "first");
        assert_eq!(doc["id"], Value::String(id));
    }

    #[tokio::test]
    async fn test_insert_keeps_existing_id() {
        let store = MemoryStore::new();
        let id = store
            .insert("items", json!({"id": "fixed", "name": "first"}))
            .await
            .unwrap();
        assert_eq!(id, "fixed");
    }

    #[tokio::test]
    async fn test_filter_eq_and_array_contains() {
        let store = MemoryStore::new();
        store
            .insert("roles", json!({"code": "admin", "permissions": ["p1", "p2"]}))
            .await
            .unwrap();
        store
            .insert("roles", json!({"code": "user", "permissions": ["p2"]}))
            .await
            .unwrap();

        let filter = Filter::new().eq("code", "admin");
        let found = store
            .find("roles", &filter, Page::default(), &[])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let filter = Filter::new().array_contains("permissions", "p2");
        assert_eq!(store.count("roles", &filter).await.unwrap(), 2);

        let filter = Filter::new().array_contains("permissions", "p1");
        assert_eq!(store.count("roles", &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_contains_ci_filter() {
        let store = MemoryStore::new();
        store
            .insert("roles", json!({"name": "Site Administrator"}))
            .await
            .unwrap();
        store.insert("roles", json!({"name": "Member"})).await.unwrap();

        let filter = Filter::new().contains_ci("name", "admin");
        let found = store
            .find("roles", &filter, Page::default(), &[])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["name"], "Site Administrator");
    }

    #[tokio::test]
    async fn test_sort_and_pagination() {
        let store = MemoryStore::new();
        for (order, name) in [(3, "c"), (1, "a"), (2, "b")] {
            store
                .insert("menus", json!({"sort_order": order, "name": name}))
                .await
                .unwrap();
        }

        let sort = [SortKey::asc("sort_order")];
        let found = store
            .find("menus", &Filter::new(), Page::default(), &sort)
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["a", "b", "c"]);

        let found = store
            .find("menus", &Filter::new(), Page::new(1, 1), &sort)
            .await
            .unwrap();
        assert_eq!(found[0]["name"], "b");
    }

    #[tokio::test]
    async fn test_multi_key_sort() {
        let store = MemoryStore::new();
        store
            .insert("perms", json!({"resource": "role", "action": "write"}))
            .await
            .unwrap();
        store
            .insert("perms", json!({"resource": "role", "action": "read"}))
            .await
            .unwrap();
        store
            .insert("perms", json!({"resource": "menu", "action": "read"}))
            .await
            .unwrap();

        let sort = [SortKey::asc("resource"), SortKey::asc("action")];
        let found = store
            .find("perms", &Filter::new(), Page::default(), &sort)
            .await
            .unwrap();
        assert_eq!(found[0]["resource"], "menu");
        assert_eq!(found[1]["action"], "read");
        assert_eq!(found[2]["action"], "write");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryStore::new();
        let id = store
            .insert("items", json!({"name": "old", "active": true}))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("new"));
        assert_eq!(store.update_fields("items", &id, fields).await.unwrap(), 1);

        let doc = store.find_by_id("items", &id).await.unwrap().unwrap();
        assert_eq!(doc["name"], "new");
        assert_eq!(doc["active"], true);

        assert_eq!(store.delete("items", &id).await.unwrap(), 1);
        assert_eq!(store.delete("items", &id).await.unwrap(), 0);
        assert!(store.find_by_id("items", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_id_matches_nothing() {
        let store = MemoryStore::new();
        let matched = store
            .update_fields("items", "missing", Map::new())
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }

    #[tokio::test]
    async fn test_delete_by_filter() {
        let store = MemoryStore::new();
        store
            .insert("user_roles", json!({"user_id": "u1", "role_id": "r1"}))
            .await
            .unwrap();
        store
            .insert("user_roles", json!({"user_id": "u1", "role_id": "r2"}))
            .await
            .unwrap();
        store
            .insert("user_roles", json!({"user_id": "u2", "role_id": "r1"}))
            .await
            .unwrap();

        let removed = store
            .delete_by_filter("user_roles", &Filter::new().eq("user_id", "u1"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("user_roles", &Filter::new()).await.unwrap(), 1);
    }
}
