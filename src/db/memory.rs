//! In-process document store, used when no database is configured and in tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Collection, DeleteResult, Document, InsertOneResult, UpdateResult, ID_FIELD};
use super::store::{
    compare_field, natural_key, DocumentStore, Filter, FindOptions, SortOrder, StoreError,
};

/// Collections kept in insertion order behind a single lock, so conditional
/// inserts observe and mutate the same snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(mut doc: Document) -> (String, Document) {
        let id = Uuid::new_v4().to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        (id, doc)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_one(
        &self,
        collection: Collection,
        doc: Document,
    ) -> Result<InsertOneResult, StoreError> {
        let (id, doc) = Self::assign_id(doc);
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push(doc);
        Ok(InsertOneResult::new(id))
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        key_fields: &[&str],
        doc: Document,
    ) -> Result<Option<InsertOneResult>, StoreError> {
        let key = natural_key(&doc, key_fields)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        for existing in docs.iter() {
            if natural_key(existing, key_fields)? == key {
                return Ok(None);
            }
        }

        let (id, doc) = Self::assign_id(doc);
        docs.push(doc);
        Ok(Some(InsertOneResult::new(id)))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut found: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = &options.sort {
            // sort_by is stable, so ties keep insertion order
            found.sort_by(|a, b| {
                let ord = compare_field(a.get(&sort.field), b.get(&sort.field));
                match sort.order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = options.limit {
            found.truncate(limit);
        }

        Ok(found)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)));

        let Some(doc) = target else {
            return Ok(UpdateResult::new(0, 0));
        };

        let mut modified = false;
        for (field, value) in set {
            if field == ID_FIELD {
                continue;
            }
            if doc.get(&field) != Some(&value) {
                doc.insert(field, value);
                modified = true;
            }
        }

        Ok(UpdateResult::new(1, u64::from(modified)))
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::new(0));
        };

        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        let _ = self.collections.read().await;
        Ok(start.elapsed())
    }
}
