use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::document::parse_object_id;
use super::{Collection, Document, DocumentStore, InsertAck, StoreError, UpdateAck};

/// In-process store with the same observable semantics as MongoStore.
/// Documents keep insertion order within each collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a collection, e.g. the read-only catalog data
    pub async fn seed(&self, collection: Collection, docs: Vec<Document>) -> Result<(), StoreError> {
        for doc in docs {
            self.insert_one(collection, doc).await?;
        }
        Ok(())
    }

    pub async fn count(&self, collection: Collection) -> usize {
        let collections = self.collections.read().await;
        collections.get(&collection).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertAck, StoreError> {
        let id = doc
            .entry("_id")
            .or_insert_with(|| Value::String(ObjectId::new().to_hex()))
            .clone();

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(StoreError::DuplicateKey(format!("{} _id {}", collection, id)));
        }
        docs.push(doc);

        Ok(InsertAck {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_one_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.get(field) == Some(value)))
            .cloned())
    }

    async fn set_field_by_id(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
        upsert: bool,
    ) -> Result<UpdateAck, StoreError> {
        // Same id rules as the driver: only well-formed ObjectIds address documents
        let id = Value::String(parse_object_id(id)?.to_hex());

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if let Some(doc) = docs.iter_mut().find(|d| d.get("_id") == Some(&id)) {
            let modified = doc.get(field) != Some(&value);
            if modified {
                doc.insert(field.to_string(), value);
            }
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_count: 0,
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_count: 0,
                upserted_id: None,
            });
        }

        let mut doc = Document::new();
        doc.insert("_id".to_string(), id.clone());
        doc.insert(field.to_string(), value);
        docs.push(doc);

        Ok(UpdateAck {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn insert_generates_object_id() {
        let store = MemoryStore::new();
        let ack = store
            .insert_one(Collection::Selected, doc(json!({ "name": "Piano" })))
            .await
            .unwrap();

        assert!(ack.acknowledged);
        let id = ack.inserted_id.as_str().unwrap();
        assert!(ObjectId::parse_str(id).is_ok());

        let all = store.find_all(Collection::Selected).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0]["_id"], json!(id));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = MemoryStore::new();
        let id = ObjectId::new().to_hex();
        store
            .insert_one(Collection::Classes, doc(json!({ "_id": id })))
            .await
            .unwrap();
        let err = store
            .insert_one(Collection::Classes, doc(json!({ "_id": id })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.count(Collection::Classes).await, 1);
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store = MemoryStore::new();
        for name in ["violin", "cello", "viola"] {
            store
                .insert_one(Collection::Classes, doc(json!({ "name": name })))
                .await
                .unwrap();
        }
        let names: Vec<_> = store
            .find_all(Collection::Classes)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("violin"), json!("cello"), json!("viola")]);
        assert!(store.find_all(Collection::Instructors).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_one_by_matches_field() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Users, doc(json!({ "email": "a@b.com", "role": "admin" })))
            .await
            .unwrap();

        let found = store
            .find_one_by(Collection::Users, "email", &json!("a@b.com"))
            .await
            .unwrap();
        assert_eq!(found.unwrap()["role"], json!("admin"));

        let missing = store
            .find_one_by(Collection::Users, "email", &json!("x@y.com"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn set_field_updates_only_that_field() {
        let store = MemoryStore::new();
        let ack = store
            .insert_one(Collection::Users, doc(json!({ "email": "a@b.com", "name": "Ann" })))
            .await
            .unwrap();
        let id = ack.inserted_id.as_str().unwrap().to_string();

        let update = store
            .set_field_by_id(Collection::Users, &id, "role", json!("admin"), false)
            .await
            .unwrap();
        assert_eq!(update.matched_count, 1);
        assert_eq!(update.modified_count, 1);

        let again = store
            .set_field_by_id(Collection::Users, &id, "role", json!("admin"), false)
            .await
            .unwrap();
        assert_eq!(again.matched_count, 1);
        assert_eq!(again.modified_count, 0);

        let user = store
            .find_one_by(Collection::Users, "email", &json!("a@b.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user["role"], json!("admin"));
        assert_eq!(user["name"], json!("Ann"));
    }

    #[tokio::test]
    async fn set_field_without_upsert_leaves_missing_documents_alone() {
        let store = MemoryStore::new();
        let id = ObjectId::new().to_hex();
        let ack = store
            .set_field_by_id(Collection::Users, &id, "role", json!("instructor"), false)
            .await
            .unwrap();
        assert_eq!(ack.matched_count, 0);
        assert_eq!(ack.upserted_count, 0);
        assert_eq!(store.count(Collection::Users).await, 0);
    }

    #[tokio::test]
    async fn set_field_with_upsert_creates_document() {
        let store = MemoryStore::new();
        let id = ObjectId::new().to_hex();
        let ack = store
            .set_field_by_id(Collection::AddedClasses, &id, "status", json!("approved"), true)
            .await
            .unwrap();
        assert_eq!(ack.upserted_count, 1);
        assert_eq!(ack.upserted_id, Some(json!(id)));

        let all = store.find_all(Collection::AddedClasses).await.unwrap();
        assert_eq!(all, vec![doc(json!({ "_id": id, "status": "approved" }))]);
    }

    #[tokio::test]
    async fn malformed_id_is_an_error() {
        let store = MemoryStore::new();
        let err = store
            .set_field_by_id(Collection::Users, "abc", "role", json!("admin"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }
}
