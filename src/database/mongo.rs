use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document as BsonDocument},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Database,
};
use serde_json::Value;
use tracing::{debug, info};

use super::document::{bson_to_json, document_to_json, parse_object_id, to_bson, to_bson_document};
use super::{Collection, Document, DocumentStore, InsertAck, StoreError, UpdateAck};

const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed store. The client is opened once and shared by every
/// request until the process exits.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Open a client pinned to Stable API v1
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;
        info!("MongoDB client created for database {}", database_name);
        Ok(Self::new(client, database_name))
    }

    pub fn new(client: Client, database_name: &str) -> Self {
        Self {
            db: client.database(database_name),
            client,
        }
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<BsonDocument> {
        self.db.collection(collection.name())
    }
}

/// Surface unique-index violations as their own variant
fn classify_write_error(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY_CODE {
            return StoreError::DuplicateKey(write_error.message.clone());
        }
    }
    StoreError::Mongo(err)
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertAck, StoreError> {
        let doc = to_bson_document(&doc)?;
        let result = self
            .collection(collection)
            .insert_one(doc)
            .await
            .map_err(classify_write_error)?;

        debug!("Inserted into {}: {:?}", collection, result.inserted_id);
        Ok(InsertAck {
            acknowledged: true,
            inserted_id: bson_to_json(result.inserted_id),
        })
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        let docs: Vec<BsonDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(document_to_json).collect())
    }

    async fn find_one_by(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Option<Document>, StoreError> {
        let mut filter = BsonDocument::new();
        filter.insert(field, to_bson(value)?);

        let found = self.collection(collection).find_one(filter).await?;
        Ok(found.map(document_to_json))
    }

    async fn set_field_by_id(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
        upsert: bool,
    ) -> Result<UpdateAck, StoreError> {
        let oid = parse_object_id(id)?;
        let mut set = BsonDocument::new();
        set.insert(field, to_bson(&value)?);

        let result = self
            .collection(collection)
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .upsert(upsert)
            .await
            .map_err(classify_write_error)?;

        debug!(
            "Set {}.{} on {}: matched={} modified={}",
            collection, field, id, result.matched_count, result.modified_count
        );
        Ok(UpdateAck {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.map(bson_to_json),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
