//! Conversions between JSON documents and BSON.
//!
//! Handlers only ever see JSON. ObjectIds leave the store as their 24-char hex
//! form and dates as RFC 3339 strings, so clients get plain values instead of
//! extended-JSON wrappers like `{"$oid": ...}`.

use mongodb::bson::{self, oid::ObjectId, Bson, Document as BsonDocument};
use serde_json::Value;

use super::{Document, StoreError};

/// Parse a path-parameter id into an ObjectId
pub fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

pub fn to_bson_document(doc: &Document) -> Result<BsonDocument, StoreError> {
    bson::to_document(doc).map_err(|e| StoreError::Encoding(e.to_string()))
}

pub fn to_bson(value: &Value) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Encoding(e.to_string()))
}

pub fn document_to_json(doc: BsonDocument) -> Document {
    doc.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect()
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Document(doc) => Value::Object(document_to_json(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
