//! The four request shapes every collection route is built from.
//!
//! Each shape issues exactly one store call (two for an idempotent create)
//! and hands the store's own result back as the response body.

use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::database::{Collection, Document, InsertAck, UpdateAck};
use crate::error::ApiError;
use crate::middleware::AuthClaims;
use crate::state::AppState;
use crate::types::Role;

use super::contract::BodyContract;

/// Natural key a create route checks before inserting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueBy {
    pub field: &'static str,
    /// Body returned instead of inserting when the key is taken
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreateOutcome {
    Inserted(InsertAck),
    Exists { message: &'static str },
}

/// Insert the validated body as one new document
pub async fn create(
    state: &AppState,
    collection: Collection,
    contract: BodyContract,
    unique_by: Option<UniqueBy>,
    body: Value,
) -> Result<Json<CreateOutcome>, ApiError> {
    let doc = contract.validate(body)?;

    if let Some(unique) = unique_by {
        if let Some(value) = doc.get(unique.field) {
            if state.store.find_one_by(collection, unique.field, value).await?.is_some() {
                debug!("{} with {} {} already exists", collection, unique.field, value);
                return Ok(Json(CreateOutcome::Exists {
                    message: unique.message,
                }));
            }
        }
    }

    let ack = state.store.insert_one(collection, doc).await?;
    debug!("Created {} document {}", collection, ack.inserted_id);
    Ok(Json(CreateOutcome::Inserted(ack)))
}

/// Every document in the collection, unfiltered
pub async fn list_all(state: &AppState, collection: Collection) -> Result<Json<Vec<Document>>, ApiError> {
    let docs = state.store.find_all(collection).await?;
    Ok(Json(docs))
}

/// `{ <key>: bool }` telling whether the user with this email holds `role`.
/// A missing user is simply not in the role.
pub async fn role_check(
    state: &AppState,
    collection: Collection,
    key: &'static str,
    role: Role,
    email: String,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .store
        .find_one_by(collection, "email", &Value::String(email))
        .await?;

    let has_role = user
        .as_ref()
        .and_then(|u| u.get("role"))
        .and_then(Value::as_str)
        == Some(role.as_str());

    let mut body = Map::new();
    body.insert(key.to_string(), Value::Bool(has_role));
    Ok(Json(Value::Object(body)))
}

/// Set one field to a fixed value on the document addressed by `id`
pub async fn set_field(
    state: &AppState,
    collection: Collection,
    field: &'static str,
    value: &'static str,
    upsert: bool,
    id: String,
    actor: Option<AuthClaims>,
) -> Result<Json<UpdateAck>, ApiError> {
    let ack = state
        .store
        .set_field_by_id(collection, &id, field, Value::from(value), upsert)
        .await?;

    info!(
        "Set {}.{}={} on {} by {} (matched={}, upserted={})",
        collection,
        field,
        value,
        id,
        actor.as_ref().and_then(AuthClaims::email).unwrap_or("anonymous"),
        ack.matched_count,
        ack.upserted_count
    );
    Ok(Json(ack))
}
