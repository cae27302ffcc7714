use serde_json::Value;
use std::collections::BTreeMap;

use crate::database::Document;
use crate::error::ApiError;

/// Identity is always assigned by the store
const STORE_FIELDS: &[&str] = &["_id"];

/// Boundary check for a create route's request body.
///
/// Bodies are otherwise free-form documents; the contract only pins down the
/// fields a route relies on and the ones a client must not choose for itself.
/// `_id` is refused on every route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyContract {
    /// Fields that must be present as non-empty strings
    pub required: &'static [&'static str],
    /// Fields only the server may set
    pub forbidden: &'static [&'static str],
}

impl BodyContract {
    /// Any JSON object without a client-chosen `_id`
    pub const ANY: Self = Self {
        required: &[],
        forbidden: &[],
    };

    pub fn validate(&self, body: Value) -> Result<Document, ApiError> {
        let Value::Object(doc) = body else {
            return Err(ApiError::invalid_json("Request body must be a JSON object"));
        };

        let mut field_errors = BTreeMap::new();

        for &field in self.required {
            let problem = match doc.get(field) {
                None | Some(Value::Null) => Some("This field is required"),
                Some(Value::String(s)) if s.trim().is_empty() => Some("Must be a non-empty string"),
                Some(Value::String(s)) if field == "email" && !s.contains('@') => {
                    Some("Must be an email address")
                }
                Some(Value::String(_)) => None,
                Some(_) => Some("Must be a non-empty string"),
            };
            if let Some(problem) = problem {
                field_errors.insert(field.to_string(), problem.to_string());
            }
        }

        for &field in STORE_FIELDS.iter().chain(self.forbidden) {
            if doc.contains_key(field) {
                field_errors.insert(field.to_string(), "This field cannot be set by the client".to_string());
            }
        }

        if field_errors.is_empty() {
            Ok(doc)
        } else {
            Err(ApiError::validation_error("Invalid request body", field_errors))
        }
    }
}
