use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Decoded token payload, attached to the request for downstream handlers
#[derive(Clone, Debug)]
pub struct AuthClaims(pub Map<String, Value>);

impl AuthClaims {
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }
}

impl From<Claims> for AuthClaims {
    fn from(claims: Claims) -> Self {
        Self(claims.payload)
    }
}

/// JWT authentication middleware that validates tokens and extracts the claims
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers()).map_err(|msg| {
        tracing::debug!("Rejected request to {}: {}", request.uri().path(), msg);
        ApiError::unauthorized()
    })?;

    let claims = state.tokens.verify(token)?;

    request.extensions_mut().insert(AuthClaims::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_bearer_token(&headers("abc.def.ghi")).is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        assert_eq!(extract_bearer_token(&headers("Bearer   ")), Err("Empty JWT token"));
    }

    #[test]
    fn claims_expose_email() {
        let mut payload = Map::new();
        payload.insert("email".into(), Value::from("a@b.com"));
        let claims = AuthClaims::from(Claims { payload, iat: 0, exp: 0 });
        assert_eq!(claims.email(), Some("a@b.com"));
    }
}
