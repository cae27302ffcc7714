pub mod auth;
pub mod cors;

pub use auth::{jwt_auth_middleware, AuthClaims};
pub use cors::cors_layer;
