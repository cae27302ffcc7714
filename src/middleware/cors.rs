use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Cross-origin policy for the whole app.
///
/// With no configured origins any origin is accepted with credentials: the
/// request origin is mirrored back, since `*` cannot be combined with
/// credentials. Otherwise only the listed origins are allowed.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::very_permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::very_permissive().allow_origin(AllowOrigin::list(origins))
}
