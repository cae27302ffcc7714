use std::sync::Arc;

use crate::auth::TokenService;
use crate::database::DocumentStore;

/// Process-wide resources handed to every route at registration time
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<TokenService>,
    /// When false, routes marked protected run without a token check
    pub enforce_auth: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService, enforce_auth: bool) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            enforce_auth,
        }
    }
}
