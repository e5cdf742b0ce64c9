use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use agrimove_auth::Authenticator;
use agrimove_core::TransportLedger;

use crate::rest::RestRouter;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct ApiState {
    pub authenticator: Arc<Authenticator>,
    pub ledger: Arc<dyn TransportLedger>,
}

impl ApiState {
    pub fn new(authenticator: Arc<Authenticator>, ledger: Arc<dyn TransportLedger>) -> Self {
        Self {
            authenticator,
            ledger,
        }
    }
}

pub struct ApiRouter {
    state: Arc<ApiState>,
}

impl ApiRouter {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    pub fn build_rest_router(self) -> Router {
        let app = RestRouter::new(self.state.clone()).build();

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
    }
}
