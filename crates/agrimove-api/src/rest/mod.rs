mod handlers;
use crate::ApiState;
use agrimove_auth::AuthLayer;
use axum::routing::{get, post};
use axum::Router;
pub use handlers::*;
use std::sync::Arc;
pub struct RestRouter {
    state: Arc<ApiState>,
}
impl RestRouter {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
    pub fn build(self) -> Router {
        let public_routes = Router::new()
            .route("/token", post(handlers::login))
            .route("/register", post(handlers::register))
            .route("/health", get(handlers::health))
            .with_state(self.state.clone());
        let protected_routes = Router::new()
            .route(
                "/api/request",
                get(handlers::list_requests).post(handlers::create_request),
            )
            .route("/api/request/{id}", get(handlers::get_request))
            .route("/api/find-truck", get(handlers::find_truck))
            .route("/users/me", get(handlers::current_user))
            .route_layer(AuthLayer::new(self.state.authenticator.clone()))
            .with_state(self.state.clone());
        Router::new().merge(public_routes).merge(protected_routes)
    }
}
