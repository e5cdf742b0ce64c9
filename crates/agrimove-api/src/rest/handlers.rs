use std::sync::Arc;

use agrimove_auth::CurrentUser;
use agrimove_core::{
    Error, LoginRequest, NewTransportRequest, NewUser, TokenResponse, TransportRequest, Truck,
    TruckList, UserProfile,
};
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::Serialize;
use tracing::info;

use crate::{ApiError, ApiState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn login(
    State(state): State<Arc<ApiState>>,
    form: Result<Form<LoginRequest>, FormRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Form(form) = form?;
    let issued = state
        .authenticator
        .login(&form.username, &form.password)
        .await?;
    Ok(Json(TokenResponse::from(issued)))
}

pub async fn register(
    State(state): State<Arc<ApiState>>,
    form: Result<Form<NewUser>, FormRejection>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let Form(form) = form?;
    let profile = state.authenticator.register(form).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn current_user(CurrentUser(identity): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&identity))
}

pub async fn create_request(
    State(state): State<Arc<ApiState>>,
    CurrentUser(identity): CurrentUser,
    body: Result<Json<NewTransportRequest>, JsonRejection>,
) -> Result<Json<TransportRequest>, ApiError> {
    let Json(request) = body?;
    let record = state.ledger.append(request).await?;
    info!(
        request_id = %record.request_id,
        submitted_by = %identity.username,
        "transport request submitted"
    );
    Ok(Json(record))
}

pub async fn list_requests(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<TransportRequest>>, ApiError> {
    Ok(Json(state.ledger.list().await?))
}

pub async fn get_request(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<TransportRequest>, ApiError> {
    match state.ledger.get(&id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(Error::RequestNotFound(id).into()),
    }
}

pub async fn find_truck() -> Json<TruckList> {
    let trucks = vec![
        Truck {
            id: "T1".to_string(),
            location: "City A".to_string(),
            capacity: 1000,
        },
        Truck {
            id: "T2".to_string(),
            location: "City B".to_string(),
            capacity: 2000,
        },
    ];
    Json(TruckList { trucks })
}
