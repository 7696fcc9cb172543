use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::mapping::response::{
    encode_mutation_outcome, encode_proximity_result, encode_status_outcome,
};
use crate::mapping::Document;
use crate::models::driver::{Coordinate, DriverStatus};
use crate::models::proximity::ProximityQuery;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers/nearby", get(find_nearby))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/location", put(update_location))
        .route("/drivers/:id/status", put(update_status))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyParams {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

async fn find_nearby(
    State(state): State<Arc<AppState>>,
    params: Result<Query<NearbyParams>, QueryRejection>,
) -> Result<Json<Document>, AppError> {
    let Query(params) = params?;
    let query = ProximityQuery {
        origin: Coordinate {
            lat: params.latitude,
            lng: params.longitude,
        },
        radius_km: params.radius_km,
        limit: params.limit.unwrap_or(state.config.default_limit),
    };

    let result = state.proximity.find_nearby(query).await?;
    Ok(Json(encode_proximity_result(&result)))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let outcome = state.status.driver_status(&id).await?;
    Ok(Json(encode_status_outcome(&outcome)))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> Result<Json<Document>, AppError> {
    let Json(payload) = payload?;
    info!(driver_id = %id, lat = payload.latitude, lng = payload.longitude, "http location update");

    let coordinate = Coordinate {
        lat: payload.latitude,
        lng: payload.longitude,
    };
    let outcome = state.mutations.update_location(&id, coordinate).await?;
    Ok(Json(encode_mutation_outcome(&outcome)))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Document>, AppError> {
    let Json(payload) = payload?;
    let status: DriverStatus = payload.status.parse()?;
    info!(driver_id = %id, %status, "http status update");

    let outcome = state.mutations.update_status(&id, status).await?;
    Ok(Json(encode_mutation_outcome(&outcome)))
}
