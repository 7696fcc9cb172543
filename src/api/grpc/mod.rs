use std::sync::Arc;

use chrono::Utc;
use tonic::{Request, Response, Status};
use tracing::info;

use crate::mapping::wire_distance;
use crate::models::driver::{Coordinate, DriverStatus};
use crate::models::mutation::{MutationOutcome, StatusOutcome};
use crate::models::proximity::{NearbyDriver, ProximityQuery, ProximityResult};
use crate::state::{AppState, HEALTH_MESSAGE, SERVICE_NAME};

pub mod pb {
    tonic::include_proto!("driver");
}

use pb::driver_service_server::DriverService;
use pb::{
    DriverInfo, FindNearbyDriversRequest, FindNearbyDriversResponse, GetDriverStatusRequest,
    GetDriverStatusResponse, HealthCheckRequest, HealthCheckResponse, Location,
    UpdateDriverLocationRequest, UpdateDriverLocationResponse, UpdateDriverStatusRequest,
    UpdateDriverStatusResponse,
};

pub struct GrpcDriverService {
    state: Arc<AppState>,
}

impl GrpcDriverService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

fn location_to_proto(c: &Coordinate) -> Location {
    Location {
        latitude: c.lat,
        longitude: c.lng,
    }
}

fn nearby_to_proto(entry: &NearbyDriver) -> DriverInfo {
    let d = &entry.driver;
    let location = d.location.unwrap_or(Coordinate { lat: 0.0, lng: 0.0 });

    DriverInfo {
        driver_id: d.id.clone(),
        user_id: d.user_id.clone(),
        latitude: location.lat,
        longitude: location.lng,
        distance: wire_distance(entry.distance_km),
        status: d.status.to_string(),
        vehicle_plate: d.vehicle.plate.clone(),
        vehicle_model: d.vehicle.model.clone(),
        rating: d.rating,
        timestamp: d.updated_at,
        geohash: d.geohash.clone().unwrap_or_default(),
    }
}

fn result_to_proto(result: &ProximityResult) -> FindNearbyDriversResponse {
    let drivers: Vec<DriverInfo> = result.drivers.iter().map(nearby_to_proto).collect();

    FindNearbyDriversResponse {
        count: drivers.len() as i32,
        drivers,
        search_radius: result.radius_km,
        search_location: Some(location_to_proto(&result.origin)),
        success: result.success,
        message: result.message.clone(),
    }
}

fn status_to_proto(outcome: StatusOutcome) -> GetDriverStatusResponse {
    let mut response = GetDriverStatusResponse {
        driver_id: outcome.driver_id,
        success: outcome.success,
        message: outcome.message,
        ..Default::default()
    };

    if let Some(driver) = outcome.driver {
        response.user_id = driver.user_id;
        response.status = driver.status.to_string();
        response.vehicle_model = driver.vehicle.model;
        response.vehicle_plate = driver.vehicle.plate;
        response.license_number = driver.license_number;
        response.rating = driver.rating;
        response.total_trips = i32::try_from(driver.total_trips).unwrap_or(i32::MAX);
        response.location = driver.location.as_ref().map(location_to_proto);
        response.timestamp = driver.updated_at;
    }

    response
}

fn parse_limit(raw: i32) -> Result<u32, Status> {
    match u32::try_from(raw) {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(Status::invalid_argument("limit must be greater than 0")),
    }
}

fn location_outcome_to_proto(
    outcome: MutationOutcome,
    req: &UpdateDriverLocationRequest,
) -> UpdateDriverLocationResponse {
    UpdateDriverLocationResponse {
        driver_id: outcome.driver_id,
        latitude: req.latitude,
        longitude: req.longitude,
        timestamp: outcome.timestamp,
        geohash: outcome.geohash.unwrap_or_default(),
        success: outcome.success,
        message: outcome.message,
    }
}

#[tonic::async_trait]
impl DriverService for GrpcDriverService {
    async fn health_check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        Ok(Response::new(HealthCheckResponse {
            service: SERVICE_NAME.to_string(),
            status: "UP".to_string(),
            timestamp: Utc::now().timestamp(),
            message: HEALTH_MESSAGE.to_string(),
        }))
    }

    async fn find_nearby_drivers(
        &self,
        request: Request<FindNearbyDriversRequest>,
    ) -> Result<Response<FindNearbyDriversResponse>, Status> {
        let req = request.into_inner();
        info!(
            lat = req.latitude,
            lng = req.longitude,
            radius_km = req.radius_km,
            limit = req.limit,
            "grpc FindNearbyDrivers"
        );

        let query = ProximityQuery {
            origin: Coordinate {
                lat: req.latitude,
                lng: req.longitude,
            },
            radius_km: req.radius_km,
            limit: parse_limit(req.limit)?,
        };

        let result = self.state.proximity.find_nearby(query).await?;
        Ok(Response::new(result_to_proto(&result)))
    }

    async fn get_driver_status(
        &self,
        request: Request<GetDriverStatusRequest>,
    ) -> Result<Response<GetDriverStatusResponse>, Status> {
        let req = request.into_inner();
        info!(driver_id = %req.driver_id, "grpc GetDriverStatus");

        let outcome = self.state.status.driver_status(&req.driver_id).await?;
        Ok(Response::new(status_to_proto(outcome)))
    }

    async fn update_driver_location(
        &self,
        request: Request<UpdateDriverLocationRequest>,
    ) -> Result<Response<UpdateDriverLocationResponse>, Status> {
        let req = request.into_inner();
        info!(
            driver_id = %req.driver_id,
            lat = req.latitude,
            lng = req.longitude,
            "grpc UpdateDriverLocation"
        );

        let coordinate = Coordinate {
            lat: req.latitude,
            lng: req.longitude,
        };
        let outcome = self
            .state
            .mutations
            .update_location(&req.driver_id, coordinate)
            .await?;

        Ok(Response::new(location_outcome_to_proto(outcome, &req)))
    }

    async fn update_driver_status(
        &self,
        request: Request<UpdateDriverStatusRequest>,
    ) -> Result<Response<UpdateDriverStatusResponse>, Status> {
        let req = request.into_inner();
        info!(driver_id = %req.driver_id, status = %req.status, "grpc UpdateDriverStatus");

        let status: DriverStatus = req.status.parse()?;
        let outcome = self
            .state
            .mutations
            .update_status(&req.driver_id, status)
            .await?;

        Ok(Response::new(UpdateDriverStatusResponse {
            driver_id: outcome.driver_id,
            status: status.to_string(),
            timestamp: outcome.timestamp,
            success: outcome.success,
            message: outcome.message,
        }))
    }
}
