use crate::models::driver::{Coordinate, DriverRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityQuery {
    pub origin: Coordinate,
    pub radius_km: f64,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyDriver {
    pub driver: DriverRecord,
    pub distance_km: f64,
}

/// Ranked search outcome. `drivers` is sorted by ascending distance and
/// never longer than the query limit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityResult {
    pub drivers: Vec<NearbyDriver>,
    pub origin: Coordinate,
    pub radius_km: f64,
    pub success: bool,
    pub message: String,
}

impl ProximityResult {
    pub fn found(query: &ProximityQuery, drivers: Vec<NearbyDriver>) -> Self {
        let message = format!("Found {} nearby drivers", drivers.len());
        Self {
            drivers,
            origin: query.origin,
            radius_km: query.radius_km,
            success: true,
            message,
        }
    }

    pub fn failed(query: &ProximityQuery, message: impl Into<String>) -> Self {
        Self {
            drivers: Vec::new(),
            origin: query.origin,
            radius_km: query.radius_km,
            success: false,
            message: message.into(),
        }
    }
}
