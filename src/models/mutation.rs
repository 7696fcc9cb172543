use crate::models::driver::{Coordinate, DriverRecord, DriverStatus};

/// Result of a location or status write.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub driver_id: String,
    pub success: bool,
    pub message: String,
    pub location: Option<Coordinate>,
    pub status: Option<DriverStatus>,
    pub geohash: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusOutcome {
    pub driver_id: String,
    pub driver: Option<DriverRecord>,
    pub success: bool,
    pub message: String,
}
