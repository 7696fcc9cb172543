use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

pub const MAX_RATING: f64 = 5.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, AppError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(AppError::Validation(
                "coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation(format!(
                "latitude must be between -90 and 90, got {lat:.6}"
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::Validation(format!(
                "longitude must be between -180 and 180, got {lng:.6}"
            )));
        }

        Ok(Self { lat, lng })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.lat, self.lng).is_ok()
    }
}

/// Availability states owned by the driver domain. Any state may move to
/// any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DriverStatus {
    Available,
    Busy,
    #[default]
    Offline,
    OnBreak,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Available => "AVAILABLE",
            DriverStatus::Busy => "BUSY",
            DriverStatus::Offline => "OFFLINE",
            DriverStatus::OnBreak => "ON_BREAK",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(DriverStatus::Available),
            "BUSY" => Ok(DriverStatus::Busy),
            "OFFLINE" => Ok(DriverStatus::Offline),
            "ON_BREAK" => Ok(DriverStatus::OnBreak),
            other => Err(AppError::Validation(format!(
                "unknown status: {other}, expected AVAILABLE/BUSY/OFFLINE/ON_BREAK"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vehicle {
    pub plate: String,
    pub model: String,
}

/// A driver as seen by this service. Location may be unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverRecord {
    pub id: String,
    pub user_id: String,
    pub location: Option<Coordinate>,
    pub status: DriverStatus,
    pub vehicle: Vehicle,
    pub license_number: String,
    pub rating: f64,
    pub total_trips: i64,
    /// Epoch seconds of the last location or status write.
    pub updated_at: i64,
    /// Cached cell key; never used for filtering.
    pub geohash: Option<String>,
}

/// A single-field write against the owning store.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverUpdate {
    Location {
        coordinate: Coordinate,
        geohash: String,
        timestamp: i64,
    },
    Status {
        status: DriverStatus,
        timestamp: i64,
    },
}

impl DriverUpdate {
    pub fn kind(&self) -> &'static str {
        match self {
            DriverUpdate::Location { .. } => "location",
            DriverUpdate::Status { .. } => "status",
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            DriverUpdate::Location { timestamp, .. } | DriverUpdate::Status { timestamp, .. } => {
                *timestamp
            }
        }
    }
}
