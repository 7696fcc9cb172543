use crate::mapping::driver::{encode_driver, DriverField};
use crate::mapping::{Document, DocumentBuilder};
use crate::models::driver::Coordinate;
use crate::models::mutation::{MutationOutcome, StatusOutcome};
use crate::models::proximity::{NearbyDriver, ProximityResult};

pub fn encode_location(coordinate: &Coordinate) -> Document {
    DocumentBuilder::new()
        .field("latitude", coordinate.lat)
        .field("longitude", coordinate.lng)
        .build()
}

/// Driver document plus its wire distance.
pub fn encode_nearby_driver(entry: &NearbyDriver) -> Document {
    let mut doc = encode_driver(&entry.driver, &DriverField::ALL);
    doc.extend(
        DocumentBuilder::new()
            .distance("distance", entry.distance_km)
            .build(),
    );
    doc
}

pub fn encode_proximity_result(result: &ProximityResult) -> Document {
    let drivers: Vec<Document> = result.drivers.iter().map(encode_nearby_driver).collect();

    DocumentBuilder::new()
        .field("count", drivers.len() as i64)
        .field("drivers", drivers)
        .field("searchRadius", result.radius_km)
        .field("searchLocation", encode_location(&result.origin))
        .field("success", result.success)
        .field("message", result.message.clone())
        .build()
}

pub fn encode_status_outcome(outcome: &StatusOutcome) -> Document {
    let mut doc = match &outcome.driver {
        Some(driver) => encode_driver(driver, &DriverField::ALL),
        None => Document::new(),
    };

    doc.extend(
        DocumentBuilder::new()
            .field(DriverField::DriverId.key(), outcome.driver_id.clone())
            .field("success", outcome.success)
            .field("message", outcome.message.clone())
            .build(),
    );
    doc
}

pub fn encode_mutation_outcome(outcome: &MutationOutcome) -> Document {
    let mut builder = DocumentBuilder::new()
        .field(DriverField::DriverId.key(), outcome.driver_id.clone())
        .field("success", outcome.success)
        .field("message", outcome.message.clone())
        .field(DriverField::Timestamp.key(), outcome.timestamp);

    if let Some(location) = outcome.location {
        builder = builder
            .field(DriverField::Latitude.key(), location.lat)
            .field(DriverField::Longitude.key(), location.lng)
            .optional(DriverField::Geohash.key(), outcome.geohash.clone());
    }
    if let Some(status) = outcome.status {
        builder = builder.field(DriverField::Status.key(), status.as_str().to_string());
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ZERO_DISTANCE_SENTINEL_KM;
    use crate::models::driver::{DriverRecord, DriverStatus};

    fn nearby(id: &str, distance_km: f64) -> NearbyDriver {
        NearbyDriver {
            driver: DriverRecord {
                id: id.to_string(),
                location: Some(Coordinate { lat: 10.0, lng: 20.0 }),
                status: DriverStatus::Available,
                ..DriverRecord::default()
            },
            distance_km,
        }
    }

    #[test]
    fn zero_distance_is_reported_as_sentinel() {
        let result = ProximityResult {
            drivers: vec![nearby("a", 0.0), nearby("b", 2.5)],
            origin: Coordinate { lat: 10.0, lng: 20.0 },
            radius_km: 5.0,
            success: true,
            message: "Found 2 nearby drivers".to_string(),
        };

        let doc = encode_proximity_result(&result);
        let drivers = doc["drivers"].as_array().unwrap();

        assert_eq!(doc["count"], 2);
        assert_eq!(drivers[0]["distance"], ZERO_DISTANCE_SENTINEL_KM);
        assert_eq!(drivers[1]["distance"], 2.5);
        assert_eq!(doc["searchLocation"]["latitude"], 10.0);
        assert_eq!(doc["searchRadius"], 5.0);
        assert_eq!(result.drivers[0].distance_km, 0.0);
    }

    #[test]
    fn status_update_outcome_omits_location_fields() {
        let outcome = MutationOutcome {
            driver_id: "d-9".to_string(),
            success: true,
            message: "status updated".to_string(),
            location: None,
            status: Some(DriverStatus::Busy),
            geohash: None,
            timestamp: 42,
        };

        let doc = encode_mutation_outcome(&outcome);
        assert_eq!(doc["status"], "BUSY");
        assert!(!doc.contains_key("latitude"));
        assert!(!doc.contains_key("geohash"));
    }

    #[test]
    fn missing_driver_status_keeps_requested_id() {
        let outcome = StatusOutcome {
            driver_id: "ghost".to_string(),
            driver: None,
            success: false,
            message: "driver ghost not found".to_string(),
        };

        let doc = encode_status_outcome(&outcome);
        assert_eq!(doc["driverId"], "ghost");
        assert_eq!(doc["success"], false);
        assert_eq!(doc.len(), 3);
    }
}
