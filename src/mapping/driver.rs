use crate::mapping::{field, optional_field, Document, DocumentBuilder};
use crate::models::driver::{
    Coordinate, DriverRecord, DriverStatus, DriverUpdate, Vehicle, MAX_RATING,
};

/// Keys of the upstream driver document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverField {
    DriverId,
    UserId,
    Latitude,
    Longitude,
    Status,
    VehiclePlate,
    VehicleModel,
    LicenseNumber,
    Rating,
    TotalTrips,
    Timestamp,
    Geohash,
}

impl DriverField {
    pub const ALL: [DriverField; 12] = [
        DriverField::DriverId,
        DriverField::UserId,
        DriverField::Latitude,
        DriverField::Longitude,
        DriverField::Status,
        DriverField::VehiclePlate,
        DriverField::VehicleModel,
        DriverField::LicenseNumber,
        DriverField::Rating,
        DriverField::TotalTrips,
        DriverField::Timestamp,
        DriverField::Geohash,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DriverField::DriverId => "driverId",
            DriverField::UserId => "userId",
            DriverField::Latitude => "latitude",
            DriverField::Longitude => "longitude",
            DriverField::Status => "status",
            DriverField::VehiclePlate => "vehiclePlate",
            DriverField::VehicleModel => "vehicleModel",
            DriverField::LicenseNumber => "licenseNumber",
            DriverField::Rating => "rating",
            DriverField::TotalTrips => "totalTrips",
            DriverField::Timestamp => "timestamp",
            DriverField::Geohash => "geohash",
        }
    }
}

/// Decodes one driver document. Values of the right kind that are not legal
/// domain values (unknown status, out-of-range coordinates) keep the default.
pub fn decode_driver(doc: &Document) -> DriverRecord {
    let defaults = DriverRecord::default();

    let status = optional_field::<String>(doc, DriverField::Status.key())
        .and_then(|raw| raw.parse::<DriverStatus>().ok())
        .unwrap_or(defaults.status);

    let rating = optional_field::<f64>(doc, DriverField::Rating.key())
        .filter(|rating| (0.0..=MAX_RATING).contains(rating))
        .unwrap_or(defaults.rating);

    DriverRecord {
        id: field(doc, DriverField::DriverId.key(), defaults.id),
        user_id: field(doc, DriverField::UserId.key(), defaults.user_id),
        location: decode_location(doc),
        status,
        vehicle: Vehicle {
            plate: field(doc, DriverField::VehiclePlate.key(), defaults.vehicle.plate),
            model: field(doc, DriverField::VehicleModel.key(), defaults.vehicle.model),
        },
        license_number: field(doc, DriverField::LicenseNumber.key(), defaults.license_number),
        rating,
        total_trips: field(doc, DriverField::TotalTrips.key(), defaults.total_trips),
        updated_at: field(doc, DriverField::Timestamp.key(), defaults.updated_at),
        geohash: optional_field(doc, DriverField::Geohash.key()),
    }
}

fn decode_location(doc: &Document) -> Option<Coordinate> {
    let lat = optional_field::<f64>(doc, DriverField::Latitude.key())?;
    let lng = optional_field::<f64>(doc, DriverField::Longitude.key())?;
    Coordinate::new(lat, lng).ok()
}

/// Encodes exactly `fields` of `record`.
pub fn encode_driver(record: &DriverRecord, fields: &[DriverField]) -> Document {
    fields.iter().fold(DocumentBuilder::new(), |builder, selected| {
        let key = selected.key();
        match selected {
            DriverField::DriverId => builder.field(key, record.id.clone()),
            DriverField::UserId => builder.field(key, record.user_id.clone()),
            DriverField::Latitude => builder.optional(key, record.location.map(|c| c.lat)),
            DriverField::Longitude => builder.optional(key, record.location.map(|c| c.lng)),
            DriverField::Status => builder.field(key, record.status.as_str().to_string()),
            DriverField::VehiclePlate => builder.field(key, record.vehicle.plate.clone()),
            DriverField::VehicleModel => builder.field(key, record.vehicle.model.clone()),
            DriverField::LicenseNumber => builder.field(key, record.license_number.clone()),
            DriverField::Rating => builder.field(key, record.rating),
            DriverField::TotalTrips => builder.field(key, record.total_trips),
            DriverField::Timestamp => builder.field(key, record.updated_at),
            DriverField::Geohash => builder.optional(key, record.geohash.clone()),
        }
    })
    .build()
}

/// Outbound write body for a single-field update.
pub fn encode_update(update: &DriverUpdate) -> Document {
    match update {
        DriverUpdate::Location { coordinate, .. } => DocumentBuilder::new()
            .field(DriverField::Latitude.key(), coordinate.lat)
            .field(DriverField::Longitude.key(), coordinate.lng)
            .build(),
        DriverUpdate::Status { status, .. } => DocumentBuilder::new()
            .field(DriverField::Status.key(), status.as_str().to_string())
            .build(),
    }
}

/// `{drivers, success, message}` as returned by the nearby endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyEnvelope {
    pub drivers: Vec<DriverRecord>,
    pub success: bool,
    pub message: String,
}

pub fn decode_nearby_envelope(doc: &Document) -> NearbyEnvelope {
    let drivers: Vec<Document> = field(doc, "drivers", Vec::new());
    NearbyEnvelope {
        drivers: drivers.iter().map(decode_driver).collect(),
        success: field(doc, "success", true),
        message: field(doc, "message", String::new()),
    }
}

/// Acknowledgement body of an upstream write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteAck {
    pub success: bool,
    pub message: String,
    pub timestamp: Option<i64>,
    pub geohash: Option<String>,
}

pub fn decode_write_ack(doc: &Document) -> WriteAck {
    WriteAck {
        success: field(doc, "success", true),
        message: field(doc, "message", String::new()),
        timestamp: optional_field(doc, DriverField::Timestamp.key()),
        geohash: optional_field(doc, DriverField::Geohash.key()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn full_document_decodes_every_field() {
        let record = decode_driver(&doc(json!({
            "driverId": "d-1",
            "userId": "u-1",
            "latitude": 10.77,
            "longitude": 106.70,
            "distance": 1.2,
            "status": "AVAILABLE",
            "vehiclePlate": "51A-12345",
            "vehicleModel": "Vios",
            "rating": 4.8,
            "totalTrips": 120,
            "timestamp": 1700000000.0,
            "geohash": "w3gvk1zz"
        })));

        assert_eq!(record.id, "d-1");
        assert_eq!(record.user_id, "u-1");
        assert_eq!(record.location, Some(Coordinate { lat: 10.77, lng: 106.70 }));
        assert_eq!(record.status, DriverStatus::Available);
        assert_eq!(record.vehicle.plate, "51A-12345");
        assert_eq!(record.vehicle.model, "Vios");
        assert_eq!(record.rating, 4.8);
        assert_eq!(record.total_trips, 120);
        assert_eq!(record.updated_at, 1_700_000_000);
        assert_eq!(record.geohash.as_deref(), Some("w3gvk1zz"));
    }

    #[test]
    fn missing_optional_field_defaults_without_aborting() {
        let record = decode_driver(&doc(json!({
            "driverId": "d-2",
            "latitude": 10.0,
            "longitude": 20.0,
            "vehicleModel": "Wave"
        })));

        assert_eq!(record.id, "d-2");
        assert_eq!(record.vehicle.model, "Wave");
        assert_eq!(record.vehicle.plate, "");
        assert_eq!(record.status, DriverStatus::Offline);
        assert_eq!(record.rating, 0.0);
        assert_eq!(record.geohash, None);
        assert!(record.location.is_some());
    }

    #[test]
    fn wrong_kinds_and_illegal_values_keep_defaults() {
        let record = decode_driver(&doc(json!({
            "driverId": 17,
            "userId": "u-3",
            "latitude": "10.0",
            "longitude": 20.0,
            "status": "ON_TRIP",
            "rating": 9.5,
            "totalTrips": "many"
        })));

        assert_eq!(record.id, "");
        assert_eq!(record.user_id, "u-3");
        assert_eq!(record.location, None);
        assert_eq!(record.status, DriverStatus::Offline);
        assert_eq!(record.rating, 0.0);
        assert_eq!(record.total_trips, 0);
    }

    #[test]
    fn on_break_status_and_license_survive_decode_and_encode() {
        let record = decode_driver(&doc(json!({
            "driverId": "d-5",
            "status": "ON_BREAK",
            "licenseNumber": "B2-998877",
            "rating": 5.0
        })));

        assert_eq!(record.status, DriverStatus::OnBreak);
        assert_eq!(record.license_number, "B2-998877");
        assert_eq!(record.rating, 5.0);

        let encoded = encode_driver(&record, &DriverField::ALL);
        assert_eq!(encoded["status"], "ON_BREAK");
        assert_eq!(encoded["licenseNumber"], "B2-998877");
        assert_eq!(decode_driver(&encoded), record);
    }

    #[test]
    fn out_of_range_location_is_dropped() {
        let record = decode_driver(&doc(json!({ "latitude": 95.0, "longitude": 20.0 })));
        assert_eq!(record.location, None);
    }

    #[test]
    fn encode_selects_fields_and_nulls_missing_location() {
        let record = DriverRecord {
            id: "d-4".to_string(),
            status: DriverStatus::Busy,
            ..DriverRecord::default()
        };

        let encoded = encode_driver(
            &record,
            &[DriverField::DriverId, DriverField::Status, DriverField::Latitude],
        );

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded["driverId"], "d-4");
        assert_eq!(encoded["status"], "BUSY");
        assert!(encoded["latitude"].is_null());
    }

    #[test]
    fn write_bodies_carry_only_the_updated_field() {
        let location = encode_update(&DriverUpdate::Location {
            coordinate: Coordinate { lat: 1.5, lng: 2.5 },
            geohash: "s00".to_string(),
            timestamp: 5,
        });
        assert_eq!(location.len(), 2);
        assert_eq!(location["latitude"], 1.5);
        assert_eq!(location["longitude"], 2.5);

        let status = encode_update(&DriverUpdate::Status {
            status: DriverStatus::Offline,
            timestamp: 5,
        });
        assert_eq!(status.len(), 1);
        assert_eq!(status["status"], "OFFLINE");
    }

    #[test]
    fn nearby_envelope_skips_garbage_entries() {
        let envelope = decode_nearby_envelope(&doc(json!({
            "drivers": [ { "driverId": "a" }, null, { "driverId": "b" } ],
            "message": "Found 2 nearby drivers"
        })));

        assert_eq!(envelope.drivers.len(), 2);
        assert!(envelope.success);
        assert_eq!(envelope.message, "Found 2 nearby drivers");
    }

    #[test]
    fn write_ack_reads_timestamp_and_geohash() {
        let ack = decode_write_ack(&doc(json!({
            "success": false,
            "message": "driver locked",
            "timestamp": 1700000001
        })));

        assert!(!ack.success);
        assert_eq!(ack.message, "driver locked");
        assert_eq!(ack.timestamp, Some(1_700_000_001));
        assert_eq!(ack.geohash, None);
    }
}
