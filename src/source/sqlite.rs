use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row, Statement};
use serde_json::{Number, Value};
use tracing::{debug, info};

use crate::error::AppError;
use crate::mapping::driver::decode_driver;
use crate::mapping::Document;
use crate::models::driver::{DriverRecord, DriverStatus, DriverUpdate};
use crate::models::proximity::ProximityQuery;
use crate::source::{DriverStore, LocationSource};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS drivers (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    vehicle_plate TEXT NOT NULL DEFAULT '',
    vehicle_model TEXT NOT NULL DEFAULT '',
    license_number TEXT NOT NULL DEFAULT '',
    status        TEXT NOT NULL DEFAULT 'OFFLINE',
    latitude      REAL,
    longitude     REAL,
    rating        REAL NOT NULL DEFAULT 0,
    total_trips   INTEGER NOT NULL DEFAULT 0,
    geohash       TEXT,
    last_updated  INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS drivers_status_idx ON drivers (status);
";

// Aliased to the upstream document keys so rows decode through the same mapper.
const DRIVER_COLUMNS: &str = "id AS driverId, user_id AS userId, \
    vehicle_plate AS vehiclePlate, vehicle_model AS vehicleModel, \
    license_number AS licenseNumber, status, \
    latitude, longitude, rating, total_trips AS totalTrips, geohash, \
    last_updated AS timestamp";

/// Row store backed by a single SQLite connection.
pub struct SqliteDriverStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDriverStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|err| {
            AppError::Internal(format!("failed to open {}: {err}", path.display()))
        })?;
        info!(path = %path.display(), "opened driver database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| AppError::Internal(format!("failed to open in-memory db: {err}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(SCHEMA)
            .map_err(|err| AppError::Internal(format!("failed to apply schema: {err}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Inserts or replaces a full driver row.
    pub async fn insert_driver(&self, record: &DriverRecord) -> Result<(), AppError> {
        let record = record.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO drivers (id, user_id, vehicle_plate, vehicle_model, \
                 license_number, status, latitude, longitude, rating, total_trips, geohash, \
                 last_updated) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.id,
                    record.user_id,
                    record.vehicle.plate,
                    record.vehicle.model,
                    record.license_number,
                    record.status.as_str(),
                    record.location.map(|c| c.lat),
                    record.location.map(|c| c.lng),
                    record.rating,
                    record.total_trips,
                    record.geohash,
                    record.updated_at,
                ],
            )
            .map(|_| ())
        })
        .await
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| {
                AppError::UpstreamUnavailable("driver database lock poisoned".to_string())
            })?;
            op(&guard).map_err(|err| AppError::UpstreamUnavailable(format!("sqlite: {err}")))
        })
        .await
        .map_err(|err| AppError::Internal(format!("database task failed: {err}")))?
    }
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(str::to_owned).collect()
}

fn row_document(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Document> {
    let mut doc = Document::new();
    for (index, name) in columns.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null | ValueRef::Blob(_) => Value::Null,
            ValueRef::Integer(raw) => Value::from(raw),
            ValueRef::Real(raw) => Number::from_f64(raw).map(Value::Number).unwrap_or(Value::Null),
            ValueRef::Text(raw) => Value::String(String::from_utf8_lossy(raw).into_owned()),
        };
        doc.insert(name.clone(), value);
    }
    Ok(doc)
}

#[async_trait]
impl LocationSource for SqliteDriverStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn candidates(&self, _query: &ProximityQuery) -> Result<Vec<DriverRecord>, AppError> {
        let rows = self
            .with_connection(|conn| {
                let sql = format!(
                    "SELECT {DRIVER_COLUMNS} FROM drivers \
                     WHERE status = ?1 AND latitude IS NOT NULL AND longitude IS NOT NULL"
                );
                let mut stmt = conn.prepare(&sql)?;
                let columns = column_names(&stmt);
                let rows = stmt
                    .query_map(params![DriverStatus::Available.as_str()], |row| {
                        row_document(row, &columns)
                    })?
                    .collect::<rusqlite::Result<Vec<Document>>>()?;
                Ok(rows)
            })
            .await?;

        debug!(candidates = rows.len(), "loaded available drivers");
        Ok(rows.iter().map(decode_driver).collect())
    }
}

#[async_trait]
impl DriverStore for SqliteDriverStore {
    async fn fetch_driver(&self, driver_id: &str) -> Result<Option<DriverRecord>, AppError> {
        let driver_id = driver_id.to_string();
        let row = self
            .with_connection(move |conn| {
                let sql = format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?1");
                let mut stmt = conn.prepare(&sql)?;
                let columns = column_names(&stmt);
                stmt.query_row(params![driver_id], |row| row_document(row, &columns))
                    .optional()
            })
            .await?;

        Ok(row.as_ref().map(decode_driver))
    }

    async fn apply_update(&self, driver_id: &str, update: &DriverUpdate) -> Result<u64, AppError> {
        let driver_id = driver_id.to_string();
        let update = update.clone();

        let affected = self
            .with_connection(move |conn| match update {
                DriverUpdate::Location {
                    coordinate,
                    geohash,
                    timestamp,
                } => conn.execute(
                    "UPDATE drivers SET latitude = ?1, longitude = ?2, geohash = ?3, \
                     last_updated = ?4 WHERE id = ?5",
                    params![coordinate.lat, coordinate.lng, geohash, timestamp, driver_id],
                ),
                DriverUpdate::Status { status, timestamp } => conn.execute(
                    "UPDATE drivers SET status = ?1, last_updated = ?2 WHERE id = ?3",
                    params![status.as_str(), timestamp, driver_id],
                ),
            })
            .await?;

        Ok(affected as u64)
    }
}
