//! Backends that supply driver records and accept driver writes.
//!
//! Both the SQLite row store and the remote HTTP backend implement the same
//! two capabilities, so the engine never knows which one it talks to.

pub mod remote;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::driver::{DriverRecord, DriverUpdate};
use crate::models::proximity::ProximityQuery;

/// Supplies candidate drivers for a proximity query. Candidates may include
/// drivers outside the radius; filtering happens in the engine.
#[async_trait]
pub trait LocationSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn candidates(&self, query: &ProximityQuery) -> Result<Vec<DriverRecord>, AppError>;
}

/// Point reads and single-field writes against the store that owns drivers.
#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn fetch_driver(&self, driver_id: &str) -> Result<Option<DriverRecord>, AppError>;

    /// Applies `update` to exactly `driver_id` and returns the affected-record count.
    async fn apply_update(&self, driver_id: &str, update: &DriverUpdate) -> Result<u64, AppError>;
}
