use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::AppError;
use crate::geo::geohash;
use crate::models::driver::{Coordinate, DriverStatus, DriverUpdate};
use crate::models::mutation::MutationOutcome;
use crate::observability::metrics::Metrics;
use crate::source::DriverStore;

/// Applies location and status writes, one field group per call.
///
/// Status changes are unconditional overwrites; no transition rules are
/// enforced between AVAILABLE, BUSY and OFFLINE.
pub struct MutationHandler {
    store: Arc<dyn DriverStore>,
    timeout: Duration,
    metrics: Metrics,
}

impl MutationHandler {
    pub fn new(store: Arc<dyn DriverStore>, timeout: Duration, metrics: Metrics) -> Self {
        Self {
            store,
            timeout,
            metrics,
        }
    }

    pub async fn update_location(
        &self,
        driver_id: &str,
        coordinate: Coordinate,
    ) -> Result<MutationOutcome, AppError> {
        let driver_id = validate_driver_id(driver_id)?;
        let coordinate = Coordinate::new(coordinate.lat, coordinate.lng)?;
        let geohash = geohash::encode(&coordinate, geohash::DEFAULT_PRECISION);

        let update = DriverUpdate::Location {
            coordinate,
            geohash: geohash.clone(),
            timestamp: Utc::now().timestamp(),
        };

        let mut outcome = self.apply(driver_id, &update).await;
        outcome.location = Some(coordinate);
        outcome.geohash = Some(geohash);
        Ok(outcome)
    }

    pub async fn update_status(
        &self,
        driver_id: &str,
        status: DriverStatus,
    ) -> Result<MutationOutcome, AppError> {
        let driver_id = validate_driver_id(driver_id)?;

        let update = DriverUpdate::Status {
            status,
            timestamp: Utc::now().timestamp(),
        };

        let mut outcome = self.apply(driver_id, &update).await;
        outcome.status = Some(status);
        Ok(outcome)
    }

    async fn apply(&self, driver_id: &str, update: &DriverUpdate) -> MutationOutcome {
        let kind = update.kind();
        let written = tokio::time::timeout(self.timeout, self.store.apply_update(driver_id, update)).await;

        let (success, message) = match written {
            Ok(Ok(1)) => (true, format!("driver {kind} updated")),
            Ok(Ok(0)) => (false, format!("driver {driver_id} not found")),
            Ok(Ok(affected)) => (
                false,
                format!("update of driver {driver_id} touched {affected} records"),
            ),
            Ok(Err(err)) => (false, err.to_string()),
            Err(_) => (
                false,
                format!("driver backend timed out after {}ms", self.timeout.as_millis()),
            ),
        };

        let outcome_label = if success { "success" } else { "error" };
        self.metrics
            .driver_updates_total
            .with_label_values(&[kind, outcome_label])
            .inc();

        if success {
            info!(driver_id, kind, "driver updated");
        } else {
            warn!(driver_id, kind, error = %message, "driver update failed");
        }

        MutationOutcome {
            driver_id: driver_id.to_string(),
            success,
            message,
            location: None,
            status: None,
            geohash: None,
            timestamp: update.timestamp(),
        }
    }
}

pub(crate) fn validate_driver_id(driver_id: &str) -> Result<&str, AppError> {
    let trimmed = driver_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("driver id cannot be empty".to_string()));
    }
    Ok(trimmed)
}
