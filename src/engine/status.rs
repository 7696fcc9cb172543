use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::mutation::validate_driver_id;
use crate::error::AppError;
use crate::models::mutation::StatusOutcome;
use crate::source::DriverStore;

/// Point lookup behind `GetDriverStatus`.
pub struct StatusLookup {
    store: Arc<dyn DriverStore>,
    timeout: Duration,
}

impl StatusLookup {
    pub fn new(store: Arc<dyn DriverStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn driver_status(&self, driver_id: &str) -> Result<StatusOutcome, AppError> {
        let driver_id = validate_driver_id(driver_id)?;
        let fetched = tokio::time::timeout(self.timeout, self.store.fetch_driver(driver_id)).await;

        let outcome = match fetched {
            Ok(Ok(Some(driver))) => StatusOutcome {
                driver_id: driver_id.to_string(),
                driver: Some(driver),
                success: true,
                message: "driver status retrieved".to_string(),
            },
            Ok(Ok(None)) => StatusOutcome {
                driver_id: driver_id.to_string(),
                driver: None,
                success: false,
                message: format!("driver {driver_id} not found"),
            },
            Ok(Err(err)) => unavailable(driver_id, err.to_string()),
            Err(_) => unavailable(
                driver_id,
                format!("driver backend timed out after {}ms", self.timeout.as_millis()),
            ),
        };

        debug!(driver_id, success = outcome.success, "driver status lookup");
        Ok(outcome)
    }
}

fn unavailable(driver_id: &str, message: String) -> StatusOutcome {
    warn!(driver_id, error = %message, "driver status lookup failed");
    StatusOutcome {
        driver_id: driver_id.to_string(),
        driver: None,
        success: false,
        message,
    }
}
