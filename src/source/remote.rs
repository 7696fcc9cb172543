use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::mapping::driver::{decode_driver, decode_nearby_envelope, decode_write_ack, encode_update};
use crate::mapping::{field, parse_document, Document};
use crate::models::driver::{DriverRecord, DriverUpdate};
use crate::models::proximity::ProximityQuery;
use crate::source::{DriverStore, LocationSource};

/// HTTP backend that owns driver data and answers nearby queries itself.
pub struct RemoteBackend {
    client: Client,
    base_url: Url,
}

impl RemoteBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::Internal(format!("invalid backend url {base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "backend url {base_url} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_document(response: Response) -> Result<Document, AppError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "backend returned {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AppError::UpstreamUnavailable(format!("failed to read response: {err}")))?;
        parse_document(&body)
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::UpstreamUnavailable(format!("backend timed out: {err}"))
    } else {
        AppError::UpstreamUnavailable(format!("error calling driver backend: {err}"))
    }
}

#[async_trait]
impl LocationSource for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn candidates(&self, query: &ProximityQuery) -> Result<Vec<DriverRecord>, AppError> {
        let mut url = self.endpoint(&["drivers", "nearby"]);
        url.query_pairs_mut()
            .append_pair("latitude", &query.origin.lat.to_string())
            .append_pair("longitude", &query.origin.lng.to_string())
            .append_pair("radiusKm", &query.radius_km.to_string())
            .append_pair("limit", &query.limit.to_string());

        debug!(url = %url, "requesting nearby drivers from backend");
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let doc = Self::read_document(response).await?;

        let envelope = decode_nearby_envelope(&doc);
        if !envelope.success {
            return Err(AppError::UpstreamUnavailable(format!(
                "backend reported failure: {}",
                envelope.message
            )));
        }

        Ok(envelope.drivers)
    }
}

#[async_trait]
impl DriverStore for RemoteBackend {
    async fn fetch_driver(&self, driver_id: &str) -> Result<Option<DriverRecord>, AppError> {
        let url = self.endpoint(&["drivers", driver_id]);
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let doc = Self::read_document(response).await?;
        if !field(&doc, "success", true) {
            let message: String = field(&doc, "message", String::new());
            return Err(AppError::UpstreamUnavailable(format!(
                "backend reported failure: {message}"
            )));
        }

        let mut driver = decode_driver(&doc);
        if driver.id.is_empty() {
            driver.id = driver_id.to_string();
        }
        Ok(Some(driver))
    }

    async fn apply_update(&self, driver_id: &str, update: &DriverUpdate) -> Result<u64, AppError> {
        let url = self.endpoint(&["drivers", driver_id, update.kind()]);
        let body = encode_update(update);

        let response = self
            .client
            .put(url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }

        let ack = decode_write_ack(&Self::read_document(response).await?);
        if !ack.success {
            warn!(driver_id, kind = update.kind(), message = %ack.message, "backend rejected update");
            return Err(AppError::UpstreamUnavailable(format!(
                "backend rejected update: {}",
                ack.message
            )));
        }

        Ok(1)
    }
}
