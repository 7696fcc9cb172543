use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::driver::{Coordinate, DriverRecord};
use crate::models::proximity::{NearbyDriver, ProximityQuery, ProximityResult};
use crate::observability::metrics::Metrics;
use crate::source::LocationSource;

/// Runs nearby-driver searches against a `LocationSource`.
///
/// Distances are always recomputed here with Haversine, including for
/// candidates that arrive from a backend with its own distance, so every
/// source is held to the same radius and ordering rules.
pub struct ProximityCoordinator {
    source: Arc<dyn LocationSource>,
    timeout: Duration,
    max_limit: u32,
    metrics: Metrics,
}

impl ProximityCoordinator {
    pub fn new(
        source: Arc<dyn LocationSource>,
        timeout: Duration,
        max_limit: u32,
        metrics: Metrics,
    ) -> Self {
        Self {
            source,
            timeout,
            max_limit,
            metrics,
        }
    }

    /// Fails only on invalid parameters. Backend failures come back as a
    /// result with `success == false` and no drivers.
    pub async fn find_nearby(&self, query: ProximityQuery) -> Result<ProximityResult, AppError> {
        let query = self.validate(query)?;
        let start = Instant::now();

        info!(
            lat = query.origin.lat,
            lng = query.origin.lng,
            radius_km = query.radius_km,
            limit = query.limit,
            source = self.source.name(),
            "finding nearby drivers"
        );

        let fetched = tokio::time::timeout(self.timeout, self.source.candidates(&query)).await;
        self.metrics
            .nearby_query_latency_seconds
            .with_label_values(&[self.source.name()])
            .observe(start.elapsed().as_secs_f64());

        let candidates = match fetched {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(err)) => return Ok(self.failed(&query, err.to_string())),
            Err(_) => {
                let message = format!(
                    "driver backend timed out after {}ms",
                    self.timeout.as_millis()
                );
                return Ok(self.failed(&query, message));
            }
        };

        let drivers = rank_candidates(&query, candidates);
        self.metrics
            .nearby_queries_total
            .with_label_values(&["success"])
            .inc();
        self.metrics
            .nearby_drivers_returned
            .observe(drivers.len() as f64);

        info!(found = drivers.len(), "nearby search complete");
        Ok(ProximityResult::found(&query, drivers))
    }

    fn validate(&self, query: ProximityQuery) -> Result<ProximityQuery, AppError> {
        let origin = Coordinate::new(query.origin.lat, query.origin.lng)?;

        if !query.radius_km.is_finite() || query.radius_km <= 0.0 {
            return Err(AppError::Validation(
                "radius must be greater than 0".to_string(),
            ));
        }
        if query.limit == 0 {
            return Err(AppError::Validation("limit must be greater than 0".to_string()));
        }

        Ok(ProximityQuery {
            origin,
            radius_km: query.radius_km,
            limit: query.limit.min(self.max_limit),
        })
    }

    fn failed(&self, query: &ProximityQuery, message: String) -> ProximityResult {
        warn!(source = self.source.name(), error = %message, "nearby search degraded to empty result");
        self.metrics
            .nearby_queries_total
            .with_label_values(&["error"])
            .inc();
        ProximityResult::failed(query, message)
    }
}

/// Keeps candidates within the radius (inclusive), nearest first, ties by
/// driver id, at most `query.limit` of them.
pub fn rank_candidates(query: &ProximityQuery, candidates: Vec<DriverRecord>) -> Vec<NearbyDriver> {
    let mut nearby: Vec<NearbyDriver> = candidates
        .into_iter()
        .filter_map(|driver| {
            let location = driver.location?;
            if !location.is_valid() {
                warn!(driver_id = %driver.id, "skipping candidate with invalid location");
                return None;
            }

            let distance_km = haversine_km(&query.origin, &location);
            (distance_km <= query.radius_km).then_some(NearbyDriver {
                driver,
                distance_km,
            })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.driver.id.cmp(&b.driver.id))
    });
    nearby.truncate(query.limit as usize);
    nearby
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::driver::DriverStatus;

    const KM_PER_DEGREE_LAT: f64 = 6_371.0 * std::f64::consts::PI / 180.0;

    enum Behaviour {
        Return(Vec<DriverRecord>),
        Fail,
        Hang,
    }

    struct StubSource(Behaviour);

    #[async_trait]
    impl LocationSource for StubSource {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn candidates(&self, _query: &ProximityQuery) -> Result<Vec<DriverRecord>, AppError> {
            match &self.0 {
                Behaviour::Return(drivers) => Ok(drivers.clone()),
                Behaviour::Fail => Err(AppError::UpstreamUnavailable(
                    "connection refused".to_string(),
                )),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn origin() -> Coordinate {
        Coordinate { lat: 10.0, lng: 20.0 }
    }

    /// A driver `km` north of the origin.
    fn driver_north(id: &str, km: f64) -> DriverRecord {
        DriverRecord {
            id: id.to_string(),
            location: Some(Coordinate {
                lat: origin().lat + km / KM_PER_DEGREE_LAT,
                lng: origin().lng,
            }),
            status: DriverStatus::Available,
            ..DriverRecord::default()
        }
    }

    fn coordinator(behaviour: Behaviour) -> ProximityCoordinator {
        ProximityCoordinator::new(
            Arc::new(StubSource(behaviour)),
            Duration::from_millis(200),
            50,
            Metrics::new(),
        )
    }

    fn query(radius_km: f64, limit: u32) -> ProximityQuery {
        ProximityQuery {
            origin: origin(),
            radius_km,
            limit,
        }
    }

    #[tokio::test]
    async fn boundary_is_inclusive_and_results_are_ordered() {
        let candidates = vec![
            driver_north("far", 10.0),
            driver_north("edge", 5.0),
            driver_north("here", 0.0),
            driver_north("just-outside", 5.001),
            driver_north("mid", 3.0),
        ];
        // Radius is the exact computed distance of the edge driver.
        let edge = candidates[1].location.unwrap();
        let radius_km = haversine_km(&origin(), &edge);
        assert!((radius_km - 5.0).abs() < 1e-6);

        let result = coordinator(Behaviour::Return(candidates))
            .find_nearby(query(radius_km, 10))
            .await
            .unwrap();

        let ids: Vec<&str> = result.drivers.iter().map(|d| d.driver.id.as_str()).collect();
        assert_eq!(ids, vec!["here", "mid", "edge"]);
        assert_eq!(result.drivers[0].distance_km, 0.0);
        assert!(result.success);
        assert_eq!(result.message, "Found 3 nearby drivers");
        assert_eq!(result.origin, origin());
        assert_eq!(result.radius_km, radius_km);
    }

    #[tokio::test]
    async fn ties_are_broken_by_driver_id() {
        let candidates = vec![
            driver_north("c", 1.0),
            driver_north("a", 1.0),
            driver_north("b", 1.0),
        ];

        let result = coordinator(Behaviour::Return(candidates))
            .find_nearby(query(5.0, 10))
            .await
            .unwrap();

        let ids: Vec<&str> = result.drivers.iter().map(|d| d.driver.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn result_is_truncated_to_limit() {
        let candidates = (0..20)
            .map(|i| driver_north(&format!("d-{i:02}"), i as f64 * 0.1))
            .collect();

        let result = coordinator(Behaviour::Return(candidates))
            .find_nearby(query(5.0, 4))
            .await
            .unwrap();

        assert_eq!(result.drivers.len(), 4);
        assert!(
            result
                .drivers
                .windows(2)
                .all(|pair| pair[0].distance_km <= pair[1].distance_km)
        );
    }

    #[tokio::test]
    async fn limit_is_capped_at_configured_maximum() {
        let candidates = (0..80)
            .map(|i| driver_north(&format!("d-{i:02}"), 0.01 * i as f64))
            .collect();

        let result = coordinator(Behaviour::Return(candidates))
            .find_nearby(query(5.0, 1_000))
            .await
            .unwrap();

        assert_eq!(result.drivers.len(), 50);
    }

    #[tokio::test]
    async fn drivers_without_location_are_skipped() {
        let mut nowhere = driver_north("nowhere", 0.0);
        nowhere.location = None;
        let mut broken = driver_north("broken", 0.0);
        broken.location = Some(Coordinate { lat: 123.0, lng: 20.0 });

        let result = coordinator(Behaviour::Return(vec![nowhere, broken, driver_north("ok", 1.0)]))
            .find_nearby(query(5.0, 10))
            .await
            .unwrap();

        assert_eq!(result.drivers.len(), 1);
        assert_eq!(result.drivers[0].driver.id, "ok");
    }

    #[tokio::test]
    async fn invalid_parameters_are_rejected() {
        let coordinator = coordinator(Behaviour::Fail);

        for bad in [query(0.0, 10), query(-1.0, 10), query(f64::NAN, 10), query(5.0, 0)] {
            let err = coordinator.find_nearby(bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        let mut off_planet = query(5.0, 10);
        off_planet.origin.lat = 91.0;
        assert!(matches!(
            coordinator.find_nearby(off_planet).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn source_failure_degrades_to_empty_result() {
        let result = coordinator(Behaviour::Fail)
            .find_nearby(query(5.0, 10))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.drivers.is_empty());
        assert!(result.message.contains("connection refused"));
        assert_eq!(result.radius_km, 5.0);
    }

    #[tokio::test]
    async fn slow_source_times_out_as_failure() {
        let result = coordinator(Behaviour::Hang)
            .find_nearby(query(5.0, 10))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.drivers.is_empty());
        assert!(result.message.contains("timed out"));
    }
}
