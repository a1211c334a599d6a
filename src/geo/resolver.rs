use std::sync::Arc;

use tracing::{debug, warn};

use super::{haversine_km, Geocoder, RouteProvider};
use crate::models::geo::GeoPoint;
use crate::models::order::round3;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceTier {
    Routed(&'static str),
    GreatCircle,
}

impl DistanceTier {
    pub fn label(&self) -> &'static str {
        match self {
            DistanceTier::Routed(name) => *name,
            DistanceTier::GreatCircle => "haversine",
        }
    }
}

/// Routing providers tried in order; great-circle distance closes the chain,
/// so resolution always yields a value.
#[derive(Clone, Default)]
pub struct DistanceChain {
    stages: Vec<Arc<dyn RouteProvider>>,
}

impl DistanceChain {
    pub fn new(stages: Vec<Arc<dyn RouteProvider>>) -> Self {
        Self { stages }
    }

    pub fn then(mut self, stage: Arc<dyn RouteProvider>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn resolve(&self, from: GeoPoint, to: GeoPoint) -> (f64, DistanceTier) {
        for stage in &self.stages {
            match stage.driving_distance_km(from, to).await {
                Ok(Some(km)) if km.is_finite() && km >= 0.0 => {
                    return (km, DistanceTier::Routed(stage.name()));
                }
                Ok(_) => debug!(provider = stage.name(), "no route returned; trying next tier"),
                Err(err) => {
                    warn!(provider = stage.name(), error = %err, "routing failed; trying next tier")
                }
            }
        }

        (haversine_km(&from, &to), DistanceTier::GreatCircle)
    }
}

pub struct GeoResolver {
    geocoder: Option<Arc<dyn Geocoder>>,
    distances: DistanceChain,
    metrics: Metrics,
}

impl GeoResolver {
    pub fn new(
        geocoder: Option<Arc<dyn Geocoder>>,
        distances: DistanceChain,
        metrics: Metrics,
    ) -> Self {
        Self {
            geocoder,
            distances,
            metrics,
        }
    }

    pub async fn geocode(&self, address: &str) -> Option<GeoPoint> {
        let Some(geocoder) = &self.geocoder else {
            debug!(address, "no geocoder configured");
            self.metrics
                .geocode_total
                .with_label_values(&["unconfigured"])
                .inc();
            return None;
        };

        let (point, outcome) = match geocoder.geocode(address).await {
            Ok(Some(point)) => (Some(point), "resolved"),
            Ok(None) => (None, "not_found"),
            Err(err) => {
                warn!(address, error = %err, "geocoding failed");
                (None, "error")
            }
        };

        self.metrics
            .geocode_total
            .with_label_values(&[outcome])
            .inc();
        point
    }

    pub async fn distance(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        let (km, tier) = self.distances.resolve(from, to).await;

        debug!(tier = tier.label(), km, "distance resolved");
        self.metrics
            .distance_resolutions_total
            .with_label_values(&[tier.label()])
            .inc();
        round3(km)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{DistanceChain, DistanceTier, GeoResolver};
    use crate::error::ProviderError;
    use crate::geo::{haversine_km, Geocoder, RouteProvider};
    use crate::models::geo::GeoPoint;
    use crate::models::order::round3;
    use crate::observability::metrics::Metrics;

    struct FixedRoute(&'static str, Option<f64>);

    #[async_trait]
    impl RouteProvider for FixedRoute {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn driving_distance_km(
            &self,
            _from: GeoPoint,
            _to: GeoPoint,
        ) -> Result<Option<f64>, ProviderError> {
            Ok(self.1)
        }
    }

    struct BrokenRoute;

    #[async_trait]
    impl RouteProvider for BrokenRoute {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn driving_distance_km(
            &self,
            _from: GeoPoint,
            _to: GeoPoint,
        ) -> Result<Option<f64>, ProviderError> {
            Err(ProviderError::Malformed("boom".to_string()))
        }
    }

    struct BrokenGeocoder;

    #[async_trait]
    impl Geocoder for BrokenGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<GeoPoint>, ProviderError> {
            Err(ProviderError::MissingCredentials("test"))
        }
    }

    const FROM: GeoPoint = GeoPoint {
        lat: 55.7575,
        lng: 37.6136,
    };
    const TO: GeoPoint = GeoPoint {
        lat: 55.7494,
        lng: 37.5912,
    };

    #[tokio::test]
    async fn first_successful_tier_wins() {
        let chain = DistanceChain::default()
            .then(Arc::new(BrokenRoute))
            .then(Arc::new(FixedRoute("osrm", Some(2.5))))
            .then(Arc::new(FixedRoute("never", Some(99.0))));

        let (km, tier) = chain.resolve(FROM, TO).await;
        assert_eq!(km, 2.5);
        assert_eq!(tier, DistanceTier::Routed("osrm"));
    }

    #[tokio::test]
    async fn great_circle_closes_the_chain() {
        let chain = DistanceChain::default()
            .then(Arc::new(BrokenRoute))
            .then(Arc::new(FixedRoute("empty", None)));

        let (km, tier) = chain.resolve(FROM, TO).await;
        assert_eq!(tier, DistanceTier::GreatCircle);
        assert_eq!(km, haversine_km(&FROM, &TO));
    }

    #[tokio::test]
    async fn resolver_rounds_every_tier() {
        let resolver = GeoResolver::new(
            None,
            DistanceChain::new(vec![
                Arc::new(FixedRoute("yandex", Some(12.34567))) as Arc<dyn RouteProvider>,
            ]),
            Metrics::new(),
        );
        assert_eq!(resolver.distance(FROM, TO).await, 12.346);

        let resolver = GeoResolver::new(None, DistanceChain::default(), Metrics::new());
        assert_eq!(
            resolver.distance(FROM, TO).await,
            round3(haversine_km(&FROM, &TO))
        );
    }

    #[tokio::test]
    async fn geocoding_failures_are_unresolved() {
        let resolver = GeoResolver::new(None, DistanceChain::default(), Metrics::new());
        assert_eq!(resolver.geocode("Москва").await, None);

        let resolver = GeoResolver::new(
            Some(Arc::new(BrokenGeocoder)),
            DistanceChain::default(),
            Metrics::new(),
        );
        assert_eq!(resolver.geocode("Москва").await, None);
    }
}
