use async_trait::async_trait;
use serde::Deserialize;

use super::RouteProvider;
use crate::error::ProviderError;
use crate::models::geo::GeoPoint;

pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn route_url(&self, from: GeoPoint, to: GeoPoint) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, from.lng, from.lat, to.lng, to.lat
        )
    }
}

#[derive(Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    distance: f64,
}

#[async_trait]
impl RouteProvider for OsrmRouter {
    fn name(&self) -> &'static str {
        "osrm"
    }

    async fn driving_distance_km(
        &self,
        from: GeoPoint,
        to: GeoPoint,
    ) -> Result<Option<f64>, ProviderError> {
        let response = self
            .client
            .get(self.route_url(from, to))
            .query(&[("overview", "false")])
            .send()
            .await?;
        let response = ProviderError::from_response(response).await?;

        let body: OsrmResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;

        Ok(body.routes.first().map(|route| route.distance / 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::OsrmRouter;
    use crate::models::geo::GeoPoint;

    #[test]
    fn coordinates_are_longitude_first() {
        let router = OsrmRouter::new(reqwest::Client::new(), "https://osrm.local/");
        let url = router.route_url(
            GeoPoint {
                lat: 55.75,
                lng: 37.61,
            },
            GeoPoint {
                lat: 55.74,
                lng: 37.59,
            },
        );
        assert_eq!(url, "https://osrm.local/route/v1/driving/37.61,55.75;37.59,55.74");
    }
}
