use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Geocoder, RouteProvider};
use crate::error::ProviderError;
use crate::models::geo::GeoPoint;

const GEOCODER_URL: &str = "https://geocode-maps.yandex.ru/1.x";
const ROUTER_URL: &str = "https://api.routing.yandex.net/v2/route";

pub struct YandexMaps {
    client: reqwest::Client,
    api_key: String,
}

impl YandexMaps {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct GeocoderResponse {
    response: GeocoderBody,
}

#[derive(Deserialize)]
struct GeocoderBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: FeatureCollection,
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: Option<Point>,
}

#[derive(Deserialize)]
struct Point {
    pos: String,
}

/// Yandex reports positions as `"<lon> <lat>"`.
fn parse_pos(pos: &str) -> Result<GeoPoint, ProviderError> {
    let mut parts = pos.split_whitespace();
    let (Some(lng), Some(lat)) = (parts.next(), parts.next()) else {
        return Err(ProviderError::Malformed(format!("unexpected position {pos:?}")));
    };

    let lng = lng
        .parse::<f64>()
        .map_err(|err| ProviderError::Malformed(format!("longitude {lng:?}: {err}")))?;
    let lat = lat
        .parse::<f64>()
        .map_err(|err| ProviderError::Malformed(format!("latitude {lat:?}: {err}")))?;

    Ok(GeoPoint { lat, lng })
}

fn first_position(body: GeocoderResponse) -> Result<Option<GeoPoint>, ProviderError> {
    let pos = body
        .response
        .collection
        .members
        .into_iter()
        .next()
        .and_then(|member| member.geo_object.point)
        .map(|point| point.pos)
        .filter(|pos| !pos.trim().is_empty());

    pos.map(|pos| parse_pos(&pos)).transpose()
}

fn route_distance_meters(body: &Value) -> Option<f64> {
    let route = body.get("routes")?.get(0)?;

    let from_leg = route
        .get("legs")
        .and_then(|legs| legs.get(0))
        .and_then(|leg| leg.get("distance"))
        .and_then(|distance| {
            distance
                .get("value")
                .or_else(|| distance.get("meters"))
                .and_then(Value::as_f64)
        });

    from_leg.or_else(|| route.get("distance").and_then(Value::as_f64))
}

#[async_trait]
impl Geocoder for YandexMaps {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, ProviderError> {
        let response = self
            .client
            .get(GEOCODER_URL)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("format", "json"),
                ("geocode", address),
                ("lang", "ru_RU"),
                ("results", "1"),
            ])
            .send()
            .await?;
        let response = ProviderError::from_response(response).await?;

        let body: GeocoderResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;

        let point = first_position(body)?;
        debug!(address, found = point.is_some(), "yandex geocoder answered");
        Ok(point)
    }
}

#[async_trait]
impl RouteProvider for YandexMaps {
    fn name(&self) -> &'static str {
        "yandex"
    }

    async fn driving_distance_km(
        &self,
        from: GeoPoint,
        to: GeoPoint,
    ) -> Result<Option<f64>, ProviderError> {
        let waypoints = format!("{},{}|{},{}", from.lat, from.lng, to.lat, to.lng);
        let response = self
            .client
            .get(ROUTER_URL)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("waypoints", waypoints.as_str()),
                ("mode", "driving"),
                ("lang", "ru_RU"),
            ])
            .send()
            .await?;
        let response = ProviderError::from_response(response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;

        Ok(route_distance_meters(&body).map(|meters| meters / 1000.0))
    }
}
