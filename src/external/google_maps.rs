use async_trait::async_trait;
use reqwest::Response as HttpResponse;
use serde::{Deserialize, Serialize};

use crate::{
    config::GoogleMapsConfig,
    error::{invalid_input_error, upstream_error, Error},
    pricing::{DrivingDistance, GeoProvider},
};

const METERS_PER_MILE: f64 = 1609.344;
const COUNTY_COMPONENT: &str = "administrative_area_level_2";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Element {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MatrixRow {
    elements: Vec<Element>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DistanceMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct AddressComponent {
    long_name: String,
    types: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResult {
    address_components: Vec<AddressComponent>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug)]
pub struct GoogleMaps {
    client: reqwest::Client,
    api_base: String,
    key: String,
}

impl GoogleMaps {
    pub fn new(config: &GoogleMapsConfig) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_base: config.api_base.clone(),
            key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}/maps/api/{}/json", self.api_base, path)
    }
}

fn check_status(res: &HttpResponse) -> Result<(), Error> {
    let status_code = res.status().as_u16();

    if (400..500).contains(&status_code) {
        return Err(invalid_input_error());
    } else if status_code != 200 {
        return Err(upstream_error());
    }

    Ok(())
}

fn driving_distance(data: DistanceMatrixResponse) -> Result<DrivingDistance, Error> {
    if data.status != "OK" {
        return Err(upstream_error());
    }

    let element = data
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(upstream_error)?;

    if element.status != "OK" {
        return Err(upstream_error());
    }

    let distance = element.distance.ok_or_else(upstream_error)?;

    Ok(DrivingDistance {
        distance_miles: distance.value / METERS_PER_MILE,
        duration_text: element.duration.map(|d| d.text).unwrap_or_default(),
    })
}

/// "Franklin County" and "Franklin" name the same county.
fn county_name(long_name: &str) -> String {
    long_name
        .strip_suffix(" County")
        .unwrap_or(long_name)
        .trim()
        .to_string()
}

fn county(data: GeocodeResponse) -> Result<Option<String>, Error> {
    match data.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        _ => return Err(upstream_error()),
    }

    Ok(data
        .results
        .iter()
        .flat_map(|result| result.address_components.iter())
        .find(|component| component.types.iter().any(|t| t == COUNTY_COMPONENT))
        .map(|component| county_name(&component.long_name)))
}

#[async_trait]
impl GeoProvider for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn resolve_driving_distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<DrivingDistance, Error> {
        let res = self
            .client
            .get(self.url("distancematrix"))
            .query(&[("key", self.key.as_str())])
            .query(&[("origins", origin)])
            .query(&[("destinations", destination)])
            .query(&[("mode", "driving")])
            .send()
            .await?;

        check_status(&res)?;

        let data: DistanceMatrixResponse = res.json().await?;

        driving_distance(data)
    }

    #[tracing::instrument(skip(self))]
    async fn resolve_county(&self, address: &str) -> Result<Option<String>, Error> {
        let res = self
            .client
            .get(self.url("geocode"))
            .query(&[("key", self.key.as_str())])
            .query(&[("address", address)])
            .send()
            .await?;

        check_status(&res)?;

        let data: GeocodeResponse = res.json().await?;

        county(data)
    }
}
