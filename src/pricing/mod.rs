mod format;
mod geo;
mod rates;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::entities::FareRequest;
use crate::error::Error;
use crate::external::google_maps::GoogleMaps;

pub use format::{format_usd, line_items, LineItem};
pub use geo::{
    DistanceSampler, DrivingDistance, FallbackDistance, FixedSampler, GeoProvider, GeoResolution,
    GeoResolver, ThreadRngSampler, UnavailableProvider, UNKNOWN_COUNTY,
};
pub use rates::{round_cents, FareBreakdown, RateTable};

#[cfg(test)]
pub(crate) use geo::tests::{resolver as test_resolver, StaticProvider};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub total_price: f64,
    pub formatted_total: String,
    pub breakdown: Vec<LineItem>,
    pub fare: Option<FareBreakdown>,
    pub distance_miles: f64,
    pub duration_text: String,
    /// Distance came from the fallback heuristic or the price could not be
    /// computed at all.
    pub is_estimate: bool,
    pub origin_county: String,
    pub destination_county: String,
}

impl PriceQuote {
    pub fn unavailable(reason: &str) -> Self {
        Self {
            total_price: 0.0,
            formatted_total: format_usd(0.0),
            breakdown: vec![LineItem::new(
                format!("Unable to calculate price: {}", reason),
                0.0,
            )],
            fare: None,
            distance_miles: 0.0,
            duration_text: "".into(),
            is_estimate: true,
            origin_county: UNKNOWN_COUNTY.into(),
            destination_county: UNKNOWN_COUNTY.into(),
        }
    }
}

pub struct FareCalculator {
    geo: GeoResolver,
    rates: RateTable,
}

impl FareCalculator {
    pub fn new(geo: GeoResolver, rates: RateTable) -> Self {
        Self { geo, rates }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let provider: Arc<dyn GeoProvider> = match &config.google_maps {
            Some(maps) => Arc::new(GoogleMaps::new(maps)?),
            None => {
                tracing::warn!("no Google Maps API key configured, all fares will be estimated");
                Arc::new(UnavailableProvider)
            }
        };

        let geo = GeoResolver::new(
            provider,
            Arc::new(ThreadRngSampler),
            config.home_county.clone(),
            config.geo_timeout,
        );

        Ok(Self::new(geo, RateTable::default()))
    }

    /// Prices a request. Geocoding trouble is absorbed as an estimate; any
    /// other failure yields a zero-total quote explaining itself.
    #[tracing::instrument(skip(self))]
    pub async fn calculate_price(&self, request: &FareRequest) -> PriceQuote {
        match self.try_calculate_price(request).await {
            Ok(quote) => quote,
            Err(err) => {
                tracing::error!("unable to calculate price: {}", err);
                PriceQuote::unavailable(&err.message)
            }
        }
    }

    async fn try_calculate_price(&self, request: &FareRequest) -> Result<PriceQuote, Error> {
        let geo = self
            .geo
            .resolve(&request.origin_address, &request.destination_address)
            .await;

        let fare = self.rates.compute_breakdown(request, &geo)?;

        if geo.is_estimated {
            tracing::warn!(total = fare.total, "quoting with an estimated distance");
        }

        Ok(PriceQuote {
            total_price: fare.total,
            formatted_total: format_usd(fare.total),
            breakdown: line_items(&fare),
            fare: Some(fare),
            distance_miles: round_cents(geo.distance_miles),
            duration_text: geo.duration_text,
            is_estimate: geo.is_estimated,
            origin_county: geo.origin_county,
            destination_county: geo.destination_county,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn weekday_afternoon_request() -> FareRequest {
        FareRequest {
            origin_address: "a".into(),
            destination_address: "b".into(),
            scheduled_at: NaiveDate::from_ymd_opt(2026, 10, 14)
                .unwrap()
                .and_hms_opt(14, 0, 0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn quotes_a_home_county_trip() {
        let provider = StaticProvider::new(10.0, &[("a", "Franklin"), ("b", "Franklin")]);
        let calculator = FareCalculator::new(test_resolver(provider), RateTable::default());

        let quote = calculator.calculate_price(&weekday_afternoon_request()).await;

        assert_eq!(quote.total_price, 80.0);
        assert_eq!(quote.formatted_total, "$80.00");
        assert_eq!(quote.distance_miles, 10.0);
        assert_eq!(quote.duration_text, "20 mins");
        assert!(!quote.is_estimate);
        assert_eq!(
            quote.breakdown,
            vec![LineItem::new("Base fare", 50.0), LineItem::new("Mileage", 30.0)]
        );
    }

    #[tokio::test]
    async fn geocoding_outage_is_flagged_as_estimate() {
        let calculator =
            FareCalculator::new(test_resolver(UnavailableProvider), RateTable::default());

        let quote = calculator.calculate_price(&weekday_afternoon_request()).await;
        let fare = quote.fare.unwrap();

        assert!(quote.is_estimate);
        assert!((5.0..=25.0).contains(&quote.distance_miles));
        assert_eq!(fare.county_price, 0.0);
        // fixed draw of 0.5 gives 12.5 miles at the home rate
        assert_eq!(fare.distance_price, 37.5);
        assert_eq!(quote.total_price, 87.5);
    }

    #[tokio::test]
    async fn empty_addresses_price_without_mileage() {
        let provider = StaticProvider::new(10.0, &[]);
        let calculator = FareCalculator::new(test_resolver(provider), RateTable::default());

        let request = FareRequest {
            origin_address: "".into(),
            ..weekday_afternoon_request()
        };
        let quote = calculator.calculate_price(&request).await;

        assert_eq!(quote.distance_miles, 0.0);
        assert_eq!(quote.total_price, 50.0);
    }

    #[tokio::test]
    async fn broken_rate_table_yields_unavailable_quote() {
        let provider = StaticProvider::new(10.0, &[("a", "Franklin"), ("b", "Franklin")]);
        let rates = RateTable {
            home_county_per_mile: f64::NAN,
            ..Default::default()
        };
        let calculator = FareCalculator::new(test_resolver(provider), rates);

        let quote = calculator.calculate_price(&weekday_afternoon_request()).await;

        assert_eq!(quote.total_price, 0.0);
        assert!(quote.is_estimate);
        assert!(quote.fare.is_none());
        assert_eq!(quote.breakdown.len(), 1);
        assert!(quote.breakdown[0].label.starts_with("Unable to calculate price"));
    }
}
