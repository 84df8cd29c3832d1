use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{timeout_error, upstream_error, Error};

pub const UNKNOWN_COUNTY: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrivingDistance {
    pub distance_miles: f64,
    pub duration_text: String,
}

/// Routing and geocoding capability the fare engine calls out to.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn resolve_driving_distance(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<DrivingDistance, Error>;

    /// `Ok(None)` when the address has no county-level component.
    async fn resolve_county(&self, address: &str) -> Result<Option<String>, Error>;
}

/// Stands in when no mapping provider is configured.
pub struct UnavailableProvider;

#[async_trait]
impl GeoProvider for UnavailableProvider {
    async fn resolve_driving_distance(&self, _: &str, _: &str) -> Result<DrivingDistance, Error> {
        Err(upstream_error())
    }

    async fn resolve_county(&self, _: &str) -> Result<Option<String>, Error> {
        Err(upstream_error())
    }
}

/// Uniform draws in `[0, 1)`.
pub trait DistanceSampler: Send + Sync {
    fn sample(&self) -> f64;
}

pub struct ThreadRngSampler;

impl DistanceSampler for ThreadRngSampler {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

pub struct FixedSampler(pub f64);

impl DistanceSampler for FixedSampler {
    fn sample(&self) -> f64 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FallbackDistance {
    pub min_miles: f64,
    pub max_miles: f64,
    pub spread_miles: f64,
}

impl Default for FallbackDistance {
    fn default() -> Self {
        Self {
            min_miles: 5.0,
            max_miles: 25.0,
            spread_miles: 15.0,
        }
    }
}

impl FallbackDistance {
    pub fn estimate(&self, draw: f64) -> f64 {
        (self.min_miles + draw * self.spread_miles).clamp(self.min_miles, self.max_miles)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoResolution {
    /// One way.
    pub distance_miles: f64,
    pub duration_text: String,
    pub is_estimated: bool,
    pub origin_county: String,
    pub destination_county: String,
    pub is_same_franklin_county: bool,
    pub counties_crossed_out_of_home: usize,
}

#[derive(Clone, Debug, PartialEq)]
struct CountyFacts {
    origin_county: String,
    destination_county: String,
    is_same_home_county: bool,
    counties_crossed_out_of_home: usize,
}

pub struct GeoResolver {
    provider: Arc<dyn GeoProvider>,
    sampler: Arc<dyn DistanceSampler>,
    fallback: FallbackDistance,
    home_county: String,
    timeout: Duration,
}

impl GeoResolver {
    pub fn new(
        provider: Arc<dyn GeoProvider>,
        sampler: Arc<dyn DistanceSampler>,
        home_county: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            sampler,
            fallback: FallbackDistance::default(),
            home_county: home_county.into(),
            timeout,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackDistance) -> Self {
        self.fallback = fallback;
        self
    }

    /// Resolves distance and counties for a pair of addresses. Provider
    /// failures and timeouts degrade to an estimated distance and home-county
    /// pricing with the county names left unknown; this never fails.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, origin: &str, destination: &str) -> GeoResolution {
        if origin.trim().is_empty() || destination.trim().is_empty() {
            tracing::warn!("addresses missing, skipping geo resolution");
            return self.unresolved();
        }

        let (distance, counties) = futures::join!(
            self.resolve_distance(origin, destination),
            self.resolve_counties(origin, destination)
        );

        let (distance, is_estimated) = distance;

        GeoResolution {
            distance_miles: distance.distance_miles,
            duration_text: distance.duration_text,
            is_estimated,
            origin_county: counties.origin_county,
            destination_county: counties.destination_county,
            is_same_franklin_county: counties.is_same_home_county,
            counties_crossed_out_of_home: counties.counties_crossed_out_of_home,
        }
    }

    fn unresolved(&self) -> GeoResolution {
        GeoResolution {
            distance_miles: 0.0,
            duration_text: "".into(),
            is_estimated: false,
            origin_county: UNKNOWN_COUNTY.into(),
            destination_county: UNKNOWN_COUNTY.into(),
            is_same_franklin_county: true,
            counties_crossed_out_of_home: 0,
        }
    }

    async fn resolve_distance(&self, origin: &str, destination: &str) -> (DrivingDistance, bool) {
        let result = self
            .bounded(self.provider.resolve_driving_distance(origin, destination))
            .await
            .and_then(|d| {
                if d.distance_miles.is_finite() && d.distance_miles >= 0.0 {
                    Ok(d)
                } else {
                    Err(upstream_error())
                }
            });

        match result {
            Ok(distance) => (distance, false),
            Err(err) => {
                let distance_miles = self.fallback.estimate(self.sampler.sample());
                tracing::warn!(
                    "distance lookup failed ({}), estimating {:.1} miles",
                    err,
                    distance_miles
                );

                (
                    DrivingDistance {
                        distance_miles,
                        duration_text: "".into(),
                    },
                    true,
                )
            }
        }
    }

    async fn resolve_counties(&self, origin: &str, destination: &str) -> CountyFacts {
        let (origin_county, destination_county) = futures::join!(
            self.bounded(self.provider.resolve_county(origin)),
            self.bounded(self.provider.resolve_county(destination))
        );

        match (origin_county, destination_county) {
            (Ok(origin_county), Ok(destination_county)) => {
                self.county_facts(origin_county, destination_county)
            }
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!("county lookup failed ({}), assuming home county", err);

                CountyFacts {
                    origin_county: UNKNOWN_COUNTY.into(),
                    destination_county: UNKNOWN_COUNTY.into(),
                    is_same_home_county: true,
                    counties_crossed_out_of_home: 0,
                }
            }
        }
    }

    fn county_facts(&self, origin: Option<String>, destination: Option<String>) -> CountyFacts {
        let is_home =
            |county: &Option<String>| county.as_deref() == Some(self.home_county.as_str());

        let foreign: BTreeSet<&str> = [&origin, &destination]
            .into_iter()
            .filter_map(|county| county.as_deref())
            .filter(|county| *county != self.home_county)
            .collect();

        CountyFacts {
            is_same_home_county: is_home(&origin) && is_home(&destination),
            counties_crossed_out_of_home: foreign.len(),
            origin_county: origin.clone().unwrap_or_else(|| UNKNOWN_COUNTY.into()),
            destination_county: destination.clone().unwrap_or_else(|| UNKNOWN_COUNTY.into()),
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(timeout_error()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::time::Instant;

    /// Answers from fixed tables; addresses missing from `counties` are not
    /// found, addresses in `failing` return an error.
    pub struct StaticProvider {
        pub distance: Result<DrivingDistance, Error>,
        pub counties: HashMap<String, String>,
        pub failing: HashSet<String>,
        pub delay: Duration,
    }

    impl StaticProvider {
        pub fn new(distance_miles: f64, counties: &[(&str, &str)]) -> Self {
            Self {
                distance: Ok(DrivingDistance {
                    distance_miles,
                    duration_text: "20 mins".into(),
                }),
                counties: counties
                    .iter()
                    .map(|(a, c)| (a.to_string(), c.to_string()))
                    .collect(),
                failing: HashSet::new(),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl GeoProvider for StaticProvider {
        async fn resolve_driving_distance(
            &self,
            _: &str,
            _: &str,
        ) -> Result<DrivingDistance, Error> {
            tokio::time::sleep(self.delay).await;
            self.distance.clone()
        }

        async fn resolve_county(&self, address: &str) -> Result<Option<String>, Error> {
            tokio::time::sleep(self.delay).await;
            if self.failing.contains(address) {
                return Err(upstream_error());
            }
            Ok(self.counties.get(address).cloned())
        }
    }

    pub fn resolver(provider: impl GeoProvider + 'static) -> GeoResolver {
        GeoResolver::new(
            Arc::new(provider),
            Arc::new(FixedSampler(0.5)),
            "Franklin",
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn both_ends_in_home_county() {
        let provider = StaticProvider::new(10.0, &[("a", "Franklin"), ("b", "Franklin")]);
        let geo = resolver(provider).resolve("a", "b").await;

        assert_eq!(geo.distance_miles, 10.0);
        assert_eq!(geo.duration_text, "20 mins");
        assert!(!geo.is_estimated);
        assert!(geo.is_same_franklin_county);
        assert_eq!(geo.counties_crossed_out_of_home, 0);
    }

    #[tokio::test]
    async fn counts_distinct_foreign_counties() {
        let provider = StaticProvider::new(
            10.0,
            &[("a", "Franklin"), ("b", "Delaware"), ("c", "Licking"), ("d", "Delaware")],
        );
        let resolver = resolver(provider);

        let geo = resolver.resolve("a", "b").await;
        assert!(!geo.is_same_franklin_county);
        assert_eq!(geo.counties_crossed_out_of_home, 1);

        let geo = resolver.resolve("b", "c").await;
        assert_eq!(geo.counties_crossed_out_of_home, 2);

        let geo = resolver.resolve("b", "d").await;
        assert_eq!(geo.counties_crossed_out_of_home, 1);
    }

    #[tokio::test]
    async fn unresolved_county_adds_no_crossing() {
        let provider = StaticProvider::new(10.0, &[("a", "Franklin")]);
        let geo = resolver(provider).resolve("a", "nowhere").await;

        assert_eq!(geo.destination_county, UNKNOWN_COUNTY);
        assert!(!geo.is_same_franklin_county);
        assert_eq!(geo.counties_crossed_out_of_home, 0);
    }

    #[tokio::test]
    async fn provider_down_degrades_to_estimate_and_home_county() {
        let geo = resolver(UnavailableProvider).resolve("a", "b").await;

        assert!(geo.is_estimated);
        assert_eq!(geo.distance_miles, 12.5);
        assert!(geo.is_same_franklin_county);
        assert_eq!(geo.counties_crossed_out_of_home, 0);
        assert_eq!(geo.origin_county, UNKNOWN_COUNTY);
        assert_eq!(geo.destination_county, UNKNOWN_COUNTY);
    }

    #[tokio::test]
    async fn one_failed_county_lookup_defaults_whole_request() {
        let mut provider = StaticProvider::new(10.0, &[("b", "Delaware")]);
        provider.failing.insert("a".into());

        let geo = resolver(provider).resolve("a", "b").await;

        assert!(!geo.is_estimated);
        assert_eq!(geo.distance_miles, 10.0);
        assert!(geo.is_same_franklin_county);
        assert_eq!(geo.counties_crossed_out_of_home, 0);
        assert_eq!(geo.origin_county, UNKNOWN_COUNTY);
        assert_eq!(geo.destination_county, UNKNOWN_COUNTY);
    }

    #[tokio::test]
    async fn lookups_run_concurrently() {
        let mut provider = StaticProvider::new(10.0, &[("a", "Delaware"), ("b", "Licking")]);
        provider.delay = Duration::from_millis(300);

        let started = Instant::now();
        let geo = resolver(provider).resolve("a", "b").await;
        let elapsed = started.elapsed();

        // three calls of 300ms each; sequential awaits would take 900ms
        assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
        assert!(!geo.is_estimated);
        assert_eq!(geo.counties_crossed_out_of_home, 2);
    }

    #[tokio::test]
    async fn custom_fallback_bounds() {
        let resolver = resolver(UnavailableProvider).with_fallback(FallbackDistance {
            min_miles: 2.0,
            max_miles: 3.0,
            spread_miles: 10.0,
        });

        let geo = resolver.resolve("a", "b").await;

        assert!(geo.is_estimated);
        assert_eq!(geo.distance_miles, 3.0);
    }

    #[tokio::test]
    async fn slow_provider_times_out_to_fallback() {
        let mut provider = StaticProvider::new(10.0, &[("a", "Delaware"), ("b", "Licking")]);
        provider.delay = Duration::from_secs(5);

        let resolver = GeoResolver::new(
            Arc::new(provider),
            Arc::new(FixedSampler(0.0)),
            "Franklin",
            Duration::from_millis(20),
        );
        let geo = resolver.resolve("a", "b").await;

        assert!(geo.is_estimated);
        assert_eq!(geo.distance_miles, 5.0);
        assert_eq!(geo.counties_crossed_out_of_home, 0);
    }

    #[tokio::test]
    async fn nonsense_distance_is_treated_as_failure() {
        let provider = StaticProvider::new(f64::NAN, &[]);
        let geo = resolver(provider).resolve("a", "b").await;

        assert!(geo.is_estimated);
        assert!(geo.distance_miles.is_finite());
    }

    #[tokio::test]
    async fn empty_address_is_unresolved_not_an_error() {
        let provider = StaticProvider::new(10.0, &[]);
        let geo = resolver(provider).resolve("", "b").await;

        assert_eq!(geo.distance_miles, 0.0);
        assert!(!geo.is_estimated);
        assert_eq!(geo.origin_county, UNKNOWN_COUNTY);
    }

    #[test]
    fn fallback_stays_in_bounds() {
        let fallback = FallbackDistance::default();

        assert_eq!(fallback.estimate(0.0), 5.0);
        assert_eq!(fallback.estimate(1.0), 20.0);
        assert_eq!(fallback.estimate(-3.0), 5.0);
        assert_eq!(fallback.estimate(7.0), 25.0);

        for _ in 0..1000 {
            let miles = fallback.estimate(ThreadRngSampler.sample());
            assert!((5.0..=25.0).contains(&miles));
        }
    }
}
