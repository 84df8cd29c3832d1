use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::entities::FareRequest;
use crate::error::{unexpected_error, Error};
use crate::pricing::GeoResolution;

/// Fixed rates in dollars.
#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    /// Charged once per leg.
    pub base_per_leg: f64,
    pub home_county_per_mile: f64,
    pub out_of_county_per_mile: f64,
    pub county_fee: f64,
    pub weekend_after_hours_fee: f64,
    pub emergency_fee: f64,
    pub wheelchair_rental_fee: f64,
    pub veteran_discount_rate: f64,
    pub business_hours_start: u32,
    pub business_hours_end: u32,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            base_per_leg: 50.0,
            home_county_per_mile: 3.0,
            out_of_county_per_mile: 4.0,
            county_fee: 50.0,
            weekend_after_hours_fee: 40.0,
            emergency_fee: 40.0,
            wheelchair_rental_fee: 25.0,
            veteran_discount_rate: 0.2,
            business_hours_start: 8,
            business_hours_end: 18,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FareBreakdown {
    pub base_price: f64,
    pub round_trip_price: f64,
    pub distance_price: f64,
    pub county_price: f64,
    pub weekend_after_hours_surcharge: f64,
    pub emergency_fee: f64,
    pub wheelchair_price: f64,
    /// Subtracted from the other items.
    pub veteran_discount: f64,
    pub total: f64,
}

fn decimal(amount: f64) -> Result<Decimal, Error> {
    Decimal::from_str(&amount.to_string())
        .map_err(|_| unexpected_error(format!("{} is not a representable amount", amount)))
}

fn cents(amount: Decimal) -> f64 {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_string()
        .parse()
        .unwrap_or(f64::NAN)
}

/// Rounds to the cent, half a cent away from zero.
pub fn round_cents(amount: f64) -> f64 {
    match decimal(amount) {
        Ok(amount) => cents(amount),
        Err(_) => amount,
    }
}

impl RateTable {
    pub fn is_after_hours_or_weekend(&self, at: &NaiveDateTime) -> bool {
        let hour = at.hour();

        hour < self.business_hours_start
            || hour >= self.business_hours_end
            || matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Prices a request against already-resolved geography. Items are summed
    /// unrounded and every field is rounded to cents at the end. Fails only
    /// when a rate or the distance is not a representable amount.
    pub fn compute_breakdown(
        &self,
        request: &FareRequest,
        geo: &GeoResolution,
    ) -> Result<FareBreakdown, Error> {
        let base_price = decimal(self.base_per_leg)?;
        let round_trip_price = if request.is_round_trip {
            base_price
        } else {
            Decimal::ZERO
        };

        let effective_distance = if request.is_round_trip {
            decimal(geo.distance_miles)? * Decimal::TWO
        } else {
            decimal(geo.distance_miles)?
        };
        let per_mile = if geo.is_same_franklin_county {
            decimal(self.home_county_per_mile)?
        } else {
            decimal(self.out_of_county_per_mile)?
        };
        let distance_price = effective_distance * per_mile;

        // the first foreign county is covered by the out-of-county mileage rate
        let county_price = if geo.counties_crossed_out_of_home >= 2 {
            Decimal::from(geo.counties_crossed_out_of_home - 1) * decimal(self.county_fee)?
        } else {
            Decimal::ZERO
        };

        let weekend_after_hours_surcharge = match &request.scheduled_at {
            Some(at) if self.is_after_hours_or_weekend(at) => {
                decimal(self.weekend_after_hours_fee)?
            }
            _ => Decimal::ZERO,
        };

        let emergency_fee = if request.is_emergency {
            decimal(self.emergency_fee)?
        } else {
            Decimal::ZERO
        };

        let wheelchair_price = if request.agency_provides_wheelchair {
            decimal(self.wheelchair_rental_fee)?
        } else {
            Decimal::ZERO
        };

        let subtotal = base_price
            + round_trip_price
            + distance_price
            + county_price
            + weekend_after_hours_surcharge
            + emergency_fee
            + wheelchair_price;

        let veteran_discount = if request.is_veteran {
            subtotal * decimal(self.veteran_discount_rate)?
        } else {
            Decimal::ZERO
        };

        Ok(FareBreakdown {
            base_price: cents(base_price),
            round_trip_price: cents(round_trip_price),
            distance_price: cents(distance_price),
            county_price: cents(county_price),
            weekend_after_hours_surcharge: cents(weekend_after_hours_surcharge),
            emergency_fee: cents(emergency_fee),
            wheelchair_price: cents(wheelchair_price),
            veteran_discount: cents(veteran_discount),
            total: cents(subtotal - veteran_discount),
        })
    }
}
