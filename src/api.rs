use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{FareRequest, Trip, TripRequest};
use crate::error::Error;
use crate::pricing::PriceQuote;

#[async_trait]
pub trait QuoteAPI {
    async fn quote_fare(&self, request: FareRequest) -> Result<PriceQuote, Error>;
}

#[async_trait]
pub trait TripAPI {
    async fn create_trip(&self, request: TripRequest) -> Result<Trip, Error>;
    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error>;
    async fn cancel_trip(&self, id: Uuid) -> Result<Trip, Error>;
}

pub trait API: QuoteAPI + TripAPI {}
