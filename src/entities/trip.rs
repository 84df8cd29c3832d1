use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::FareRequest;
use crate::error::{invalid_state_error, Error};
use crate::pricing::{LineItem, PriceQuote};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripRequest {
    pub client_id: Uuid,
    #[serde(flatten)]
    pub fare: FareRequest,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A booked trip. The price fields are a snapshot taken at booking time and
/// are never recomputed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub client_id: Uuid,
    pub status: Status,
    pub request: FareRequest,
    pub notes: Option<String>,
    pub price: f64,
    pub price_breakdown: Vec<LineItem>,
    pub price_is_estimate: bool,
    pub distance_miles: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Cancelled,
}

impl Status {
    pub fn name(&self) -> String {
        match self {
            Self::Pending => "pending".into(),
            Self::Cancelled => "cancelled".into(),
        }
    }
}

impl Trip {
    pub fn new(request: TripRequest, quote: &PriceQuote) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: request.client_id,
            status: Status::Pending,
            request: request.fare,
            notes: request.notes,
            price: quote.total_price,
            price_breakdown: quote.breakdown.clone(),
            price_is_estimate: quote.is_estimate,
            distance_miles: quote.distance_miles,
            created_at: Utc::now(),
        }
    }

    #[tracing::instrument(skip(self), fields(trip_id = %self.id))]
    pub fn cancel(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Pending => {
                self.status = Status::Cancelled;
                Ok(())
            }
            _ => Err(invalid_state_error()),
        }
    }
}
