mod fare;
mod trip;

pub use fare::{FareRequest, WheelchairType};
pub use trip::{Status as TripStatus, Trip, TripRequest};
