pub mod quotes;
pub mod trips;
