use axum::extract::{Extension, Json};

use crate::entities::FareRequest;
use crate::error::Error;
use crate::pricing::PriceQuote;
use crate::server::DynAPI;

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(request): Json<FareRequest>,
) -> Result<Json<PriceQuote>, Error> {
    let quote = api.quote_fare(request).await?;

    Ok(quote.into())
}
