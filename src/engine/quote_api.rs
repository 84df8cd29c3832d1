use super::Engine;

use async_trait::async_trait;

use crate::{api::QuoteAPI, entities::FareRequest, error::Error, pricing::PriceQuote};

#[async_trait]
impl QuoteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn quote_fare(&self, request: FareRequest) -> Result<PriceQuote, Error> {
        request.validate()?;

        Ok(self.calculator.calculate_price(&request).await)
    }
}
