use super::{helpers, Engine};

use async_trait::async_trait;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;

use crate::{
    api::TripAPI,
    entities::{Trip, TripRequest},
    error::{invalid_input_error, Error},
};

#[async_trait]
impl TripAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_trip(&self, request: TripRequest) -> Result<Trip, Error> {
        request.fare.validate()?;

        let quote = self.calculator.calculate_price(&request.fare).await;
        if quote.is_estimate {
            tracing::warn!(
                total = quote.total_price,
                "booking trip with an estimated price"
            );
        }

        let trip = Trip::new(request, &quote);

        let mut conn = self.pool.acquire().await?;
        conn.execute(
            sqlx::query(
                "INSERT INTO trips (id, client_id, status, price, data) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&trip.id)
            .bind(&trip.client_id)
            .bind(trip.status.name())
            .bind(trip.price)
            .bind(Json(&trip)),
        )
        .await?;

        tracing::info!(trip_id = %trip.id, price = trip.price, "created trip");

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1").bind(&id))
            .await?;

        let result = maybe_result.ok_or_else(invalid_input_error)?;
        let Json(trip) = result.try_get("data")?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_trip(&self, id: Uuid) -> Result<Trip, Error> {
        let mut tx = self.pool.begin().await?;

        let mut trip = helpers::fetch_trip_for_update(&mut tx, &id).await?;
        trip.cancel()?;
        helpers::update_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        Ok(trip)
    }
}
