use farebox::config::Config;
use farebox::db::PgPool;
use farebox::engine::Engine;
use farebox::error::Error;
use farebox::pricing::FareCalculator;
use farebox::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let PgPool(pool) = PgPool::new(&config.database_url, config.database_max_connections).await?;

    let engine = Engine::new(pool, FareCalculator::from_config(&config)?);
    engine.migrate().await?;

    serve(engine, config.listen_addr).await
}
