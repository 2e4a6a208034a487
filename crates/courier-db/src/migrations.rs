use sqlx::{Executor, PgPool};
use tracing::info;

use crate::StoreError;

/// The whole schema. `IF NOT EXISTS` keeps this safe to run on every startup
/// and from concurrently starting instances.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS messages (
        id          SERIAL PRIMARY KEY,
        content     TEXT NOT NULL,
        timestamp   TIMESTAMPTZ DEFAULT NOW()
    );
";

pub async fn run(pool: &PgPool) -> Result<(), StoreError> {
    pool.execute(SCHEMA).await?;

    info!("database migrations complete");
    Ok(())
}
