use sqlx::PgPool;

pub mod payment;

/// Postgres-backed implementation of the storage ports.
pub struct PostgresPersistence {
    pub pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
