use sqlx::PgPool;

/// Runs SQL processors against the connection pool.
///
/// Every query is modelled as its own input type with a
/// `kanau::processor::Processor` implementation on this struct.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

impl DatabaseProcessor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
