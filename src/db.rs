use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Creates the leads table when it does not exist yet.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                id            UUID PRIMARY KEY,
                form_type     TEXT NOT NULL,
                name          TEXT NOT NULL,
                email         TEXT NOT NULL,
                phone         TEXT,
                company       TEXT,
                message       TEXT NOT NULL DEFAULT '',
                resource_slug TEXT,
                payload_raw   JSONB NOT NULL,
                lead_quality  TEXT NOT NULL,
                revenue_tier  TEXT NOT NULL,
                email_sent    BOOLEAN NOT NULL DEFAULT FALSE,
                received_at   TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS leads_email_idx ON leads (email)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS leads_received_at_idx ON leads (received_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
