use crate::errors::{AppError, ResultExt};
use crate::models::{LeadSubmission, StoredLead};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// The acceptance channel's storage: one row per accepted lead.
pub struct LeadStore {
    pool: PgPool,
}

impl LeadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts one accepted submission and returns its row id.
    ///
    /// `email_sent` records the advisory channel's outcome alongside the
    /// lead so follow-up knows whether a confirmation went out. The full
    /// record is kept as JSON next to the flattened columns used for lookup.
    pub async fn insert(
        &self,
        submission: &LeadSubmission,
        email_sent: bool,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();

        let payload_raw = serde_json::to_value(submission)
            .map_err(|e| AppError::InternalError(format!("Failed to serialize lead: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO leads (
                id,
                form_type,
                name,
                email,
                phone,
                company,
                message,
                resource_slug,
                payload_raw,
                lead_quality,
                revenue_tier,
                email_sent,
                received_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id)
        .bind(&submission.classification.form_type)
        .bind(&submission.contact.name)
        .bind(&submission.contact.email)
        .bind(&submission.contact.phone)
        .bind(&submission.contact.company)
        .bind(&submission.message)
        .bind(&submission.classification.resource_slug)
        .bind(payload_raw)
        .bind(&submission.tags.quality)
        .bind(&submission.tags.tier)
        .bind(email_sent)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to store accepted lead")?;

        tracing::info!(
            "✓ Lead stored: {} ({}, {})",
            id,
            submission.classification.form_type,
            submission.contact.email
        );
        Ok(id)
    }

    /// Fetches one stored lead by row id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredLead>, AppError> {
        let lead = sqlx::query_as::<_, StoredLead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }
}
