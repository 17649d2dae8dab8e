use std::env;

use chrono::Utc;
use echoweb_api::data::storage::LeadStore;
use echoweb_api::db::Database;
use echoweb_api::form::{FieldChange, FormField, LeadForm};
use echoweb_api::models::Provenance;
use uuid::Uuid;

/// Integration smoke test for the acceptance channel writing to the leads table.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn store_lead_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    db.ensure_schema().await?;
    let store = LeadStore::new(db.pool.clone());

    // Use a unique email to keep repeated runs distinguishable.
    let email = format!("smoke+{}@example.com", Uuid::new_v4().simple());

    let mut form = LeadForm::new();
    form.apply(FieldChange {
        field: FormField::Name,
        value: "Smoke Test".into(),
    });
    form.apply(FieldChange {
        field: FormField::Email,
        value: email.clone(),
    });
    form.apply(FieldChange {
        field: FormField::Message,
        value: "storage smoke".into(),
    });
    form.attach_challenge("tok");
    let submission = form
        .submit(Provenance::new(
            Some("test".into()),
            None,
            None,
            None,
            None,
            Utc::now(),
        ))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let lead_id = store
        .insert(&submission, false)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    assert_ne!(lead_id, Uuid::nil());

    let stored = store
        .find_by_id(lead_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .ok_or_else(|| anyhow::anyhow!("inserted lead not found"))?;

    assert_eq!(stored.email, email);
    assert_eq!(stored.form_type, "general");
    assert_eq!(stored.lead_quality, "new");
    assert!(!stored.email_sent);
    assert_eq!(stored.payload_raw["provenance"]["utmSource"], "test");

    Ok(())
}
