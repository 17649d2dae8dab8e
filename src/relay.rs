use crate::emailjs::EmailJsClient;
use crate::errors::AppError;
use crate::models::LeadSubmission;
use crate::storage::LeadStore;
use uuid::Uuid;

/// Composite result of one relay attempt.
///
/// `accepted` mirrors the acceptance channel alone; `email_sent` is advisory
/// and only tailors the user-visible confirmation. Best effort, log and move
/// on: the visitor sees success as long as their data was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub accepted: bool,
    pub email_sent: bool,
    pub lead_id: Option<Uuid>,
    pub message: String,
}

impl RelayOutcome {
    /// The composite-result policy, in one place: acceptance is
    /// authoritative, email advisory. Idempotent over the email outcome:
    /// however often the email channel fails, an accepted submission stays
    /// accepted.
    pub fn compose(
        email_sent: bool,
        acceptance: Result<Uuid, AppError>,
        fallback_contact: &str,
    ) -> Self {
        match acceptance {
            Ok(lead_id) => Self {
                accepted: true,
                email_sent,
                lead_id: Some(lead_id),
                message: if email_sent {
                    "Lead submitted successfully. Check your email for confirmation.".to_string()
                } else {
                    "Lead received but email notification failed. We will still respond within 24 hours."
                        .to_string()
                },
            },
            Err(_) => Self {
                accepted: false,
                email_sent,
                lead_id: None,
                message: format!(
                    "Failed to submit lead. Please try emailing us directly at {}",
                    fallback_contact
                ),
            },
        }
    }
}

/// Delivers a completed submission through two independent channels.
pub struct SubmissionRelayer {
    email: Option<EmailJsClient>,
    store: LeadStore,
    fallback_contact: String,
}

impl SubmissionRelayer {
    pub fn new(email: Option<EmailJsClient>, store: LeadStore, fallback_contact: String) -> Self {
        Self {
            email,
            store,
            fallback_contact,
        }
    }

    /// Attempts delivery: the email channel first, then the acceptance
    /// channel, with neither outcome gating the other. Channel failures are
    /// caught and logged here; nothing propagates to the caller, and there
    /// are no retries; a failed attempt requires the visitor to resubmit.
    pub async fn relay(&self, submission: &LeadSubmission) -> RelayOutcome {
        let email_sent = match &self.email {
            Some(client) => match client.send(submission).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Email channel failed: {}", e);
                    false
                }
            },
            None => {
                tracing::warn!(
                    "Email channel not configured; lead from {} recorded without notification",
                    submission.contact.email
                );
                false
            }
        };

        let acceptance = self.store.insert(submission, email_sent).await;
        if let Err(ref e) = acceptance {
            tracing::error!("Acceptance channel failed: {}", e);
        }

        RelayOutcome::compose(email_sent, acceptance, &self.fallback_contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "hello@echoweb.com";

    #[test]
    fn acceptance_success_with_email_success() {
        let id = Uuid::new_v4();
        let outcome = RelayOutcome::compose(true, Ok(id), FALLBACK);
        assert!(outcome.accepted);
        assert!(outcome.email_sent);
        assert_eq!(outcome.lead_id, Some(id));
        assert!(outcome.message.contains("Check your email"));
    }

    #[test]
    fn email_failure_does_not_demote_acceptance() {
        let outcome = RelayOutcome::compose(false, Ok(Uuid::new_v4()), FALLBACK);
        assert!(outcome.accepted);
        assert!(!outcome.email_sent);
        assert!(outcome.message.contains("email notification failed"));
    }

    #[test]
    fn acceptance_failure_surfaces_fallback_contact() {
        let outcome = RelayOutcome::compose(
            true,
            Err(AppError::InternalError("boom".into())),
            FALLBACK,
        );
        assert!(!outcome.accepted);
        assert_eq!(outcome.lead_id, None);
        assert!(outcome.message.contains(FALLBACK));
    }

    #[test]
    fn compose_is_idempotent_over_email_failures() {
        let id = Uuid::new_v4();
        let first = RelayOutcome::compose(false, Ok(id), FALLBACK);
        for _ in 0..3 {
            let again = RelayOutcome::compose(false, Ok(id), FALLBACK);
            assert_eq!(again, first);
        }
    }
}
