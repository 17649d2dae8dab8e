/// Unit tests for form collection and boundary validation
/// Tests email/phone validation, required-field rules, and the client flow states
use echoweb_api::form::{
    is_plausible_phone, is_valid_email, FieldChange, FormError, FormField, FormState, LeadForm,
};
use echoweb_api::models::{Provenance, SubmitLeadRequest};
use chrono::Utc;

fn provenance() -> Provenance {
    Provenance::new(None, None, None, None, None, Utc::now())
}

fn filled_form() -> LeadForm {
    let mut form = LeadForm::new();
    form.apply(FieldChange {
        field: FormField::Name,
        value: "Jane Doe".into(),
    });
    form.apply(FieldChange {
        field: FormField::Email,
        value: "jane@x.com".into(),
    });
    form.apply(FieldChange {
        field: FormField::Message,
        value: "Need a site".into(),
    });
    form
}

#[cfg(test)]
mod email_validation_tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("user_name@example-domain.com"));
        assert!(is_valid_email("a@b.c"));
    }

    #[test]
    fn test_invalid_emails_basic() {
        // Missing @ or .
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));

        // Too short
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_invalid_emails_malformed() {
        assert!(!is_valid_email("user @example.com")); // space
        assert!(!is_valid_email("user@exam ple.com")); // space in domain
        assert!(!is_valid_email("user@@example.com"));
    }
}

#[cfg(test)]
mod phone_validation_tests {
    use super::*;

    #[test]
    fn test_plausible_phones() {
        assert!(is_plausible_phone("5551234567"));
        assert!(is_plausible_phone("+1 (555) 123-4567"));
        assert!(is_plausible_phone("020 7946 0958"));
        assert!(is_plausible_phone("+61 2 9374 4000"));
    }

    #[test]
    fn test_implausible_phones() {
        assert!(!is_plausible_phone(""));
        assert!(!is_plausible_phone("123"));
        assert!(!is_plausible_phone("call me maybe"));
        assert!(!is_plausible_phone("5551234567x89")); // extension marker
        assert!(!is_plausible_phone("12345678901234567890")); // beyond E.164 length
    }
}

#[cfg(test)]
mod collector_tests {
    use super::*;

    #[test]
    fn missing_required_fields_rejected_locally() {
        let mut form = LeadForm::new();
        form.apply(FieldChange {
            field: FormField::Message,
            value: "hello".into(),
        });
        form.attach_challenge("tok");

        let err = form.submit(provenance()).unwrap_err();
        assert_eq!(err, FormError::MissingFields(vec!["name", "email"]));
        // Rejection is user-correctable: the form is editable again.
        assert_eq!(form.state(), FormState::Editing);
        assert!(err.user_message().contains("name"));
        assert!(err.user_message().contains("email"));
    }

    #[test]
    fn name_coalesced_from_first_and_last() {
        let mut form = LeadForm::new();
        form.apply(FieldChange {
            field: FormField::FirstName,
            value: "Jane".into(),
        });
        form.apply(FieldChange {
            field: FormField::LastName,
            value: "Doe".into(),
        });
        form.apply(FieldChange {
            field: FormField::Email,
            value: "jane@x.com".into(),
        });
        form.attach_challenge("tok");

        let submission = form.submit(provenance()).unwrap();
        assert_eq!(submission.contact.name, "Jane Doe");
    }

    #[test]
    fn whitespace_only_values_count_as_empty() {
        let mut form = filled_form();
        form.apply(FieldChange {
            field: FormField::Email,
            value: "   ".into(),
        });
        form.attach_challenge("tok");

        assert_eq!(
            form.submit(provenance()).unwrap_err(),
            FormError::MissingFields(vec!["email"])
        );
    }

    #[test]
    fn invalid_email_rejected_before_any_channel() {
        let mut form = filled_form();
        form.apply(FieldChange {
            field: FormField::Email,
            value: "not-an-email".into(),
        });
        form.attach_challenge("tok");

        assert!(matches!(
            form.submit(provenance()).unwrap_err(),
            FormError::InvalidEmail(_)
        ));
    }

    #[test]
    fn phone_checked_only_when_present() {
        let mut form = filled_form();
        form.attach_challenge("tok");
        assert!(form.submit(provenance()).is_ok());

        let mut form = filled_form();
        form.apply(FieldChange {
            field: FormField::Phone,
            value: "not a phone".into(),
        });
        form.attach_challenge("tok");
        assert!(matches!(
            form.submit(provenance()).unwrap_err(),
            FormError::InvalidPhone(_)
        ));
    }

    #[test]
    fn message_falls_back_to_description_then_idea() {
        let base = |field: FormField, value: &str| {
            let mut form = LeadForm::new();
            form.apply(FieldChange {
                field: FormField::Name,
                value: "Jane".into(),
            });
            form.apply(FieldChange {
                field: FormField::Email,
                value: "jane@x.com".into(),
            });
            form.apply(FieldChange {
                field,
                value: value.into(),
            });
            form.attach_challenge("tok");
            form
        };

        let mut form = base(FormField::ProjectIdea, "A storefront");
        assert_eq!(form.submit(provenance()).unwrap().message, "A storefront");

        // An explicit description outranks the idea field.
        let mut form = base(FormField::ProjectIdea, "A storefront");
        form.apply(FieldChange {
            field: FormField::ServiceDescription,
            value: "Redesign".into(),
        });
        assert_eq!(form.submit(provenance()).unwrap().message, "Redesign");
    }
}

#[cfg(test)]
mod flow_state_tests {
    use super::*;

    #[test]
    fn token_absence_blocks_until_attached() {
        let mut form = filled_form();
        assert!(!form.has_challenge_token());

        let err = form.submit(provenance()).unwrap_err();
        assert_eq!(err, FormError::ChallengeRequired);
        assert_eq!(form.state(), FormState::Blocked);
        assert_eq!(
            err.user_message(),
            "Please complete the verification to submit the form."
        );

        // The check is re-evaluated on every attempt, not cached.
        assert_eq!(form.submit(provenance()).unwrap_err(), FormError::ChallengeRequired);

        form.attach_challenge("tok");
        assert!(form.has_challenge_token());
        assert!(form.submit(provenance()).is_ok());
    }

    #[test]
    fn failed_delivery_returns_to_editing() {
        let mut form = filled_form();
        form.attach_challenge("tok");

        form.submit(provenance()).unwrap();
        assert_eq!(form.state(), FormState::Submitting);

        form.mark_delivered(false);
        assert_eq!(form.state(), FormState::Failed);

        // No terminal failure: editing resumes and a retry can succeed.
        form.apply(FieldChange {
            field: FormField::Notes,
            value: "second try".into(),
        });
        assert_eq!(form.state(), FormState::Editing);
        form.submit(provenance()).unwrap();
        form.mark_delivered(true);
        assert_eq!(form.state(), FormState::Succeeded);
    }

    #[test]
    fn concurrent_attempts_rejected_while_submitting() {
        let mut form = filled_form();
        form.attach_challenge("tok");

        form.submit(provenance()).unwrap();
        assert_eq!(
            form.submit(provenance()).unwrap_err(),
            FormError::AlreadySubmitting
        );

        // Edits while in flight are ignored (inputs are disabled client-side).
        form.apply(FieldChange {
            field: FormField::Name,
            value: "Other".into(),
        });
        assert_eq!(form.state(), FormState::Submitting);
    }
}

#[cfg(test)]
mod request_replay_tests {
    use super::*;

    #[test]
    fn request_replay_enforces_same_invariants() {
        let req = SubmitLeadRequest {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            email: Some("jane@x.com".into()),
            message: Some("Need a site".into()),
            turnstile_token: Some("tok".into()),
            ..Default::default()
        };

        let mut form = LeadForm::from_request(&req);
        let submission = form.submit(provenance()).unwrap();
        assert_eq!(submission.contact.name, "Jane Doe");
        assert_eq!(submission.classification.form_type, "general");

        // Same payload without the token is blocked, not relayed.
        let req = SubmitLeadRequest {
            turnstile_token: None,
            ..req
        };
        let mut form = LeadForm::from_request(&req);
        assert_eq!(form.submit(provenance()).unwrap_err(), FormError::ChallengeRequired);
    }

    #[test]
    fn unknown_wire_fields_become_provenance_tags() {
        let raw = serde_json::json!({
            "name": "Jane Doe",
            "email": "jane@x.com",
            "turnstileToken": "tok",
            "quizScore": 7,
            "submittedAt": "2025-06-01T12:00:00Z",
        });
        let req: SubmitLeadRequest = serde_json::from_value(raw).unwrap();

        let mut form = LeadForm::from_request(&req);
        let submission = form.submit(provenance()).unwrap();

        assert_eq!(
            submission.provenance.extra.get("quizScore").map(String::as_str),
            Some("7")
        );
        assert_eq!(
            submission.provenance.extra.get("submittedAt").map(String::as_str),
            Some("2025-06-01T12:00:00Z")
        );
    }
}
