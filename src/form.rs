/// Form collection and boundary validation for lead submissions.
///
/// `LeadForm` accumulates field edits into a single in-memory record and only
/// produces a `LeadSubmission` once required fields pass validation and a
/// challenge token is attached. Provenance is frozen at submission time, not
/// at field-edit time. No network calls happen here; a rejected submission is
/// surfaced as a user-visible message and the form returns to editing.
use crate::models::{Classification, ContactFields, LeadSubmission, LeadTags, Provenance, SubmitLeadRequest};
use regex::Regex;
use std::collections::BTreeMap;

/// Fields a visitor can edit, one variant per input the site's forms expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    FirstName,
    LastName,
    Email,
    Phone,
    Company,
    FormType,
    ServiceType,
    Budget,
    Timeline,
    LaunchDate,
    ProjectPriority,
    BusinessModel,
    AppointmentStyle,
    RevenueStreamType,
    MainGoal,
    ResourceSlug,
    Message,
    ServiceDescription,
    ProjectIdea,
    Notes,
}

/// A single field-change event: which field, and its new value.
#[derive(Debug, Clone)]
pub struct FieldChange {
    pub field: FormField,
    pub value: String,
}

/// Client-flow states. `Failed` and `Blocked` always permit a return to
/// `Editing`; there is no terminal failure state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Editing,
    Submitting,
    Succeeded,
    /// Submission attempted without an available challenge token.
    Blocked,
    Failed,
}

/// Local validation outcomes. All user-correctable; never logged as system errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// One or more required fields were empty at submission time.
    MissingFields(Vec<&'static str>),
    InvalidEmail(String),
    InvalidPhone(String),
    /// No challenge token was available when submission was attempted.
    ChallengeRequired,
    /// A submission attempt is already in flight.
    AlreadySubmitting,
}

impl FormError {
    /// Inline message shown next to the form.
    pub fn user_message(&self) -> String {
        match self {
            FormError::MissingFields(fields) => {
                format!("Please fill in the required fields: {}", fields.join(", "))
            }
            FormError::InvalidEmail(email) => {
                format!("\"{}\" does not look like a valid email address", email)
            }
            FormError::InvalidPhone(phone) => {
                format!("\"{}\" does not look like a valid phone number", phone)
            }
            FormError::ChallengeRequired => {
                "Please complete the verification to submit the form.".to_string()
            }
            FormError::AlreadySubmitting => "Submission already in progress.".to_string(),
        }
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for FormError {}

/// In-memory accumulator for one lead submission.
#[derive(Debug, Clone, Default)]
pub struct LeadForm {
    state: FormState,
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    form_type: Option<String>,
    service_type: Option<String>,
    budget: Option<String>,
    timeline: Option<String>,
    launch_date: Option<String>,
    project_priority: Option<String>,
    business_model: Option<String>,
    appointment_style: Option<String>,
    revenue_stream_type: Option<String>,
    main_goal: Option<String>,
    resource_slug: Option<String>,
    message: Option<String>,
    service_description: Option<String>,
    project_idea: Option<String>,
    notes: Option<String>,
    consent: bool,
    challenge_token: Option<String>,
    extra_tags: BTreeMap<String, String>,
}

impl LeadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    /// Applies one field-change event. Editing resumes after a failed or
    /// blocked attempt; edits during an in-flight submission are ignored
    /// (the UI disables inputs while submitting).
    pub fn apply(&mut self, change: FieldChange) {
        if self.state() == FormState::Submitting {
            return;
        }
        self.state = FormState::Editing;

        let value = normalize(change.value);
        match change.field {
            FormField::Name => self.name = value,
            FormField::FirstName => self.first_name = value,
            FormField::LastName => self.last_name = value,
            FormField::Email => self.email = value,
            FormField::Phone => self.phone = value,
            FormField::Company => self.company = value,
            FormField::FormType => self.form_type = value,
            FormField::ServiceType => self.service_type = value,
            FormField::Budget => self.budget = value,
            FormField::Timeline => self.timeline = value,
            FormField::LaunchDate => self.launch_date = value,
            FormField::ProjectPriority => self.project_priority = value,
            FormField::BusinessModel => self.business_model = value,
            FormField::AppointmentStyle => self.appointment_style = value,
            FormField::RevenueStreamType => self.revenue_stream_type = value,
            FormField::MainGoal => self.main_goal = value,
            FormField::ResourceSlug => self.resource_slug = value,
            FormField::Message => self.message = value,
            FormField::ServiceDescription => self.service_description = value,
            FormField::ProjectIdea => self.project_idea = value,
            FormField::Notes => self.notes = value,
        }
    }

    pub fn set_consent(&mut self, consent: bool) {
        if self.state() != FormState::Submitting {
            self.state = FormState::Editing;
            self.consent = consent;
        }
    }

    /// Attaches the challenge token issued by the Turnstile widget.
    pub fn attach_challenge(&mut self, token: impl Into<String>) {
        let token = token.into();
        if !token.trim().is_empty() {
            self.challenge_token = Some(token);
            if self.state() == FormState::Blocked {
                self.state = FormState::Editing;
            }
        }
    }

    /// Adds one provenance tag to the submission's metadata map.
    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra_tags.insert(key.into(), value.into());
    }

    /// The bot-verifier query: is a challenge token currently available?
    /// Re-checked on every submission attempt; nothing is cached here beyond
    /// what was explicitly attached.
    pub fn has_challenge_token(&self) -> bool {
        self.challenge_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    /// Validates the accumulated fields and freezes them into an immutable
    /// `LeadSubmission` with provenance attached.
    ///
    /// Checks run in order: required-field presence, email format, phone
    /// plausibility (only when a phone was given), then the challenge-token
    /// precondition. Any rejection happens before a single network call and
    /// leaves the form editable again (or blocked, awaiting the challenge).
    pub fn submit(&mut self, provenance: Provenance) -> Result<LeadSubmission, FormError> {
        if self.state() == FormState::Submitting {
            return Err(FormError::AlreadySubmitting);
        }
        self.state = FormState::Submitting;

        let name = self.resolve_name();
        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if self.email.is_none() {
            missing.push("email");
        }
        if !missing.is_empty() {
            self.state = FormState::Editing;
            return Err(FormError::MissingFields(missing));
        }

        let name = name.unwrap_or_default();
        let email = self.email.clone().unwrap_or_default();

        if !is_valid_email(&email) {
            self.state = FormState::Editing;
            return Err(FormError::InvalidEmail(email));
        }

        if let Some(ref phone) = self.phone {
            if !is_plausible_phone(phone) {
                self.state = FormState::Editing;
                return Err(FormError::InvalidPhone(phone.clone()));
            }
        }

        if !self.has_challenge_token() {
            self.state = FormState::Blocked;
            return Err(FormError::ChallengeRequired);
        }

        let mut provenance = provenance;
        provenance.extra.extend(self.extra_tags.clone());

        Ok(LeadSubmission {
            contact: ContactFields {
                name,
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email,
                phone: self.phone.clone(),
                company: self.company.clone(),
            },
            classification: Classification {
                form_type: self
                    .form_type
                    .clone()
                    .unwrap_or_else(|| "general".to_string()),
                service_type: self.service_type.clone(),
                budget: self.budget.clone(),
                timeline: self.timeline.clone(),
                launch_date: self.launch_date.clone(),
                project_priority: self.project_priority.clone(),
                business_model: self.business_model.clone(),
                appointment_style: self.appointment_style.clone(),
                revenue_stream_type: self.revenue_stream_type.clone(),
                main_goal: self.main_goal.clone(),
                resource_slug: self.resource_slug.clone(),
            },
            message: self.resolve_message(),
            notes: self.notes.clone(),
            consent: self.consent,
            provenance,
            tags: LeadTags::default(),
        })
    }

    /// Reports the delivery outcome back to the form so the client flow can
    /// settle. A failed delivery is never terminal.
    pub fn mark_delivered(&mut self, accepted: bool) {
        if self.state() == FormState::Submitting {
            self.state = if accepted {
                FormState::Succeeded
            } else {
                FormState::Failed
            };
        }
    }

    /// Returns a failed or blocked form to editing.
    pub fn edit(&mut self) {
        if self.state() != FormState::Submitting {
            self.state = FormState::Editing;
        }
    }

    /// Replays an incoming request through the collector so every HTTP intake
    /// path enforces the same invariants as the interactive flow.
    pub fn from_request(req: &SubmitLeadRequest) -> Self {
        let mut form = Self::new();
        let pairs: [(FormField, &Option<String>); 21] = [
            (FormField::Name, &req.name),
            (FormField::FirstName, &req.first_name),
            (FormField::LastName, &req.last_name),
            (FormField::Email, &req.email),
            (FormField::Phone, &req.phone),
            (FormField::Company, &req.company),
            (FormField::FormType, &req.form_type),
            (FormField::ServiceType, &req.service_type),
            (FormField::Budget, &req.budget),
            (FormField::Timeline, &req.timeline),
            (FormField::LaunchDate, &req.launch_date),
            (FormField::ProjectPriority, &req.project_priority),
            (FormField::BusinessModel, &req.business_model),
            (FormField::AppointmentStyle, &req.appointment_style),
            (FormField::RevenueStreamType, &req.revenue_stream_type),
            (FormField::MainGoal, &req.main_goal),
            (FormField::ResourceSlug, &req.resource_slug),
            (FormField::Message, &req.message),
            (FormField::ServiceDescription, &req.service_description),
            (FormField::ProjectIdea, &req.project_idea),
            (FormField::Notes, &req.notes),
        ];
        for (field, value) in pairs {
            if let Some(value) = value {
                form.apply(FieldChange {
                    field,
                    value: value.clone(),
                });
            }
        }
        form.set_consent(req.consent.unwrap_or(false));
        if let Some(ref token) = req.turnstile_token {
            form.attach_challenge(token.clone());
        }
        for (key, value) in &req.extra {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form.tag(key.clone(), rendered);
        }
        form
    }

    fn resolve_name(&self) -> Option<String> {
        if let Some(ref name) = self.name {
            return Some(name.clone());
        }
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        normalize(joined)
    }

    fn resolve_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.service_description.clone())
            .or_else(|| self.project_idea.clone())
            .unwrap_or_default()
    }
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Validate an email address.
///
/// Checks basic shape first, then an RFC 5322 simplified pattern.
/// Intentionally permissive beyond that; email is the one contact field the
/// forms insist on being deliverable.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    // RFC 5322 simplified email regex
    // Matches: local@domain.tld
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    if !email_regex.is_match(email) {
        tracing::debug!("Invalid email format: {}", email);
        return false;
    }

    true
}

/// Loose phone plausibility check.
///
/// The forms accept numbers from anywhere, so this only asks for 7-15 digits
/// once formatting characters are stripped, per E.164 length bounds.
pub fn is_plausible_phone(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    let mut chars = trimmed.chars();
    let rest: String = if trimmed.starts_with('+') {
        chars.next();
        chars.collect()
    } else {
        trimmed.to_string()
    };
    if !rest
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'))
    {
        return false;
    }
    let digits = rest.chars().filter(|c| c.is_ascii_digit()).count();
    (7..=15).contains(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn provenance() -> Provenance {
        Provenance::new(None, None, None, None, None, Utc::now())
    }

    #[test]
    fn submit_without_token_blocks() {
        let mut form = LeadForm::new();
        form.apply(FieldChange {
            field: FormField::Name,
            value: "Jane Doe".into(),
        });
        form.apply(FieldChange {
            field: FormField::Email,
            value: "jane@x.com".into(),
        });

        let err = form.submit(provenance()).unwrap_err();
        assert_eq!(err, FormError::ChallengeRequired);
        assert_eq!(form.state(), FormState::Blocked);

        // Attaching the token unblocks the form.
        form.attach_challenge("tok");
        assert_eq!(form.state(), FormState::Editing);
        assert!(form.submit(provenance()).is_ok());
    }

    #[test]
    fn provenance_attached_at_submit_time() {
        let mut form = LeadForm::new();
        form.apply(FieldChange {
            field: FormField::Name,
            value: "Jane".into(),
        });
        form.apply(FieldChange {
            field: FormField::Email,
            value: "jane@x.com".into(),
        });
        form.attach_challenge("tok");
        form.tag("quizScore", "7");

        let submitted_at = Utc::now();
        let submission = form
            .submit(Provenance::new(
                Some("google".into()),
                None,
                None,
                Some("https://echoweb.com/pricing".into()),
                None,
                submitted_at,
            ))
            .unwrap();

        assert_eq!(submission.provenance.utm_source, "google");
        assert_eq!(submission.provenance.utm_medium, "none");
        assert_eq!(submission.provenance.submitted_at, submitted_at);
        assert_eq!(
            submission.provenance.extra.get("quizScore").map(String::as_str),
            Some("7")
        );
    }
}
