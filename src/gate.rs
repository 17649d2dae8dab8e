/// Gated-resource access control.
///
/// This module is the single owner of the gate state: the cookie name, the
/// token format and TTL, and the validity rules. A token only proves "has
/// unlocked before"; it carries no identity and is never persisted
/// server-side; expiry is derived from the issue timestamp embedded in the
/// token itself.
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

/// Browser cookie carrying the access token between visits.
pub const RESOURCE_TOKEN_COOKIE: &str = "resource_token";

/// Days a token stays valid after issuance.
pub const RESOURCE_TOKEN_TTL_DAYS: i64 = 7;

/// A locally generated access token for a previously-unlocked resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceToken {
    issued_at: DateTime<Utc>,
    nonce: String,
}

impl ResourceToken {
    /// Issues a fresh token stamped with the given time.
    pub fn issue_at(now: DateTime<Utc>) -> Self {
        let nonce: String = Uuid::new_v4().simple().to_string()[..9].to_string();
        Self {
            issued_at: now,
            nonce,
        }
    }

    /// Encodes as `token_<unix-millis>_<nonce>`, the format the site has
    /// always written into the cookie and the `?token=` query parameter.
    pub fn encode(&self) -> String {
        format!("token_{}_{}", self.issued_at.timestamp_millis(), self.nonce)
    }

    /// Parses an encoded token. Returns `None` for anything malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, '_');
        if parts.next() != Some("token") {
            return None;
        }
        let millis: i64 = parts.next()?.parse().ok()?;
        let nonce = parts.next()?;
        if nonce.is_empty() {
            return None;
        }
        let issued_at = Utc.timestamp_millis_opt(millis).single()?;
        Some(Self {
            issued_at,
            nonce: nonce.to_string(),
        })
    }

    /// A token is valid from its issue instant until the TTL elapses.
    /// Future-dated tokens are invalid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.issued_at);
        elapsed >= Duration::zero() && elapsed < Duration::days(RESOURCE_TOKEN_TTL_DAYS)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::days(RESOURCE_TOKEN_TTL_DAYS)
    }
}

/// True when `raw` parses as a token that is still inside its window.
pub fn grants_access(raw: &str, now: DateTime<Utc>) -> bool {
    ResourceToken::parse(raw)
        .map(|t| t.is_valid_at(now))
        .unwrap_or(false)
}

/// Extracts the access token from a `Cookie` request header, if present.
pub fn token_from_cookie_header(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(RESOURCE_TOKEN_COOKIE).and_then(|rest| rest.strip_prefix('=')))
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

/// Builds the `Set-Cookie` value for a freshly issued token.
pub fn set_cookie_value(token: &ResourceToken) -> String {
    format!(
        "{}={}; Expires={}; Path=/; SameSite=Lax",
        RESOURCE_TOKEN_COOKIE,
        token.encode(),
        token.expires_at().format("%a, %d %b %Y %H:%M:%S GMT"),
    )
}

/// A downloadable resource offered behind the lead-capture gate.
#[derive(Debug, Clone)]
pub struct Resource {
    pub slug: String,
    pub title: String,
    pub description: String,
}

/// Looks up the catalog entry for a slug; unknown slugs fall back to a
/// generic entry rather than a 404, matching how the site links resources.
pub fn resource_for(slug: &str) -> Resource {
    let (title, description) = match slug {
        "web-design-starter-pack" => (
            "Web Design Starter Pack (Checklist)",
            "Your complete guide to planning and launching a high-converting website.",
        ),
        "website-roi-calculator" => (
            "Website ROI Calculator",
            "Calculate the potential return on investment for your website project.",
        ),
        "template-checklists" => (
            "Template Checklists",
            "Pre-built checklists for common web projects and SEO audits.",
        ),
        "seo-outreach-template" => (
            "SEO Outreach Template",
            "Email templates for successful link building and partnership outreach.",
        ),
        _ => ("Free Resource", "Download your free resource."),
    };

    Resource {
        slug: slug.to_string(),
        title: title.to_string(),
        description: description.to_string(),
    }
}
