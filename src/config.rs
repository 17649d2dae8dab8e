use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub emailjs_service_id: Option<String>,
    pub emailjs_template_id: Option<String>,
    pub emailjs_public_key: Option<String>,
    pub emailjs_base_url: String,
    pub turnstile_site_key: Option<String>,
    pub turnstile_secret_key: Option<String>,
    pub turnstile_base_url: String,
    pub fallback_contact_email: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            emailjs_service_id: std::env::var("EMAILJS_SERVICE_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            emailjs_template_id: std::env::var("EMAILJS_TEMPLATE_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            emailjs_public_key: std::env::var("EMAILJS_PUBLIC_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            emailjs_base_url: std::env::var("EMAILJS_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("EMAILJS_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?
                .unwrap_or_else(|| "https://api.emailjs.com".to_string()),
            turnstile_site_key: std::env::var("TURNSTILE_SITE_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            turnstile_secret_key: std::env::var("TURNSTILE_SECRET_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            turnstile_base_url: std::env::var("TURNSTILE_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("TURNSTILE_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?
                .unwrap_or_else(|| "https://challenges.cloudflare.com".to_string()),
            fallback_contact_email: std::env::var("FALLBACK_CONTACT_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "hello@echoweb.com".to_string()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!("Turnstile base URL: {}", config.turnstile_base_url);
        tracing::debug!("EmailJS base URL: {}", config.emailjs_base_url);

        if !config.email_channel_configured() {
            tracing::warn!(
                "EmailJS not fully configured; email channel degraded, fallback contact: {}",
                config.fallback_contact_email
            );
        }
        if config.turnstile_secret_key.is_none() {
            tracing::warn!("TURNSTILE_SECRET_KEY not set; verification requests will be rejected");
        }

        Ok(config)
    }

    /// All three EmailJS credentials are present.
    pub fn email_channel_configured(&self) -> bool {
        self.emailjs_service_id.is_some()
            && self.emailjs_template_id.is_some()
            && self.emailjs_public_key.is_some()
    }
}
