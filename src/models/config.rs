use serde::Deserialize;

/// Top-level application configuration, loaded from `config.yaml` plus
/// `LOCALSERVE_*` environment overrides.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Path or URL of the SQLite database.
    pub database_url: String,
    /// Interface to bind the HTTP server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Secret key for session and flash-message cookies (at least 64 bytes).
    pub secret_key: String,
    /// Image CDN settings; uploads are rejected when absent.
    #[serde(default)]
    pub media: Option<MediaSettings>,
    /// SMTP settings; the email notifier logs instead of sending when absent.
    #[serde(default)]
    pub smtp: Option<SmtpSettings>,
}

/// Cloudinary-style image CDN settings.
#[derive(Clone, Debug, Deserialize)]
pub struct MediaSettings {
    pub cloud_name: String,
    pub upload_preset: String,
    /// Override for the API base, mainly for tests.
    #[serde(default = "default_media_api_base")]
    pub api_base: String,
}

/// SMTP relay settings for transactional email.
#[derive(Clone, Debug, Deserialize)]
pub struct SmtpSettings {
    pub relay: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_media_api_base() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}
