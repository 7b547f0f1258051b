use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // App Store Connect
    pub api_token: String,
    pub api_url: String,

    // Requests
    pub localizations_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Bearer token (JWT signed with an App Store Connect API key)
            api_token: std::env::var("APP_STORE_CONNECT_TOKEN")
                .context("APP_STORE_CONNECT_TOKEN not set")?,
            api_url: std::env::var("APP_STORE_CONNECT_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.appstoreconnect.apple.com".to_string()),

            localizations_limit: std::env::var("LOCALIZATIONS_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
        })
    }
}
