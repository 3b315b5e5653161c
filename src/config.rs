use secrecy::Secret;
use std::env;

/// Runtime configuration read from the environment (and `.env` via dotenvy).
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: Secret<String>,
    /// Expected `aud` claim; audience is not checked when unset
    pub jwt_audience: Option<String>,
    pub allowed_origins: Vec<String>,
    pub bind_address: String,
    pub port: u16,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| format!("{key} must be set"));

        let port = match lookup("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a valid port number, got {p:?}"))?,
            None => 8080,
        };
        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(n) => n
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got {n:?}"))?,
            None => 20,
        };

        // Comma-separated, default to localhost
        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: Secret::new(required("JWT_SECRET")?),
            jwt_audience: lookup("JWT_AUDIENCE").filter(|a| !a.is_empty()),
            allowed_origins,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            db_max_connections,
        })
    }
}
