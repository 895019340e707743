use questline_core::streak::DayBoundary;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Day boundary policy for streaks and the one-completion-per-day guard.
    /// Offset in minutes relative to UTC (default: `0` = UTC midnight).
    pub day_boundary: DayBoundary,
    /// Process-wide secret the credential cipher key is derived from.
    pub credential_secret: String,
    /// Upper bound on an AI judgement round trip in seconds (default: `30`).
    /// On timeout the judgement degrades to zero confidence.
    pub ai_verify_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Required | Default                 |
    /// |-------------------------------|----------|-------------------------|
    /// | `HOST`                        | no       | `0.0.0.0`               |
    /// | `PORT`                        | no       | `3000`                  |
    /// | `CORS_ORIGINS`                | no       | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | no       | `30`                    |
    /// | `DAY_BOUNDARY_OFFSET_MINUTES` | no       | `0`                     |
    /// | `CREDENTIAL_KEY`              | **yes**  | --                      |
    /// | `AI_VERIFY_TIMEOUT_SECS`      | no       | `30`                    |
    ///
    /// # Panics
    ///
    /// Panics on missing required variables or unparseable values, which is
    /// the desired behaviour -- misconfiguration should fail fast at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let day_offset_minutes: i32 = std::env::var("DAY_BOUNDARY_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("DAY_BOUNDARY_OFFSET_MINUTES must be a valid i32");

        let credential_secret = std::env::var("CREDENTIAL_KEY")
            .expect("CREDENTIAL_KEY must be set in the environment");
        assert!(
            !credential_secret.is_empty(),
            "CREDENTIAL_KEY must not be empty"
        );

        let ai_verify_timeout_secs: u64 = std::env::var("AI_VERIFY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("AI_VERIFY_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            day_boundary: DayBoundary::new(day_offset_minutes),
            credential_secret,
            ai_verify_timeout_secs,
            jwt,
        }
    }
}
