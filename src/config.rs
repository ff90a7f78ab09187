use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

/// Fallback signing secret for local development. Startup logs a warning
/// when the server runs with this value.
pub const DEV_JWT_SECRET: &str = "rollcall-dev-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub listen_addr: String,
    /// SQLite database URL, e.g. `sqlite:rollcall.db`.
    pub database_url: String,
    /// Secret used to sign and verify access tokens.
    pub jwt_secret: String,
    /// Token lifetime in hours; `0` issues tokens without an expiry.
    pub token_ttl_hours: u64,
    pub loglevel: String,
    /// Directory served for non-API routes (the bundled frontend).
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            database_url: "sqlite:rollcall.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            loglevel: "info".to_string(),
            static_dir: "public".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `ROLLCALL_`-prefixed environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("ROLLCALL_"))
            .extract()
    }
}
