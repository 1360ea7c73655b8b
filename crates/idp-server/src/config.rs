//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::path::PathBuf;

use idp_model::identity_provider::DEFAULT_ISSUER_BASE;
use idp_protocol_saml::signature::{SignatureAlgorithm, SignatureConfig};
use idp_protocol_saml::SamlSettings;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Base of every IdP issuer URI (`{base}/{code}`).
    pub issuer_base: String,

    /// HS256 secret for ID tokens.
    pub jwt_secret: String,

    /// JSON seed loaded into the store at startup.
    pub seed_file: Option<PathBuf>,

    /// CORS allowed origins (comma-separated, `*` for any).
    pub cors_origins: Vec<String>,

    /// `SessionNotOnOrAfter` offset in minutes.
    pub session_expiration_minutes: i64,

    /// Assertion validity window in seconds.
    pub assertion_lifetime_seconds: i64,

    /// Assertion signature method.
    pub signature_algorithm: SignatureAlgorithm,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Fails when `JWT_SECRET` is unset or `IDP_SIGNATURE_ALGORITHM` names
    /// an unsupported method.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = std::env::var("IDP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("IDP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(6001);

        let issuer_base = std::env::var("IDP_ISSUER_BASE").unwrap_or_else(|_| DEFAULT_ISSUER_BASE.to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        let seed_file = std::env::var("IDP_SEED_FILE").ok().map(PathBuf::from);

        let cors_origins = std::env::var("IDP_CORS_ORIGINS")
            .map(|s| s.split(',').map(str::trim).map(String::from).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let session_expiration_minutes = std::env::var("IDP_SESSION_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000);

        let assertion_lifetime_seconds = std::env::var("IDP_ASSERTION_LIFETIME_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);

        let signature_algorithm = match std::env::var("IDP_SIGNATURE_ALGORITHM") {
            Ok(name) => SignatureAlgorithm::from_name(&name)
                .ok_or_else(|| anyhow::anyhow!("unsupported IDP_SIGNATURE_ALGORITHM: {name}"))?,
            Err(_) => SignatureAlgorithm::default(),
        };

        Ok(Self {
            host,
            port,
            issuer_base,
            jwt_secret,
            seed_file,
            cors_origins,
            session_expiration_minutes,
            assertion_lifetime_seconds,
            signature_algorithm,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            ..Self::default()
        }
    }

    /// Assertion settings derived from this configuration.
    #[must_use]
    pub fn saml_settings(&self) -> SamlSettings {
        let signature = match self.signature_algorithm {
            SignatureAlgorithm::RsaSha256 => SignatureConfig::default(),
            SignatureAlgorithm::RsaSha1 => SignatureConfig::sha1(),
        };
        SamlSettings {
            session_expiration_minutes: self.session_expiration_minutes,
            assertion_lifetime_seconds: self.assertion_lifetime_seconds,
            signature,
        }
    }

    /// Whether any origin may call the API.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 6001,
            issuer_base: DEFAULT_ISSUER_BASE.to_string(),
            jwt_secret: String::new(),
            seed_file: None,
            cors_origins: vec!["*".to_string()],
            session_expiration_minutes: 10_000,
            assertion_lifetime_seconds: 600,
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("issuer_base", &self.issuer_base)
            .field("seed_file", &self.seed_file)
            .field("cors_origins", &self.cors_origins)
            .field("session_expiration_minutes", &self.session_expiration_minutes)
            .field("assertion_lifetime_seconds", &self.assertion_lifetime_seconds)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish_non_exhaustive()
    }
}
