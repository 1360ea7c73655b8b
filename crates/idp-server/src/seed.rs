//! Startup seed data.
//!
//! The store starts empty; a JSON document named by `IDP_SEED_FILE` fills it
//! with identity providers and everything that belongs to them:
//!
//! ```json
//! {
//!   "identity_providers": [{
//!     "code": "acme",
//!     "name": "Acme Corp",
//!     "private_key": "keys/acme-key.pem",
//!     "certificate": "keys/acme-cert.pem",
//!     "attributes": [{ "name": "department", "saml_mapping": "dept" }],
//!     "service_providers": [{
//!       "name": "Wiki",
//!       "entity_id": "https://wiki.example.com",
//!       "callback_url": "https://wiki.example.com/saml/acs",
//!       "oauth2": { "client_id": "wiki", "client_secret": "s3cret", "redirect_uri": "https://wiki.example.com/cb" }
//!     }],
//!     "users": [{
//!       "email": "jane@example.com", "first_name": "Jane", "last_name": "Doe",
//!       "password": "hunter2", "attributes": { "department": "R&D" }
//!     }]
//!   }]
//! }
//! ```
//!
//! Key material is either inline PEM or a path relative to the seed file.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{bail, Context};
use idp_auth::PasswordHasherService;
use idp_crypto::signature::{RsaSigner, RsaVerifier};
use idp_model::{CustomAttribute, IdentityProvider, ServiceProvider, Subject};
use idp_storage::IdpStore;
use serde::Deserialize;

/// Root of a seed document.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    /// Tenants to create.
    #[serde(default)]
    pub identity_providers: Vec<SeedIdentityProvider>,
}

/// One IdP and its dependents.
#[derive(Debug, Deserialize)]
pub struct SeedIdentityProvider {
    /// URL slug.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Signing key, inline PEM or path.
    pub private_key: String,
    /// Signing certificate, inline PEM or path.
    pub certificate: String,
    /// Custom attribute definitions.
    #[serde(default)]
    pub attributes: Vec<SeedAttribute>,
    /// Registered relying parties.
    #[serde(default)]
    pub service_providers: Vec<SeedServiceProvider>,
    /// Users able to log in.
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// Custom attribute definition.
#[derive(Debug, Deserialize)]
pub struct SeedAttribute {
    /// Attribute name, also the key users reference it by.
    pub name: String,
    /// Emitted key, when it differs from `name`.
    pub saml_mapping: Option<String>,
    /// Value for users without their own.
    pub default_value: Option<String>,
}

/// Service provider registration.
#[derive(Debug, Deserialize)]
pub struct SeedServiceProvider {
    /// Display name.
    pub name: String,
    /// SAML entity id.
    pub entity_id: String,
    /// ACS URL.
    pub callback_url: String,
    /// Explicit subject-confirmation recipient.
    pub recipient: Option<String>,
    /// Where logout responses and "Visit Service" links go.
    pub service_url: Option<String>,
    /// OAuth2 client registration.
    pub oauth2: Option<SeedOAuth2Client>,
}

/// OAuth2 client registration.
#[derive(Debug, Deserialize)]
pub struct SeedOAuth2Client {
    /// `client_id`.
    pub client_id: String,
    /// `client_secret`.
    pub client_secret: String,
    /// Registered redirect URI.
    pub redirect_uri: String,
}

/// User account.
#[derive(Debug, Deserialize)]
pub struct SeedUser {
    /// Login email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Plain password, hashed at load.
    pub password: Option<String>,
    /// Pre-hashed PHC string.
    pub password_hash: Option<String>,
    /// Values keyed by attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Counts of what a seed created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// IdPs created.
    pub identity_providers: usize,
    /// SPs created.
    pub service_providers: usize,
    /// Users created.
    pub users: usize,
    /// Attribute definitions created.
    pub attributes: usize,
}

impl Seed {
    /// Parses a seed document.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid seed document")
    }

    /// Reads and parses a seed file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading seed file {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Writes every entity into `store`.
    ///
    /// Relative key paths resolve against `base_dir`.
    ///
    /// # Errors
    ///
    /// Fails on unusable key material, users without exactly one of
    /// `password`/`password_hash`, references to undefined attributes and
    /// storage errors such as duplicate codes or emails.
    pub async fn apply<S: IdpStore>(
        self,
        store: &S,
        hasher: &PasswordHasherService,
        issuer_base: &str,
        base_dir: &Path,
    ) -> anyhow::Result<SeedSummary> {
        let mut summary = SeedSummary::default();

        for seed in self.identity_providers {
            let private_key = material(&seed.private_key, base_dir)?;
            let certificate = material(&seed.certificate, base_dir)?;
            RsaSigner::from_pem(&private_key).with_context(|| format!("private key of IdP {}", seed.code))?;
            RsaVerifier::from_certificate_pem(&certificate)
                .with_context(|| format!("certificate of IdP {}", seed.code))?;

            let idp = IdentityProvider::new(&seed.code, &seed.name, private_key, certificate)
                .with_issuer_base(issuer_base);
            store
                .create_identity_provider(&idp)
                .await
                .with_context(|| format!("creating IdP {}", idp.code))?;
            summary.identity_providers += 1;

            let mut attribute_ids = HashMap::new();
            for attr in seed.attributes {
                let mut definition = CustomAttribute::new(idp.id, &attr.name);
                if let Some(mapping) = attr.saml_mapping {
                    definition = definition.with_mapping(mapping);
                }
                if let Some(value) = attr.default_value {
                    definition = definition.with_default(value);
                }
                store.create_attribute(&definition).await?;
                attribute_ids.insert(attr.name, definition.id);
                summary.attributes += 1;
            }

            for sp in seed.service_providers {
                let mut provider = ServiceProvider::new(idp.id, sp.name, sp.entity_id, sp.callback_url);
                if let Some(recipient) = sp.recipient {
                    provider = provider.with_recipient(recipient);
                }
                if let Some(url) = sp.service_url {
                    provider = provider.with_service_url(url);
                }
                if let Some(client) = sp.oauth2 {
                    provider = provider.with_oauth2(client.client_id, client.client_secret, client.redirect_uri);
                }
                store
                    .create_service_provider(&provider)
                    .await
                    .with_context(|| format!("creating SP {} for IdP {}", provider.entity_id, idp.code))?;
                summary.service_providers += 1;
            }

            for user in seed.users {
                let password_hash = match (user.password, user.password_hash) {
                    (Some(password), None) => hasher.hash(&password)?,
                    (None, Some(hash)) => hash,
                    _ => bail!("user {} needs exactly one of password or password_hash", user.email),
                };
                let mut subject =
                    Subject::new(idp.id, &user.email, user.first_name, user.last_name, password_hash);
                for (name, value) in user.attributes {
                    let Some(id) = attribute_ids.get(&name) else {
                        bail!("user {} references undefined attribute {name}", user.email);
                    };
                    subject = subject.with_attribute(*id, value);
                }
                store
                    .create_subject(&subject)
                    .await
                    .with_context(|| format!("creating user {} for IdP {}", subject.email, idp.code))?;
                summary.users += 1;
            }

            tracing::info!(idp = %idp.code, issuer = %idp.issuer, "Seeded identity provider");
        }

        Ok(summary)
    }
}

fn material(value: &str, base_dir: &Path) -> anyhow::Result<String> {
    if value.contains("-----BEGIN") {
        return Ok(value.to_string());
    }
    let path = base_dir.join(value);
    std::fs::read_to_string(&path).with_context(|| format!("reading key material {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use idp_auth::PasswordVerifier;
    use idp_storage::{AttributeStore, IdentityProviderStore, ServiceProviderStore, SubjectStore};
    use idp_storage_memory::MemoryStore;

    const KEY: &str = include_str!("../../idp-protocol-saml/tests/fixtures/idp-key.pem");
    const CERT: &str = include_str!("../../idp-protocol-saml/tests/fixtures/idp-cert.pem");

    fn document(users: &str) -> String {
        serde_json::json!({
            "identity_providers": [{
                "code": "Acme",
                "name": "Acme Corp",
                "private_key": KEY,
                "certificate": CERT,
                "attributes": [{ "name": "department", "saml_mapping": "dept" }],
                "service_providers": [{
                    "name": "Wiki",
                    "entity_id": "urn:wiki",
                    "callback_url": "https://wiki.example.com/acs",
                    "oauth2": { "client_id": "wiki", "client_secret": "s3cret", "redirect_uri": "https://wiki.example.com/cb" }
                }],
                "users": serde_json::from_str::<serde_json::Value>(users).unwrap()
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn seeds_everything_and_hashes_passwords() {
        let seed = Seed::from_json(&document(
            r#"[{ "email": "Jane@Example.com", "first_name": "Jane", "last_name": "Doe",
                  "password": "hunter2", "attributes": { "department": "R&D" } }]"#,
        ))
        .unwrap();
        let store = MemoryStore::new();
        let hasher = PasswordHasherService::default();

        let summary = seed
            .apply(&store, &hasher, "http://localhost:6001", Path::new("."))
            .await
            .unwrap();
        assert_eq!(
            summary,
            SeedSummary { identity_providers: 1, service_providers: 1, users: 1, attributes: 1 }
        );

        let idp = store.get_identity_provider("acme").await.unwrap().unwrap();
        assert_eq!(idp.issuer, "http://localhost:6001/acme");

        let sp = store.get_service_provider_by_client_id(idp.id, "wiki").await.unwrap().unwrap();
        assert_eq!(sp.entity_id, "urn:wiki");

        let user = store.get_subject_by_email(idp.id, "jane@example.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "hunter2");
        hasher.verify("hunter2", &user.password_hash).unwrap();

        let attrs = store.list_attributes(idp.id).await.unwrap();
        assert_eq!(user.attributes.get(&attrs[0].id).map(String::as_str), Some("R&D"));
    }

    #[tokio::test]
    async fn user_needs_exactly_one_password_form() {
        let seed = Seed::from_json(&document(
            r#"[{ "email": "a@b.c", "first_name": "A", "last_name": "B" }]"#,
        ))
        .unwrap();
        let err = seed
            .apply(&MemoryStore::new(), &PasswordHasherService::default(), "https://idp.sso.tools", Path::new("."))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[tokio::test]
    async fn undefined_attribute_is_rejected() {
        let seed = Seed::from_json(&document(
            r#"[{ "email": "a@b.c", "first_name": "A", "last_name": "B",
                  "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
                  "attributes": { "shoe_size": "44" } }]"#,
        ))
        .unwrap();
        let err = seed
            .apply(&MemoryStore::new(), &PasswordHasherService::default(), "https://idp.sso.tools", Path::new("."))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("shoe_size"));
    }

    #[test]
    fn key_paths_resolve_against_base_dir() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../idp-protocol-saml/tests/fixtures");
        assert_eq!(material("idp-cert.pem", &dir).unwrap(), CERT);
        assert_eq!(material(CERT, Path::new("/nonexistent")).unwrap(), CERT);
        assert!(material("missing.pem", &dir).is_err());
    }
}
