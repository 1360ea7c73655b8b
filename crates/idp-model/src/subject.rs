//! Subjects (end users) of an identity provider.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user registered with one IdP.
///
/// A subject may hold many concurrent browser sessions. Sessions are only
/// ever added one at a time or cleared all at once; both operations are
/// atomic at the storage layer.
#[derive(Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning IdP.
    pub idp_id: Uuid,
    /// Email address, lower-case, unique within the IdP.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Password hash in PHC string format.
    pub password_hash: String,
    /// Active session identifiers.
    #[serde(default)]
    pub session_ids: BTreeSet<String>,
    /// Custom attribute values keyed by attribute definition id.
    #[serde(default)]
    pub attributes: HashMap<Uuid, String>,
}

impl Subject {
    /// Creates a subject with no sessions and no custom attributes.
    #[must_use]
    pub fn new(
        idp_id: Uuid,
        email: &str,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            idp_id,
            email: email.to_lowercase(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            password_hash: password_hash.into(),
            session_ids: BTreeSet::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets a custom attribute value.
    #[must_use]
    pub fn with_attribute(mut self, attribute_id: Uuid, value: impl Into<String>) -> Self {
        self.attributes.insert(attribute_id, value.into());
        self
    }

    /// Whether `email` identifies this subject (case-insensitive).
    #[must_use]
    pub fn email_matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }

    /// `"First Last"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl std::fmt::Debug for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("id", &self.id)
            .field("idp_id", &self.idp_id)
            .field("email", &self.email)
            .field("sessions", &self.session_ids.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let subject = Subject::new(Uuid::new_v4(), "Jane@Example.COM", "Jane", "Doe", "hash");
        assert_eq!(subject.email, "jane@example.com");
        assert!(subject.email_matches("JANE@example.com"));
        assert!(!subject.email_matches("john@example.com"));
    }

    #[test]
    fn debug_hides_password_hash() {
        let subject = Subject::new(Uuid::new_v4(), "a@b.c", "A", "B", "$argon2id$secret");
        assert!(!format!("{subject:?}").contains("argon2id"));
    }
}
