//! Custom attribute definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::Subject;

/// A custom attribute an IdP releases about its subjects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomAttribute {
    /// Unique identifier; subjects key their values by it.
    pub id: Uuid,
    /// Owning IdP.
    pub idp_id: Uuid,
    /// Attribute name.
    pub name: String,
    /// Name to release the attribute under, if different from `name`.
    #[serde(default)]
    pub saml_mapping: Option<String>,
    /// Value used when the subject has none.
    #[serde(default)]
    pub default_value: Option<String>,
}

impl CustomAttribute {
    /// Creates a definition with no mapping and no default.
    #[must_use]
    pub fn new(idp_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            idp_id,
            name: name.into(),
            saml_mapping: None,
            default_value: None,
        }
    }

    /// Sets the release name.
    #[must_use]
    pub fn with_mapping(mut self, mapping: impl Into<String>) -> Self {
        self.saml_mapping = Some(mapping.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Name the attribute is released under.
    #[must_use]
    pub fn key(&self) -> &str {
        self.saml_mapping
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.name)
    }

    /// Value released for `subject`, if any.
    ///
    /// The subject's own value wins unless it is empty; otherwise the default
    /// applies. Empty results are not released.
    #[must_use]
    pub fn value_for<'a>(&'a self, subject: &'a Subject) -> Option<&'a str> {
        subject
            .attributes
            .get(&self.id)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .or(self.default_value.as_deref())
            .filter(|v| !v.is_empty())
    }
}

/// Resolves every definition against `subject`, in definition order.
///
/// Definitions without a usable key or value are skipped.
#[must_use]
pub fn resolve_attributes(definitions: &[CustomAttribute], subject: &Subject) -> Vec<(String, String)> {
    definitions
        .iter()
        .filter(|d| !d.key().is_empty())
        .filter_map(|d| d.value_for(subject).map(|v| (d.key().to_string(), v.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_overrides_name() {
        let idp = Uuid::new_v4();
        let attr = CustomAttribute::new(idp, "department");
        assert_eq!(attr.key(), "department");
        assert_eq!(attr.with_mapping("urn:oid:2.5.4.11").key(), "urn:oid:2.5.4.11");
    }

    #[test]
    fn subject_value_then_default_then_nothing() {
        let idp = Uuid::new_v4();
        let with_default = CustomAttribute::new(idp, "role").with_default("member");
        let without_default = CustomAttribute::new(idp, "team");
        let explicit = CustomAttribute::new(idp, "dept").with_default("none");

        let subject = Subject::new(idp, "a@b.c", "A", "B", "h").with_attribute(explicit.id, "R&D");

        let resolved = resolve_attributes(&[with_default, without_default, explicit], &subject);
        assert_eq!(
            resolved,
            vec![
                ("role".to_string(), "member".to_string()),
                ("dept".to_string(), "R&D".to_string()),
            ]
        );
    }

    #[test]
    fn empty_subject_value_uses_default() {
        let idp = Uuid::new_v4();
        let attr = CustomAttribute::new(idp, "role").with_default("member");
        let subject = Subject::new(idp, "a@b.c", "A", "B", "h").with_attribute(attr.id, "");
        assert_eq!(attr.value_for(&subject), Some("member"));
    }
}
