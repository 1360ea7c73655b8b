//! Scope-gated claim assembly.
//!
//! | Scope | ID token | userinfo |
//! |---|---|---|
//! | `openid` | `sub` (and enables the token) | - |
//! | `email` | `email` | `email` |
//! | `profile` | `given_name`, `family_name`, custom | `firstName`, `lastName`, custom |
//!
//! Userinfo always carries `id`.

use idp_auth::Claims;
use idp_model::{resolve_attributes, CustomAttribute, Subject};
use serde_json::{Map, Value};

use crate::scope;

fn has(scopes: &[String], wanted: &str) -> bool {
    scopes.iter().any(|s| s == wanted)
}

fn insert_custom(target: &mut Map<String, Value>, definitions: &[CustomAttribute], subject: &Subject) {
    for (key, value) in resolve_attributes(definitions, subject) {
        target.insert(key, Value::String(value));
    }
}

/// Claims for the ID token, or `None` when `openid` was not granted.
#[must_use]
pub fn id_token_claims(subject: &Subject, scopes: &[String], definitions: &[CustomAttribute]) -> Option<Claims> {
    if !has(scopes, scope::OPENID) {
        return None;
    }

    let mut claims = Claims::new();
    claims.insert("sub".into(), Value::String(subject.id.to_string()));
    if has(scopes, scope::EMAIL) {
        claims.insert("email".into(), Value::String(subject.email.clone()));
    }
    if has(scopes, scope::PROFILE) {
        claims.insert("given_name".into(), Value::String(subject.first_name.clone()));
        claims.insert("family_name".into(), Value::String(subject.last_name.clone()));
        insert_custom(&mut claims, definitions, subject);
    }
    Some(claims)
}

/// Profile returned by the userinfo endpoint.
#[must_use]
pub fn userinfo(subject: &Subject, scopes: &[String], definitions: &[CustomAttribute]) -> Map<String, Value> {
    let mut profile = Map::new();
    profile.insert("id".into(), Value::String(subject.id.to_string()));
    if has(scopes, scope::EMAIL) {
        profile.insert("email".into(), Value::String(subject.email.clone()));
    }
    if has(scopes, scope::PROFILE) {
        profile.insert("firstName".into(), Value::String(subject.first_name.clone()));
        profile.insert("lastName".into(), Value::String(subject.last_name.clone()));
        insert_custom(&mut profile, definitions, subject);
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scopes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn fixture() -> (Subject, Vec<CustomAttribute>) {
        let idp = Uuid::new_v4();
        let dept = CustomAttribute::new(idp, "department").with_mapping("dept");
        let role = CustomAttribute::new(idp, "role").with_default("member");
        let subject = Subject::new(idp, "jane@example.com", "Jane", "Doe", "hash").with_attribute(dept.id, "R&D");
        (subject, vec![dept, role])
    }

    #[test]
    fn openid_only_gives_sub() {
        let (subject, defs) = fixture();
        let claims = id_token_claims(&subject, &scopes(&["openid"]), &defs).unwrap();
        let keys: Vec<&str> = claims.keys().map(String::as_str).collect();
        assert_eq!(keys, ["sub"]);
        assert_eq!(claims["sub"], subject.id.to_string());
    }

    #[test]
    fn full_scope_gives_profile_and_custom() {
        let (subject, defs) = fixture();
        let claims = id_token_claims(&subject, &scopes(&["openid", "email", "profile"]), &defs).unwrap();
        assert_eq!(claims["email"], "jane@example.com");
        assert_eq!(claims["given_name"], "Jane");
        assert_eq!(claims["family_name"], "Doe");
        assert_eq!(claims["dept"], "R&D");
        assert_eq!(claims["role"], "member");
        assert_eq!(claims.len(), 6);
    }

    #[test]
    fn no_openid_no_token() {
        let (subject, defs) = fixture();
        assert!(id_token_claims(&subject, &scopes(&["email", "profile"]), &defs).is_none());
    }

    #[test]
    fn userinfo_gating() {
        let (subject, defs) = fixture();
        let minimal = userinfo(&subject, &scopes(&["openid"]), &defs);
        assert_eq!(minimal.len(), 1);
        assert_eq!(minimal["id"], subject.id.to_string());

        let full = userinfo(&subject, &scopes(&["email", "profile"]), &defs);
        assert_eq!(full["firstName"], "Jane");
        assert_eq!(full["lastName"], "Doe");
        assert_eq!(full["email"], "jane@example.com");
        assert_eq!(full["dept"], "R&D");
    }
}
