//! Supported scopes.

/// Issues an ID token.
pub const OPENID: &str = "openid";
/// Releases the email address.
pub const EMAIL: &str = "email";
/// Releases names and custom attributes.
pub const PROFILE: &str = "profile";

/// Consent text for a scope, `None` for scopes this IdP does not know.
#[must_use]
pub fn describe(scope: &str) -> Option<&'static str> {
    match scope {
        OPENID => Some("SSO Tools will issue a token containing your basic account details to the service provider"),
        EMAIL => Some("Allow the service provider to read the email address associated with your account"),
        PROFILE => Some("Allow the service provider to read the name and other attributes associated with your account"),
        _ => None,
    }
}

/// Consent texts for the known scopes in `scopes`, in request order.
#[must_use]
pub fn describe_all(scopes: &[String]) -> Vec<&'static str> {
    scopes.iter().filter_map(|s| describe(s)).collect()
}

/// Splits a `scope` parameter on spaces.
#[must_use]
pub fn parse(scope: Option<&str>) -> Vec<String> {
    scope
        .map(|s| s.split(' ').filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_scopes_have_no_description() {
        let scopes = parse(Some("openid  calendar profile"));
        assert_eq!(scopes, ["openid", "calendar", "profile"]);
        let described = describe_all(&scopes);
        assert_eq!(described.len(), 2);
        assert!(described[1].contains("name and other attributes"));
    }

    #[test]
    fn missing_scope_is_empty() {
        assert!(parse(None).is_empty());
    }
}
