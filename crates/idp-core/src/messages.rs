//! User-facing texts shared by the browser flows of both protocols.

/// Credential prompt: unknown email or wrong password.
pub const INCORRECT_CREDENTIALS: &str = "The email address or password is incorrect. Remember that you need to login as a user registered with the IDP, and not your SSO Tools account.";

/// Credential prompt: the correlated request could not be found.
pub const INVALID_LOGIN_REQUEST: &str = "This login request is not valid.";

/// Consent prompt submitted without a session.
pub const LOGIN_REQUIRED: &str = "You need to be logged-in to access this page.";

/// Heading of the HTML error page.
pub const ERROR_PAGE_HEADING: &str = "There was a problem fulfilling your request.";
