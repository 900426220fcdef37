// ABOUTME: Login credentials and bearer-token state for the API client
// ABOUTME: Token is Absent until a login succeeds, cleared again on 401

use std::fmt;

/// Username/password pair posted to `/token/`.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bearer token held by one client instance. There is no known expiry;
/// a token is good until the server rejects it.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    Absent,
    Valid(String),
}

impl Credential {
    pub fn token(&self) -> Option<&str> {
        match self {
            Credential::Absent => None,
            Credential::Valid(token) => Some(token),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Credential::Valid(_))
    }

    /// Drop the token, but only if it is still the one that was rejected.
    /// A token installed by a newer login is left alone.
    pub fn invalidate(&mut self, rejected: &str) -> bool {
        if self.token() == Some(rejected) {
            *self = Credential::Absent;
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Absent => f.write_str("Absent"),
            Credential::Valid(_) => f.write_str("Valid(<redacted>)"),
        }
    }
}
