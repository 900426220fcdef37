// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Auth failures are a narrower kind of API failure

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Onboarding error: {0}")]
    Onboarding(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Auth(_) => 2,
            Error::Network(_) => 3,
            Error::Api { .. } => 4,
            Error::Parse(_) => 5,
            Error::Filesystem(_) => 6,
            Error::Config(_) => 7,
            Error::Onboarding(_) => 8,
        }
    }

    /// True for credential problems ("fix your login").
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// True for any non-success outcome reported by the remote API,
    /// including authentication failures.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::Api { .. })
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Auth("test".into()).exit_code(), 2);
        assert_eq!(
            Error::Api {
                endpoint: "/dairy/".into(),
                status: 404,
                message: "not found".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(Error::Config("test".into()).exit_code(), 7);
        assert_eq!(Error::Onboarding("test".into()).exit_code(), 8);
    }

    #[test]
    fn test_auth_is_narrower_than_api() {
        let auth = Error::Auth("bad password".into());
        assert!(auth.is_auth_error());
        assert!(auth.is_api_error());

        let api = Error::Api {
            endpoint: "/profile/".into(),
            status: 500,
            message: String::new(),
        };
        assert!(!api.is_auth_error());
        assert!(api.is_api_error());
        assert_eq!(api.status(), Some(500));

        let cfg = Error::Config("missing".into());
        assert!(!cfg.is_api_error());
        assert_eq!(cfg.status(), None);
    }

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            endpoint: "/dairy/".into(),
            status: 503,
            message: "down".into(),
        };
        assert_eq!(err.to_string(), "API error 503 on /dairy/: down");
    }
}
