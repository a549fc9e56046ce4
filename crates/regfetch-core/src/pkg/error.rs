//! Package manifest error types.

use std::fmt;

/// Package manifest error codes.
pub mod codes {
    /// The specifier could not be split into a non-empty name and reference.
    pub const PKG_SPEC_INVALID: &str = "PKG_SPEC_INVALID";
    /// The registry request failed: transport error, non-2xx status, or a
    /// body that is not a JSON object.
    pub const PKG_FETCH_FAILED: &str = "PKG_FETCH_FAILED";
}

/// Package manifest error.
#[derive(Debug)]
pub struct PkgError {
    code: &'static str,
    message: String,
    status: Option<u16>,
    url: Option<String>,
}

impl PkgError {
    /// Create a new error with the given code and message.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            url: None,
        }
    }

    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status returned by the registry, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Request URL the failure relates to.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Whether this error was raised while parsing the specifier.
    #[must_use]
    pub fn is_spec_invalid(&self) -> bool {
        self.code == codes::PKG_SPEC_INVALID
    }

    /// Whether this error was raised while talking to the registry.
    #[must_use]
    pub fn is_fetch_failed(&self) -> bool {
        self.code == codes::PKG_FETCH_FAILED
    }

    /// Create a spec invalid error.
    pub fn spec_invalid(msg: impl Into<String>) -> Self {
        Self::new(codes::PKG_SPEC_INVALID, msg)
    }

    /// Create a fetch failed error for `url`.
    pub fn fetch_failed(url: &str, status: Option<u16>, msg: impl Into<String>) -> Self {
        Self {
            code: codes::PKG_FETCH_FAILED,
            message: msg.into(),
            status,
            url: Some(url.to_string()),
        }
    }
}

impl fmt::Display for PkgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        match (self.status, &self.url) {
            (Some(status), Some(url)) => write!(f, " (status {status}, {url})"),
            (None, Some(url)) => write!(f, " ({url})"),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for PkgError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        let err = PkgError::spec_invalid("bad spec");
        assert_eq!(err.code(), codes::PKG_SPEC_INVALID);
        assert!(err.is_spec_invalid());
        assert!(err.to_string().contains(codes::PKG_SPEC_INVALID));
        assert_eq!(err.status(), None);
        assert_eq!(err.url(), None);
    }

    #[test]
    fn test_fetch_failed_carries_status_and_url() {
        let err = PkgError::fetch_failed("https://mock.reg/foo/1.2.3", Some(404), "not found");
        assert!(err.is_fetch_failed());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.url(), Some("https://mock.reg/foo/1.2.3"));
        assert_eq!(
            err.to_string(),
            "PKG_FETCH_FAILED: not found (status 404, https://mock.reg/foo/1.2.3)"
        );
    }

    #[test]
    fn test_fetch_failed_without_status() {
        let err = PkgError::fetch_failed("https://mock.reg/foo/latest", None, "refused");
        assert_eq!(
            err.to_string(),
            "PKG_FETCH_FAILED: refused (https://mock.reg/foo/latest)"
        );
    }

    #[test]
    fn test_error_codes_uppercase() {
        // All codes should be SCREAMING_SNAKE_CASE
        for code in [codes::PKG_SPEC_INVALID, codes::PKG_FETCH_FAILED] {
            assert!(
                code.chars().all(|c| c.is_uppercase() || c == '_'),
                "Error code '{code}' should be SCREAMING_SNAKE_CASE"
            );
        }
    }
}
