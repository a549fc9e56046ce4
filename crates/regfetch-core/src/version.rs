use std::fmt::Write;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent with registry requests.
pub const USER_AGENT: &str = concat!("regfetch/", env!("CARGO_PKG_VERSION"));

/// Returns a formatted version string including build metadata if available.
#[must_use]
pub fn version_string() -> String {
    let mut s = format!("regfetch {VERSION}");

    if let Some(hash) = option_env!("REGFETCH_BUILD_GIT_HASH") {
        let _ = write!(s, " ({hash})");
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_version_string_contains_version() {
        let vs = version_string();
        assert!(vs.contains(VERSION));
        assert!(vs.starts_with("regfetch "));
    }

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("regfetch/"));
        assert!(USER_AGENT.ends_with(VERSION));
    }
}
