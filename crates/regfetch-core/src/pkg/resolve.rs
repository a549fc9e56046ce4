//! Request resolution: spec + config → registry URL and headers.
//!
//! Registry selection, first match wins:
//! 1. the scope embedded in the package name (`@scope/name`)
//! 2. the configured default `scope`
//! 3. the configured `registry`
//! 4. [`DEFAULT_REGISTRY`]
//!
//! Auth is looked up by the resolved registry's `//host/path/` prefix.

use super::spec::PackageSpec;
use crate::config::RegistryConfig;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Default npm registry URL.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Header carrying the bearer token.
pub const AUTHORIZATION: &str = "authorization";

/// Where the registry for a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrySource {
    /// `@scope:registry` for the scope in the package name.
    NameScope,
    /// `@scope:registry` for the configured default scope.
    ConfigScope,
    /// The configured `registry`.
    Registry,
    /// Nothing configured; [`DEFAULT_REGISTRY`].
    Default,
}

impl RegistrySource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameScope => "name-scope",
            Self::ConfigScope => "config-scope",
            Self::Registry => "registry",
            Self::Default => "default",
        }
    }
}

/// A fully-formed registry request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    /// Full manifest URL.
    pub url: String,
    /// Registry base URL the request targets.
    pub registry: String,
    /// Which rule picked the registry.
    pub source: RegistrySource,
    /// Request headers (lowercase names).
    pub headers: BTreeMap<String, String>,
}

impl ResolvedRequest {
    /// Whether an `authorization` header is attached.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }
}

/// Build the manifest request for `spec` under `config`.
///
/// Never fails: missing or empty config values fall through to the next
/// rule, and an unparseable registry URL just gets no auth.
#[must_use]
pub fn resolve_request(spec: &PackageSpec, config: &RegistryConfig) -> ResolvedRequest {
    let (registry, source) = select_registry(spec, config);
    let url = manifest_url(registry, spec);

    let mut headers = BTreeMap::new();
    let auth_key = registry_auth_key(registry);
    if let Some(cred) = auth_key.as_deref().and_then(|key| config.credential(key)) {
        headers.insert(AUTHORIZATION.to_string(), format!("Bearer {}", cred.token));
    }

    debug!(
        name = %spec.name,
        reference = %spec.reference,
        registry = %registry,
        source = source.as_str(),
        auth_key = ?auth_key,
        authenticated = headers.contains_key(AUTHORIZATION),
        "Resolved registry request"
    );

    ResolvedRequest {
        url,
        registry: registry.to_string(),
        source,
        headers,
    }
}

/// Pick the registry base URL for `spec`.
#[must_use]
pub fn select_registry<'a>(
    spec: &PackageSpec,
    config: &'a RegistryConfig,
) -> (&'a str, RegistrySource) {
    if let Some(url) = spec.scope().and_then(|scope| config.scope_registry(scope)) {
        return (url, RegistrySource::NameScope);
    }

    // A name-embedded scope is never replaced by the configured one.
    if !spec.is_scoped() {
        let configured = config
            .scope
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|scope| config.scope_registry(scope));
        if let Some(url) = configured {
            return (url, RegistrySource::ConfigScope);
        }
    }

    if let Some(url) = config.registry() {
        return (url, RegistrySource::Registry);
    }

    (DEFAULT_REGISTRY, RegistrySource::Default)
}

/// `<registry>/<escaped name>/<reference>`.
#[must_use]
pub fn manifest_url(registry: &str, spec: &PackageSpec) -> String {
    format!(
        "{}/{}/{}",
        registry.trim_end_matches('/'),
        spec.escaped_name(),
        spec.reference
    )
}

/// Canonical auth key for a registry URL: `//host[:port]/path/`.
///
/// Scheme and default port are dropped and a trailing slash is enforced.
/// Returns `None` when the URL has no host.
#[must_use]
pub fn registry_auth_key(registry: &str) -> Option<String> {
    let url = Url::parse(registry).ok()?;
    let host = url.host_str()?;

    let mut key = format!("//{host}");
    if let Some(port) = url.port() {
        key.push_str(&format!(":{port}"));
    }
    key.push_str(url.path());
    if !key.ends_with('/') {
        key.push('/');
    }
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK: &str = "https://mock.reg";

    fn resolve(spec: &str, config: &RegistryConfig) -> ResolvedRequest {
        resolve_request(&PackageSpec::parse(spec).unwrap(), config)
    }

    #[test]
    fn test_unscoped_url() {
        let req = resolve("foo@1.2.3", &RegistryConfig::new().with_registry(MOCK));
        assert_eq!(req.url, "https://mock.reg/foo/1.2.3");
        assert_eq!(req.source, RegistrySource::Registry);
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_scoped_url_encodes_slash() {
        let req = resolve("@usr/foo@latest", &RegistryConfig::new().with_registry(MOCK));
        assert_eq!(req.url, "https://mock.reg/@usr%2ffoo/latest");
    }

    #[test]
    fn test_trailing_slash_registry() {
        let req = resolve(
            "foo@1.2.3",
            &RegistryConfig::new().with_registry("https://mock.reg/"),
        );
        assert_eq!(req.url, "https://mock.reg/foo/1.2.3");
    }

    #[test]
    fn test_name_scope_beats_config_scope() {
        let config = RegistryConfig::new()
            .with_scope_registry("@myscope", MOCK)
            .with_scope("@otherscope");
        let req = resolve("@myscope/foo@1.2.3", &config);
        assert_eq!(req.registry, MOCK);
        assert_eq!(req.source, RegistrySource::NameScope);
        assert_eq!(req.url, "https://mock.reg/@myscope%2ffoo/1.2.3");
    }

    #[test]
    fn test_name_scope_without_entry_ignores_config_scope() {
        let config = RegistryConfig::new()
            .with_scope_registry("@otherscope", "https://other.reg")
            .with_scope("@otherscope")
            .with_registry(MOCK);
        let req = resolve("@myscope/foo@1.2.3", &config);
        assert_eq!(req.registry, MOCK);
        assert_eq!(req.source, RegistrySource::Registry);
    }

    #[test]
    fn test_config_scope_beats_registry() {
        let config = RegistryConfig::new()
            .with_scope_registry("@myscope", MOCK)
            .with_scope("@myscope")
            .with_registry("nope");
        let req = resolve("foo@1.2.3", &config);
        assert_eq!(req.url, "https://mock.reg/foo/1.2.3");
        assert_eq!(req.source, RegistrySource::ConfigScope);
    }

    #[test]
    fn test_config_scope_at_is_optional() {
        let with_at = RegistryConfig::new()
            .with_scope_registry("@myscope", MOCK)
            .with_scope("@myscope");
        let without_at = RegistryConfig::new()
            .with_scope_registry("@myscope", MOCK)
            .with_scope("myscope");
        assert_eq!(
            resolve("foo@latest", &with_at),
            resolve("foo@latest", &without_at)
        );
        assert_eq!(resolve("foo@latest", &without_at).registry, MOCK);
    }

    #[test]
    fn test_default_registry() {
        let req = resolve("foo@1.2.3", &RegistryConfig::new());
        assert_eq!(req.url, "https://registry.npmjs.org/foo/1.2.3");
        assert_eq!(req.source, RegistrySource::Default);

        let req = resolve("foo@1.2.3", &RegistryConfig::new().with_registry(""));
        assert_eq!(req.registry, DEFAULT_REGISTRY);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let config = RegistryConfig::new().with_registry(MOCK);
        assert_eq!(resolve("Foo@1.2.3", &config).url, "https://mock.reg/Foo/1.2.3");
        assert_eq!(resolve("foo@1.2.3", &config).url, "https://mock.reg/foo/1.2.3");
    }

    #[test]
    fn test_auth_header_on_exact_match() {
        let config = RegistryConfig::new()
            .with_registry(MOCK)
            .with_token("//mock.reg/", "deadbeef");
        let req = resolve("foo@1.2.3", &config);
        assert!(req.is_authenticated());
        assert_eq!(req.headers[AUTHORIZATION], "Bearer deadbeef");
    }

    #[test]
    fn test_no_auth_header_without_match() {
        let config = RegistryConfig::new()
            .with_registry(MOCK)
            .with_token("//other.reg/", "deadbeef")
            .with_token("//mock.reg", "missing-slash");
        let req = resolve("foo@1.2.3", &config);
        assert!(!req.is_authenticated());
    }

    #[test]
    fn test_scoped_auth_follows_resolved_registry() {
        let config = RegistryConfig::new()
            .with_scope("myscope")
            .with_scope_registry("@myscope", MOCK)
            .with_token("//mock.reg/", "deadbeef");
        let req = resolve("foo@1.2.3", &config);
        assert_eq!(req.url, "https://mock.reg/foo/1.2.3");
        assert_eq!(req.headers[AUTHORIZATION], "Bearer deadbeef");
    }

    #[test]
    fn test_unparseable_registry_gets_no_auth() {
        let config = RegistryConfig::new()
            .with_registry("nope")
            .with_token("//nope/", "deadbeef");
        let req = resolve("foo@1.2.3", &config);
        assert_eq!(req.url, "nope/foo/1.2.3");
        assert!(!req.is_authenticated());
    }

    #[test]
    fn test_registry_auth_key() {
        assert_eq!(
            registry_auth_key("https://mock.reg").as_deref(),
            Some("//mock.reg/")
        );
        assert_eq!(
            registry_auth_key("https://mock.reg:443/").as_deref(),
            Some("//mock.reg/")
        );
        assert_eq!(
            registry_auth_key("http://127.0.0.1:4873").as_deref(),
            Some("//127.0.0.1:4873/")
        );
        assert_eq!(
            registry_auth_key("https://pkgs.example.com/npm/private").as_deref(),
            Some("//pkgs.example.com/npm/private/")
        );
        assert_eq!(registry_auth_key("nope"), None);
    }
}
