//! Registry configuration.
//!
//! [`RegistryConfig`] is the typed form of the npm configuration keys the
//! resolver consults:
//! - `registry=URL`
//! - `scope=@name`
//! - `@scope:registry=URL`
//! - `//host/path/:_authToken=TOKEN`
//!
//! It can be built in code, deserialized from JSON, or loaded from `.npmrc`
//! files with `${ENV_VAR}` expansion in values.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable to override the default registry URL.
pub const REGISTRY_ENV: &str = "REGFETCH_REGISTRY";

/// Name of the per-directory npm config file.
pub const NPMRC_FILE: &str = ".npmrc";

/// Credential attached to a registry host prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token.
    pub token: String,
}

/// Registry selection and authentication settings for one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Default registry base URL. Empty means unset.
    pub registry: Option<String>,

    /// Scope applied to unscoped specs, with or without the leading `@`.
    pub scope: Option<String>,

    /// `@scope` → registry base URL.
    pub scope_registries: BTreeMap<String, String>,

    /// `//host/path/` → credential.
    pub auth: BTreeMap<String, Credential>,
}

impl RegistryConfig {
    /// Create an empty config (resolves against the default registry).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default registry.
    #[must_use]
    pub fn with_registry(mut self, url: impl Into<String>) -> Self {
        self.registry = Some(url.into());
        self
    }

    /// Set the default scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Route `scope` to `url`. The leading `@` is optional.
    #[must_use]
    pub fn with_scope_registry(mut self, scope: &str, url: impl Into<String>) -> Self {
        self.scope_registries.insert(scope_key(scope), url.into());
        self
    }

    /// Attach a bearer token to the `//host/` prefix `key`.
    #[must_use]
    pub fn with_token(mut self, key: impl Into<String>, token: impl Into<String>) -> Self {
        self.auth.insert(
            key.into(),
            Credential {
                token: token.into(),
            },
        );
        self
    }

    /// The configured default registry, ignoring empty values.
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref().filter(|r| !r.is_empty())
    }

    /// Registry configured for `scope` (with or without `@`).
    #[must_use]
    pub fn scope_registry(&self, scope: &str) -> Option<&str> {
        self.scope_registries
            .get(&scope_key(scope))
            .map(String::as_str)
            .filter(|r| !r.is_empty())
    }

    /// Credential stored under the exact `//host/` prefix.
    #[must_use]
    pub fn credential(&self, key: &str) -> Option<&Credential> {
        self.auth.get(key)
    }

    /// Parse the registry-related keys of a single `.npmrc` file.
    ///
    /// Ignores comments (`#`, `;`), blank lines and unrelated keys.
    #[must_use]
    pub fn parse_npmrc(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = expand_env_vars(value.trim());

            if key == "registry" {
                config.registry = Some(value);
            } else if key == "scope" {
                config.scope = Some(value);
            } else if key.starts_with('@') {
                if let Some((scope, "registry")) = key.split_once(':') {
                    config.scope_registries.insert(scope.to_string(), value);
                }
            } else if key.starts_with("//") {
                if let Some(prefix) = key.strip_suffix(":_authToken") {
                    if !value.is_empty() {
                        config.auth.insert(auth_key(prefix), Credential { token: value });
                    }
                }
            }
        }

        config
    }

    /// Load and merge `.npmrc` files from `project_dir` up to the root,
    /// then `$HOME/.npmrc`.
    ///
    /// Nearer files win per key.
    ///
    /// # Errors
    /// Returns an error if an existing `.npmrc` cannot be read.
    pub fn load_npmrc_files(project_dir: &Path) -> Result<Self, Error> {
        let mut merged = Self::default();

        for dir in project_dir.ancestors() {
            merged.merge_npmrc(&dir.join(NPMRC_FILE))?;
        }

        if let Some(home) = dirs_next::home_dir() {
            merged.merge_npmrc(&home.join(NPMRC_FILE))?;
        }

        Ok(merged)
    }

    /// Load a config serialized as JSON (the shape of this struct).
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_json(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override the default registry from [`REGISTRY_ENV`] when set.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(REGISTRY_ENV) {
            if !url.is_empty() {
                self.registry = Some(url);
            }
        }
        self
    }

    /// Overlay `other` on top of `self`; values in `other` win.
    pub fn overlay(&mut self, other: Self) {
        if other.registry.is_some() {
            self.registry = other.registry;
        }
        if other.scope.is_some() {
            self.scope = other.scope;
        }
        self.scope_registries.extend(other.scope_registries);
        self.auth.extend(other.auth);
    }

    fn merge_npmrc(&mut self, path: &Path) -> Result<(), Error> {
        if !path.is_file() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = Self::parse_npmrc(&content);
        tracing::trace!(path = %path.display(), "Loaded npmrc");

        // First wins: keys already set by a nearer file are kept.
        if self.registry.is_none() {
            self.registry = parsed.registry;
        }
        if self.scope.is_none() {
            self.scope = parsed.scope;
        }
        for (scope, url) in parsed.scope_registries {
            self.scope_registries.entry(scope).or_insert(url);
        }
        for (key, cred) in parsed.auth {
            self.auth.entry(key).or_insert(cred);
        }

        Ok(())
    }
}

/// Normalize a scope name to its `@scope` map key.
#[must_use]
pub fn scope_key(scope: &str) -> String {
    if scope.starts_with('@') {
        scope.to_string()
    } else {
        format!("@{scope}")
    }
}

/// Normalize an npmrc auth prefix (`//host/path`) to `//host/path/`.
fn auth_key(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
            // Missing variables expand to nothing, as npm does.
            if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            }
        } else {
            result.push(ch);
        }
    }

    result
}
