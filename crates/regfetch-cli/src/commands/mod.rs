pub mod manifest;
pub mod resolve;
pub mod version;

use miette::{IntoDiagnostic, Result};
use regfetch_core::pkg::PkgError;
use regfetch_core::RegistryConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Registry selection flags shared by `manifest` and `resolve`.
///
/// Precedence: `.npmrc` files < `--config` < `REGFETCH_REGISTRY` < flags.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RegistryArgs {
    /// Default registry URL
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Scope applied to unscoped packages (leading @ optional)
    #[arg(long)]
    pub scope: Option<String>,

    /// Route a scope to a registry, e.g. `@myorg=https://npm.example.com`
    #[arg(long = "scope-registry", value_name = "SCOPE=URL", value_parser = parse_key_value)]
    pub scope_registries: Vec<(String, String)>,

    /// Bearer token for a registry prefix, e.g. `//npm.example.com/=TOKEN`
    #[arg(long = "token", value_name = "PREFIX=TOKEN", value_parser = parse_key_value)]
    pub tokens: Vec<(String, String)>,

    /// Load registry settings from a JSON file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip reading .npmrc files
    #[arg(long)]
    pub no_npmrc: bool,
}

impl RegistryArgs {
    /// Build the effective config for a command run from `cwd`.
    pub fn load(&self, cwd: &Path) -> Result<RegistryConfig> {
        let mut config = if self.no_npmrc {
            RegistryConfig::new()
        } else {
            RegistryConfig::load_npmrc_files(cwd).into_diagnostic()?
        };

        if let Some(path) = &self.config {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                cwd.join(path)
            };
            config.overlay(RegistryConfig::load_json(&path).into_diagnostic()?);
        }

        let mut config = config.apply_env();
        config.overlay(self.to_config());
        Ok(config)
    }

    fn to_config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new();
        config.registry.clone_from(&self.registry);
        config.scope.clone_from(&self.scope);
        for (scope, url) in &self.scope_registries {
            config = config.with_scope_registry(scope, url.clone());
        }
        for (prefix, token) in &self.tokens {
            config = config.with_token(prefix.clone(), token.clone());
        }
        config
    }
}

/// Parse `KEY=VALUE`, splitting on the first `=`.
fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Error payload for JSON output.
#[derive(Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&PkgError> for ErrorInfo {
    fn from(e: &PkgError) -> Self {
        Self {
            code: e.code(),
            message: e.message().to_string(),
            status: e.status(),
            url: e.url().map(str::to_string),
        }
    }
}

/// `{ok: false, error}` for JSON output.
#[derive(Serialize)]
pub struct ErrorResult {
    pub ok: bool,
    pub error: ErrorInfo,
}

/// Print a failure as JSON and exit non-zero.
pub fn exit_with_json_error(e: &PkgError) -> ! {
    let result = ErrorResult {
        ok: false,
        error: ErrorInfo::from(e),
    };
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{json}"),
        Err(_) => println!(r#"{{"ok":false}}"#),
    }
    std::process::exit(1);
}
