//! `regfetch resolve` command implementation.
//!
//! Shows the request `regfetch manifest` would send. Tokens are never
//! printed; only whether one is attached and under which prefix.

use super::exit_with_json_error;
use miette::{IntoDiagnostic, Result};
use regfetch_core::pkg::{registry_auth_key, resolve_request, PackageSpec, ResolvedRequest};
use regfetch_core::RegistryConfig;
use serde::Serialize;

/// Resolve result for JSON output.
#[derive(Serialize)]
struct ResolveResult {
    ok: bool,
    name: String,
    reference: String,
    url: String,
    registry: String,
    source: &'static str,
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_key: Option<String>,
}

impl ResolveResult {
    fn new(spec: &PackageSpec, request: ResolvedRequest) -> Self {
        let authenticated = request.is_authenticated();
        Self {
            ok: true,
            name: spec.name.clone(),
            reference: spec.reference.clone(),
            auth_key: registry_auth_key(&request.registry),
            url: request.url,
            registry: request.registry,
            source: request.source.as_str(),
            authenticated,
        }
    }
}

/// Run the resolve command.
pub fn run(spec: &str, config: &RegistryConfig, json: bool) -> Result<()> {
    let spec = match PackageSpec::parse(spec) {
        Ok(spec) => spec,
        Err(e) if json => exit_with_json_error(&e),
        Err(e) => return Err(miette::miette!("{e}")),
    };

    let result = ResolveResult::new(&spec, resolve_request(&spec, config));

    if json {
        println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
    } else {
        println!("url:       {}", result.url);
        println!("registry:  {} ({})", result.registry, result.source);
        match (&result.auth_key, result.authenticated) {
            (Some(key), true) => println!("auth:      bearer token for {key}"),
            (Some(key), false) => println!("auth:      none (no token for {key})"),
            (None, _) => println!("auth:      none"),
        }
    }

    Ok(())
}
