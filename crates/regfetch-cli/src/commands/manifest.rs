//! `regfetch manifest` command implementation.

use super::exit_with_json_error;
use miette::{IntoDiagnostic, Result};
use regfetch_core::pkg::{
    Manifest, ManifestFetcher, PkgError, ReqwestTransport, RetryTransport, Transport,
};
use regfetch_core::RegistryConfig;
use serde::Serialize;
use tracing::debug;

/// Manifest result for JSON output.
#[derive(Serialize)]
struct ManifestResult {
    ok: bool,
    manifest: Manifest,
}

/// Run the manifest command.
pub fn run(spec: &str, config: &RegistryConfig, retries: u32, json: bool) -> Result<()> {
    let transport = ReqwestTransport::new().into_diagnostic()?;

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let result = if retries > 0 {
        debug!(retries, "Retrying transport enabled");
        runtime.block_on(fetch(RetryTransport::new(transport, retries), spec, config))
    } else {
        runtime.block_on(fetch(transport, spec, config))
    };

    match result {
        Ok(manifest) if json => {
            let result = ManifestResult { ok: true, manifest };
            println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
            Ok(())
        }
        Ok(manifest) => {
            println!("{}", serde_json::to_string_pretty(&manifest).into_diagnostic()?);
            Ok(())
        }
        Err(e) if json => exit_with_json_error(&e),
        Err(e) => Err(miette::miette!("{e}")),
    }
}

async fn fetch<T: Transport>(
    transport: T,
    spec: &str,
    config: &RegistryConfig,
) -> Result<Manifest, PkgError> {
    ManifestFetcher::new(transport).fetch(spec, config).await
}
