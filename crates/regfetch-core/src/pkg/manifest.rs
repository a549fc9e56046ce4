//! Manifest fetching.
//!
//! Ties the pieces together: parse the specifier, resolve the request,
//! issue it through the [`Transport`] and hand back the JSON object.

use super::error::PkgError;
use super::resolve::{resolve_request, ResolvedRequest};
use super::spec::PackageSpec;
use super::transport::{ReqwestTransport, Transport};
use crate::config::RegistryConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// A package manifest as served by the registry.
///
/// Kept verbatim; nothing is validated beyond it being a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(Map<String, Value>);

impl Manifest {
    /// The `name` field, if present and a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.get("name")?.as_str()
    }

    /// The `version` field, if present and a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.0.get("version")?.as_str()
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Take the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Manifest> for Value {
    fn from(manifest: Manifest) -> Self {
        Value::Object(manifest.0)
    }
}

/// Fetches manifests through an injected transport.
///
/// Holds no per-request state, so one fetcher can serve any number of
/// concurrent `fetch` calls.
#[derive(Debug, Clone)]
pub struct ManifestFetcher<T> {
    transport: T,
}

impl<T: Transport> ManifestFetcher<T> {
    /// Create a fetcher over `transport`.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the manifest for `specifier` (e.g. `@scope/name@1.2.3`).
    ///
    /// # Errors
    /// `PKG_SPEC_INVALID` before any request is made if the specifier has no
    /// name; `PKG_FETCH_FAILED` for transport errors, non-2xx responses and
    /// bodies that are not a JSON object.
    pub async fn fetch(
        &self,
        specifier: &str,
        config: &RegistryConfig,
    ) -> Result<Manifest, PkgError> {
        let spec = PackageSpec::parse(specifier)?;
        self.fetch_spec(&spec, config).await
    }

    /// Fetch the manifest for an already parsed spec.
    ///
    /// # Errors
    /// See [`ManifestFetcher::fetch`].
    pub async fn fetch_spec(
        &self,
        spec: &PackageSpec,
        config: &RegistryConfig,
    ) -> Result<Manifest, PkgError> {
        let request = resolve_request(spec, config);
        self.send(&request).await
    }

    /// Issue a resolved request and validate the body.
    ///
    /// # Errors
    /// See [`ManifestFetcher::fetch`].
    pub async fn send(&self, request: &ResolvedRequest) -> Result<Manifest, PkgError> {
        let url = request.url.as_str();

        let response = self
            .transport
            .get(url, &request.headers)
            .await
            .map_err(|e| PkgError::fetch_failed(url, None, e.to_string()))?;

        debug!(url, status = response.status, size = response.body.len(), "Registry responded");

        if !response.is_success() {
            return Err(PkgError::fetch_failed(
                url,
                Some(response.status),
                format!("Registry returned status {}", response.status),
            ));
        }

        match serde_json::from_slice::<Value>(&response.body) {
            Ok(Value::Object(map)) => Ok(Manifest(map)),
            Ok(other) => Err(PkgError::fetch_failed(
                url,
                Some(response.status),
                format!("Expected a JSON object, got {}", json_type(&other)),
            )),
            Err(e) => Err(PkgError::fetch_failed(
                url,
                Some(response.status),
                format!("Invalid JSON: {e}"),
            )),
        }
    }
}

/// Fetch a manifest over a default [`ReqwestTransport`].
///
/// # Errors
/// See [`ManifestFetcher::fetch`].
pub async fn fetch_manifest(
    specifier: &str,
    config: &RegistryConfig,
) -> Result<Manifest, PkgError> {
    let spec = PackageSpec::parse(specifier)?;
    let request = resolve_request(&spec, config);
    let transport = ReqwestTransport::new()
        .map_err(|e| PkgError::fetch_failed(&request.url, None, e.to_string()))?;
    ManifestFetcher::new(transport).send(&request).await
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
