//! Package manifest resolution.
//!
//! Provides utilities for:
//! - Parsing package specifications (name@version, name@tag)
//! - Picking the registry and auth for a spec
//! - Fetching the manifest through a pluggable transport

pub mod error;
pub mod manifest;
pub mod resolve;
pub mod spec;
pub mod transport;

pub use error::{codes as pkg_codes, PkgError};
pub use manifest::{fetch_manifest, Manifest, ManifestFetcher};
pub use resolve::{
    manifest_url, registry_auth_key, resolve_request, select_registry, RegistrySource,
    ResolvedRequest, AUTHORIZATION, DEFAULT_REGISTRY,
};
pub use spec::{escape_name, PackageSpec, ReferenceKind, DEFAULT_TAG};
pub use transport::{
    ReqwestTransport, RetryTransport, Transport, TransportError, TransportResponse,
};
