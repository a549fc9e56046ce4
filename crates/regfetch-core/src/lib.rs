#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod error;
pub mod pkg;
pub mod version;

pub use config::{Credential, RegistryConfig, REGISTRY_ENV};
pub use error::Error;
pub use pkg::{fetch_manifest, Manifest, ManifestFetcher, PackageSpec, PkgError};
pub use version::VERSION;
