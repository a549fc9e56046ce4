//! Package spec parsing.
//!
//! Parses package specifications like:
//! - `foo@1.2.3`
//! - `foo@latest`
//! - `@usr/foo@1.2.3`
//! - `foo` (reference defaults to the `latest` tag)

use super::error::PkgError;

/// Dist-tag used when a specifier carries no reference.
pub const DEFAULT_TAG: &str = "latest";

/// A parsed package specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Full package name (e.g., "@scope/name" or "name"), verbatim.
    pub name: String,
    /// Version or dist-tag.
    pub reference: String,
}

/// What a spec reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// An exact semver version, e.g. `1.2.3`.
    Version,
    /// Anything else, resolved server-side (e.g. `latest`, `next`).
    Tag,
}

impl PackageSpec {
    /// Parse a package specification string.
    ///
    /// The name/reference separator is the last `@` that is not the first
    /// character, so `@scope/name` stays intact.
    ///
    /// # Errors
    /// Returns an error if the name portion is empty or a scoped name is
    /// missing its scope or package part.
    pub fn parse(input: &str) -> Result<Self, PkgError> {
        let input = input.trim();

        let (name, reference) = match input.rfind('@') {
            Some(at_pos) if at_pos > 0 => (&input[..at_pos], &input[at_pos + 1..]),
            _ => (input, ""),
        };

        if name.is_empty() {
            return Err(PkgError::spec_invalid(format!(
                "Invalid package spec: empty name in '{input}'"
            )));
        }

        if name.starts_with('@') {
            Self::validate_scoped(name, input)?;
        }

        let reference = if reference.is_empty() {
            DEFAULT_TAG
        } else {
            reference
        };

        Ok(Self {
            name: name.to_string(),
            reference: reference.to_string(),
        })
    }

    fn validate_scoped(name: &str, input: &str) -> Result<(), PkgError> {
        let Some((scope, pkg_name)) = name[1..].split_once('/') else {
            return Err(PkgError::spec_invalid(format!(
                "Invalid scoped package: missing '/' in '{input}'"
            )));
        };

        if scope.is_empty() {
            return Err(PkgError::spec_invalid(format!(
                "Invalid scoped package: empty scope in '{input}'"
            )));
        }

        if pkg_name.is_empty() {
            return Err(PkgError::spec_invalid(format!(
                "Invalid scoped package: empty name in '{input}'"
            )));
        }

        Ok(())
    }

    /// Scope without the @ prefix, if scoped.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.name
            .strip_prefix('@')
            .and_then(|rest| rest.split_once('/'))
            .map(|(scope, _)| scope)
    }

    /// Check if this is a scoped package.
    #[must_use]
    pub fn is_scoped(&self) -> bool {
        self.scope().is_some()
    }

    /// Classify the reference as an exact version or a dist-tag.
    #[must_use]
    pub fn reference_kind(&self) -> ReferenceKind {
        if semver::Version::parse(&self.reference).is_ok() {
            ReferenceKind::Version
        } else {
            ReferenceKind::Tag
        }
    }

    /// URL-encode the package name as a single path segment.
    ///
    /// The scope separator becomes `%2f`, a leading `@` is kept.
    #[must_use]
    pub fn escaped_name(&self) -> String {
        escape_name(&self.name)
    }
}

/// Percent-encode a package name so it fits in one URL path segment.
#[must_use]
pub fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    for (i, byte) in name.bytes().enumerate() {
        match byte {
            b'/' => out.push_str("%2f"),
            b'@' if i == 0 => out.push('@'),
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'~'
            | b'!'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
