//! Semantic version parsing and precedence.
//!
//! Changelog headings are identified by a [`Version`]. Parsing accepts the
//! `MAJOR.MINOR.PATCH[-PRE][+BUILD]` form with an optional leading `v`, and
//! ordering follows semantic-version precedence so that "descending order"
//! of a changelog means what release tooling expects it to mean.
//!
//! # Example
//!
//! ```rust
//! use relnotes_core::Version;
//!
//! let stable: Version = "0.7.0".parse().unwrap();
//! let beta: Version = "v0.7.0-beta.2".parse().unwrap();
//! assert!(beta < stable);
//! assert_eq!(beta.to_string(), "0.7.0-beta.2");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

// ============================================================================
// Prerelease
// ============================================================================

/// A single dot-separated pre-release identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Prerelease {
    /// Purely numeric identifier, compared by value.
    Numeric(u64),
    /// Alphanumeric identifier, compared lexically.
    Alpha(String),
}

impl Ord for Prerelease {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.cmp(b),
            (Self::Numeric(_), Self::Alpha(_)) => Ordering::Less,
            (Self::Alpha(_), Self::Numeric(_)) => Ordering::Greater,
            (Self::Alpha(a), Self::Alpha(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Prerelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Prerelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Alpha(s) => f.write_str(s),
        }
    }
}

// ============================================================================
// Version
// ============================================================================

/// A semantic version as it appears in a changelog heading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
    /// Pre-release identifiers (empty for a normal release)
    pub pre: Vec<Prerelease>,
    /// Build metadata, without the leading `+`
    pub build: Option<String>,
}

impl Version {
    /// Create a plain `MAJOR.MINOR.PATCH` version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Vec::new(),
            build: None,
        }
    }

    /// Returns `true` if the version carries pre-release identifiers.
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// The next major version (`1.4.2` → `2.0.0`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the major component would overflow.
    pub fn bump_major(&self) -> Result<Self> {
        let major = self.major.checked_add(1).ok_or_else(|| self.overflow("major"))?;
        Ok(Self::new(major, 0, 0))
    }

    /// The next minor version (`1.4.2` → `1.5.0`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the minor component would overflow.
    pub fn bump_minor(&self) -> Result<Self> {
        let minor = self.minor.checked_add(1).ok_or_else(|| self.overflow("minor"))?;
        Ok(Self::new(self.major, minor, 0))
    }

    /// The next patch version (`1.4.2` → `1.4.3`).
    ///
    /// A pre-release of `X.Y.Z` bumps to `X.Y.Z` itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the patch component would overflow.
    pub fn bump_patch(&self) -> Result<Self> {
        if self.is_prerelease() {
            return Ok(Self::new(self.major, self.minor, self.patch));
        }
        let patch = self.patch.checked_add(1).ok_or_else(|| self.overflow("patch"))?;
        Ok(Self::new(self.major, self.minor, patch))
    }

    fn overflow(&self, component: &str) -> Error {
        Error::invalid_version(self.to_string(), format!("{component} overflows"))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            let pre: Vec<String> = self.pre.iter().map(ToString::to_string).collect();
            write!(f, "-{}", pre.join("."))?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let s = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => {
                validate_identifiers(input, build, "build metadata")?;
                (rest, Some(build.to_string()))
            }
            None => (s, None),
        };

        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, parse_prerelease(input, pre)?),
            None => (rest, Vec::new()),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(Error::invalid_version(
                input,
                "expected MAJOR.MINOR.PATCH",
            ));
        }

        Ok(Self {
            major: parse_numeric(input, parts[0], "major")?,
            minor: parse_numeric(input, parts[1], "minor")?,
            patch: parse_numeric(input, parts[2], "patch")?,
            pre,
            build,
        })
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn parse_numeric(input: &str, part: &str, name: &str) -> Result<u64> {
    if part.is_empty() {
        return Err(Error::invalid_version(input, format!("{name} is empty")));
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_version(
            input,
            format!("{name} is not a number"),
        ));
    }
    if part.len() > 1 && part.starts_with('0') {
        return Err(Error::invalid_version(
            input,
            format!("{name} has a leading zero"),
        ));
    }
    part.parse::<u64>()
        .map_err(|e| Error::invalid_version(input, format!("{name}: {e}")))
}

fn parse_prerelease(input: &str, pre: &str) -> Result<Vec<Prerelease>> {
    validate_identifiers(input, pre, "pre-release")?;
    pre.split('.')
        .map(|ident| {
            if ident.bytes().all(|b| b.is_ascii_digit()) {
                parse_numeric(input, ident, "pre-release identifier").map(Prerelease::Numeric)
            } else {
                Ok(Prerelease::Alpha(ident.to_string()))
            }
        })
        .collect()
}

fn validate_identifiers(input: &str, idents: &str, what: &str) -> Result<()> {
    for ident in idents.split('.') {
        if ident.is_empty() {
            return Err(Error::invalid_version(
                input,
                format!("{what} has an empty identifier"),
            ));
        }
        if !ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(Error::invalid_version(
                input,
                format!("{what} identifier '{ident}' has invalid characters"),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
