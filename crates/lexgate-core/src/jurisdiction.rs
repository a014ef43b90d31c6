//! Jurisdiction codes.
//!
//! Codes follow an ISO 3166 style: a two-letter country (`ES`) or a
//! country-prefixed sub-national region (`ES-AN`). The sentinel `GLOBAL`
//! stands for the catch-all scope. Codes are only minted by the registry at
//! load time; everything downstream borrows or clones them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The sentinel code for the global catch-all scope.
pub const GLOBAL: &str = "GLOBAL";

/// Identifier for a national or sub-national jurisdiction, or `GLOBAL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JurisdictionCode(String);

/// Which tier of the jurisdiction hierarchy a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JurisdictionKind {
    SubNational,
    National,
    Global,
}

impl JurisdictionCode {
    /// Wrap a raw code, normalising to upper case.
    ///
    /// Whether the code is *recognized* is the registry's concern; this only
    /// fixes the spelling.
    pub(crate) fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn global() -> Self {
        Self(GLOBAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tier implied by the code's shape.
    pub fn kind(&self) -> JurisdictionKind {
        if self.0 == GLOBAL {
            JurisdictionKind::Global
        } else if self.0.contains('-') {
            JurisdictionKind::SubNational
        } else {
            JurisdictionKind::National
        }
    }

    /// Country part of the code: `ES` for both `ES` and `ES-AN`; `None` for `GLOBAL`.
    pub fn country(&self) -> Option<&str> {
        match self.kind() {
            JurisdictionKind::Global => None,
            JurisdictionKind::National => Some(&self.0),
            JurisdictionKind::SubNational => self.0.split('-').next(),
        }
    }
}

impl fmt::Display for JurisdictionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a raw string is shaped like a code (`ES`, `ES-AN`, `ES-M`).
///
/// Used to tell an explicit code hint apart from free text.
pub fn looks_like_code(raw: &str) -> bool {
    let raw = raw.trim();
    let mut parts = raw.split('-');
    let country = parts.next().unwrap_or_default();
    let region = parts.next();
    if parts.next().is_some() {
        return false;
    }
    let country_ok = country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic());
    let region_ok = region.is_none_or(|r| {
        (1..=3).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
    });
    country_ok && region_ok
}
