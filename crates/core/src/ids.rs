// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated identifier types for the demo orchestrator.
//!
//! Each carries a fixed shape that is part of the wire contract: the GUI
//! secret is exactly 20 hex characters (it doubles as a cookie value and a
//! proxy map key), and a database name is always `db_<16 hex>`.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque 20-hex-character session token, issued as the `X-AUTH` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuiSecret(String);

impl GuiSecret {
    /// Generate a fresh random secret.
    pub fn generate() -> Self {
        Self(random_hex(20))
    }

    /// Validate and wrap an externally supplied cookie value.
    ///
    /// Returns `None` if `raw` is not exactly 20 lowercase hex characters.
    pub fn parse(raw: &str) -> Option<Self> {
        is_hex_of_len(raw, 20).then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for GuiSecret {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A `db_<16 hex>` database name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DbName(String);

impl DbName {
    const PREFIX: &'static str = "db_";

    /// Generate a fresh random database name.
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, random_hex(16)))
    }

    /// Parse a previously generated name (used when round-tripping through storage).
    pub fn parse(raw: &str) -> Option<Self> {
        let suffix = raw.strip_prefix(Self::PREFIX)?;
        is_hex_of_len(suffix, 16).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn random_hex(len_chars: usize) -> String {
    let mut bytes = vec![0u8; len_chars.div_ceil(2)];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(len_chars);
    hex
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
