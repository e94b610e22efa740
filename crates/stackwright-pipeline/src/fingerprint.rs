//! SHA-256 fingerprints of pipeline definitions.
//!
//! The deployed pipeline stores its fingerprint; a runner comparing it with
//! the fingerprint of the freshly composed definition knows whether the
//! pipeline must update itself before promoting anything.

use serde::Serialize;
use sha2::{Digest, Sha256};
use stackwright_common::error::Result;
use stackwright_common::types::Sha256Hash;

/// Computes the SHA-256 digest of `value`'s canonical JSON form.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<Sha256Hash> {
    let bytes = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&bytes);
    tracing::trace!(bytes = bytes.len(), "fingerprinted definition");
    Sha256Hash::from_hex(format!("{digest:x}"))
}
