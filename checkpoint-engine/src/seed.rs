//! Seeded determinism helpers.
//!
//! `seeded_random` is frozen: every subject's dossier gaps derive from it, so
//! changing the hash reassigns redactions across all authored content.

use std::hash::Hasher;

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use twox_hash::XxHash64;

use crate::numbers::unit_ratio_from_u64;

fn stable_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

/// Map a string seed to a stable value in `[0, 1)`.
#[must_use]
pub fn seeded_random(seed: &str) -> f64 {
    unit_ratio_from_u64(stable_hash(seed.as_bytes()))
}

/// Derive a 64-bit stream seed from a key and a domain tag.
///
/// # Panics
///
/// Never in practice: HMAC-SHA256 accepts keys of any length.
#[must_use]
pub fn derive_stream_seed(key: &[u8], domain_tag: &[u8]) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Build a ChaCha20 stream bound to a subject and domain.
#[must_use]
pub fn subject_stream(subject_id: &str, domain_tag: &[u8]) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_stream_seed(subject_id.as_bytes(), domain_tag))
}
