//! # Deterministic Seeding
//!
//! Every random stream in the generator is derived from a textual key
//! (asset id, scope tag, time bucket) hashed with SHA-256. Each stream gets
//! its own `StdRng` instance; no generator state is shared between assets,
//! requests or time buckets.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::{rngs::StdRng, SeedableRng};
use sha2::{Digest, Sha256};

/// Hash an arbitrary list of key parts into a 64-bit seed.
///
/// Parts are joined with `|` before hashing, so `["a", "bc"]` and
/// `["ab", "c"]` produce different seeds.
pub fn seed_from_parts(parts: &[&str]) -> u64 {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Seed used for the static characteristics of an asset.
pub fn asset_seed(asset_id: &str) -> u64 {
    seed_from_parts(&[asset_id])
}

/// Seed for a stream scoped to an asset, a named layer and an instant.
///
/// `index` distinguishes buckets that share a timestamp representation,
/// e.g. the chunk number of a medium-frequency chunk.
pub fn scoped_seed(asset_id: &str, scope: &str, at: DateTime<Utc>, index: i64) -> u64 {
    let at = at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let index = index.to_string();
    seed_from_parts(&[asset_id, scope, &at, &index])
}

/// Fresh RNG for a scoped stream.
pub fn scoped_rng(asset_id: &str, scope: &str, at: DateTime<Utc>, index: i64) -> StdRng {
    StdRng::seed_from_u64(scoped_seed(asset_id, scope, at, index))
}
