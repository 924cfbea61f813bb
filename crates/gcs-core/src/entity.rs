//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is a 128-bit UUID. Its canonical text form is the
//! lowercase hyphenated UUID (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`), which
//! is what hosts store in their own object model and hand back later.
//!
//! Identities are produced by an [`EntityIdGenerator`] backed by a PCG
//! generator, so a world built with a fixed seed hands out the same sequence
//! of identities on every run.

use std::fmt;
use std::str::FromStr;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EcsError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A unique entity identifier. Equal iff the underlying 128 bits are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Raw `u128` representation.
    #[inline]
    pub fn to_raw(self) -> u128 {
        self.0.as_u128()
    }

    /// Reconstruct from a raw `u128`.
    #[inline]
    pub fn from_raw(raw: u128) -> Self {
        Self(Uuid::from_u128(raw))
    }

    /// Canonical text encoding.
    pub fn to_text(self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Parse the canonical text encoding.
    ///
    /// The simple (no hyphens), braced and URN UUID forms are accepted as
    /// well; anything else fails with [`EcsError::InvalidFormat`].
    pub fn from_text(text: &str) -> Result<Self, EcsError> {
        Uuid::parse_str(text.trim())
            .map(Self)
            .map_err(|e| EcsError::InvalidFormat {
                input: text.to_owned(),
                details: e.to_string(),
            })
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0.hyphenated())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for EntityId {
    type Err = EcsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_text(s)
    }
}

// ---------------------------------------------------------------------------
// EntityIdGenerator
// ---------------------------------------------------------------------------

/// Produces fresh random (version 4) [`EntityId`]s.
#[derive(Debug, Clone)]
pub struct EntityIdGenerator {
    rng: Pcg64Mcg,
}

impl EntityIdGenerator {
    /// A generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg64Mcg::from_entropy(),
        }
    }

    /// A deterministic generator: the same seed yields the same sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Allocate a fresh [`EntityId`].
    pub fn generate(&mut self) -> EntityId {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        EntityId(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl Default for EntityIdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
