//! Contact record and remote ingestion mapping.
//!
//! # Responsibility
//! - Define the `Contact` value persisted in the snapshot blob.
//! - Map raw remote records into contacts exactly once, at ingestion.
//!
//! # Invariants
//! - `id` is generated at ingestion, never derived from remote data and
//!   never reused.
//! - `name` composition is one-way; the structured remote name is dropped.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque contact identifier.
///
/// Ingestion generates UUID v4 text, but persisted snapshots may carry any
/// non-empty string and are accepted verbatim.
pub type ContactId = String;

/// Chance that a freshly ingested contact starts as a favorite.
pub const SEED_FAVORITE_PROBABILITY: f64 = 0.1;

/// Canonical contact record.
///
/// Only `id` and `name` are required when reading a stored snapshot; other
/// fields of older or hand-edited records read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    /// Display name, `"<first> <last>"`.
    pub name: String,
    /// Remote large-format picture URI.
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub cell: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub favorite: bool,
}

/// Raw record returned by the remote contact source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawContactRecord {
    pub name: RawName,
    pub picture: RawPicture,
    pub phone: String,
    pub cell: String,
    pub email: String,
}

/// Structured remote name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawName {
    #[serde(default)]
    pub title: Option<String>,
    pub first: String,
    pub last: String,
}

/// Picture URIs by size.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawPicture {
    pub large: String,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl Contact {
    /// Maps one raw remote record into a new contact.
    ///
    /// Uses the thread-local RNG for favorite seeding, so two runs over the
    /// same input generally differ in ids and favorites.
    pub fn from_raw(raw: RawContactRecord) -> Self {
        Self::from_raw_with_rng(raw, &mut rand::rng())
    }

    /// Same as [`Contact::from_raw`], with a caller-provided RNG.
    pub fn from_raw_with_rng<G: Rng>(raw: RawContactRecord, rng: &mut G) -> Self {
        let RawContactRecord {
            name,
            picture,
            phone,
            cell,
            email,
        } = raw;

        Self {
            id: Uuid::new_v4().to_string(),
            name: format!("{} {}", name.first, name.last),
            avatar: picture.large,
            phone,
            cell,
            email,
            favorite: rng.random_bool(SEED_FAVORITE_PROBABILITY),
        }
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&mut self) -> bool {
        self.favorite = !self.favorite;
        self.favorite
    }
}
