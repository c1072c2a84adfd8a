//! Contact snapshot gateway.
//!
//! # Responsibility
//! - Store the full contact list as one JSON blob under a fixed key.
//! - Report write failures as booleans to callers that tolerate them.
//!
//! # Invariants
//! - `read_all` never fails; absent or unreadable blobs read as empty.
//! - A record missing `id` or `name` is skipped; the rest of the list is
//!   still adopted.
//! - `write_all` replaces the whole stored list.

use crate::kv::{KeyValueStore, KvError};
use crate::model::contact::Contact;
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key owned exclusively by the contact gateway.
pub const CONTACTS_KEY: &str = "@contacts";

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug)]
pub enum GatewayError {
    Kv(KvError),
    Serialize(serde_json::Error),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kv(err) => write!(f, "failed to store contacts: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize contacts: {err}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kv(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<KvError> for GatewayError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Durable copy of the contact snapshot.
pub struct ContactGateway<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> ContactGateway<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Borrows the underlying key-value backend.
    pub fn backend(&self) -> &K {
        &self.kv
    }

    /// Returns the persisted contacts, or an empty list when nothing usable
    /// is stored.
    pub fn read_all(&self) -> Vec<Contact> {
        let raw = match self.kv.get(CONTACTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("event=contacts_read module=gateway status=ok count=0 reason=absent");
                return Vec::new();
            }
            Err(err) => {
                warn!("event=contacts_read module=gateway status=error error={err}");
                return Vec::new();
            }
        };

        let records = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "event=contacts_read module=gateway status=error error_code=blob_unreadable error={err}"
                );
                return Vec::new();
            }
        };

        let total = records.len();
        let contacts = records
            .into_iter()
            .filter_map(|record| serde_json::from_value::<Contact>(record).ok())
            .collect::<Vec<_>>();
        if contacts.len() < total {
            warn!(
                "event=contacts_read module=gateway status=partial count={} skipped={}",
                contacts.len(),
                total - contacts.len()
            );
        } else {
            debug!(
                "event=contacts_read module=gateway status=ok count={}",
                contacts.len()
            );
        }
        contacts
    }

    /// Serializes and stores the whole list, keeping the failure cause.
    pub fn try_write_all(&self, contacts: &[Contact]) -> GatewayResult<()> {
        let blob = serde_json::to_string(contacts)?;
        self.kv.set(CONTACTS_KEY, &blob)?;
        debug!(
            "event=contacts_write module=gateway status=ok count={}",
            contacts.len()
        );
        Ok(())
    }

    /// Serializes and stores the whole list; `false` on failure.
    pub fn write_all(&self, contacts: &[Contact]) -> bool {
        match self.try_write_all(contacts) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=contacts_write module=gateway status=error count={} error={err}",
                    contacts.len()
                );
                false
            }
        }
    }

    /// Removes the stored snapshot; `false` on failure.
    pub fn clear(&self) -> bool {
        match self.kv.remove(CONTACTS_KEY) {
            Ok(()) => {
                debug!("event=contacts_clear module=gateway status=ok");
                true
            }
            Err(err) => {
                error!("event=contacts_clear module=gateway status=error error={err}");
                false
            }
        }
    }

    /// Replaces one stored record by id, straight against storage.
    ///
    /// Returns `false` when the id is not stored or the write fails.
    pub fn update_one(&self, contact: &Contact) -> bool {
        let mut contacts = self.read_all();
        let Some(slot) = contacts.iter_mut().find(|stored| stored.id == contact.id) else {
            debug!(
                "event=contacts_update_one module=gateway status=skip reason=not_found id={}",
                contact.id
            );
            return false;
        };
        *slot = contact.clone();
        self.write_all(&contacts)
    }
}
