//! Persistence gateways over the key-value capability.
//!
//! # Responsibility
//! - Map domain collections onto single key-value entries.
//! - Keep serialization details out of the store.
//!
//! # Invariants
//! - Reads degrade to "no data" instead of failing outward.
//! - Writes are wholesale; no partial records are ever stored.

pub mod contact_gateway;
