//! Core contact state and persistence for the contacts client.
//! This crate owns the invariants between the in-memory contact snapshot
//! and its durable on-device copy.

pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod store;

pub use config::ContactsConfig;
pub use kv::{InMemoryKeyValueStore, KeyValueStore, KvError, KvResult, SqliteKeyValueStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactId, RawContactRecord, RawName, RawPicture};
pub use remote::{FetchError, FetchResult, HttpContactSource, RemoteContactSource};
pub use repo::contact_gateway::{ContactGateway, GatewayError, GatewayResult, CONTACTS_KEY};
pub use store::{
    apply, Action, ContactStore, LoadError, LoadOutcome, StorePhase, StoreState, SubscriptionId,
};

/// Store wired to the on-device SQLite backend and the HTTP source.
pub type DeviceContactStore = ContactStore<SqliteKeyValueStore, HttpContactSource>;

/// Builds a [`DeviceContactStore`] from configuration.
///
/// # Errors
/// Returns a message when the database cannot be opened or the HTTP
/// client cannot be built.
pub fn open_device_store(config: &ContactsConfig) -> Result<DeviceContactStore, String> {
    let kv = SqliteKeyValueStore::open(&config.db_path).map_err(|err| {
        format!(
            "failed to open contacts database `{}`: {err}",
            config.db_path.display()
        )
    })?;
    let remote = HttpContactSource::from_config(config)
        .map_err(|err| format!("failed to build contact source: {err}"))?;
    Ok(ContactStore::new(
        ContactGateway::new(kv),
        remote,
        config.batch_size,
    ))
}

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
