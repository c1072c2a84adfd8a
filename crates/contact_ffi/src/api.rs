//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose store commands and snapshots to Dart via FRB.
//! - Own the single process-wide contact store instance.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures come back inside response envelopes, never as panics.

use contact_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, open_device_store,
    ping as ping_inner, Contact, ContactsConfig, DeviceContactStore, StorePhase, StoreState,
};
use log::error;
use once_cell::sync::OnceCell;

static STORE: OnceCell<DeviceContactStore> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - `level`: `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling log files.
/// - Returns empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One contact row as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactItem {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub phone: String,
    pub cell: String,
    pub email: String,
    pub favorite: bool,
}

/// Store snapshot envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListView {
    pub contacts: Vec<ContactItem>,
    pub loading: bool,
    /// Last load failure, or store bootstrap failure.
    pub error: Option<String>,
    /// `uninitialized|loading|ready|errored`.
    pub phase: String,
    /// Increases on every committed change; lets the UI skip redraws.
    pub revision: u64,
}

/// Result envelope for mutating commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactActionResponse {
    /// Whether the command changed anything.
    pub ok: bool,
    /// New favorite flag after a toggle.
    pub favorite: Option<bool>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

impl ContactActionResponse {
    fn applied(message: impl Into<String>, favorite: Option<bool>) -> Self {
        Self {
            ok: true,
            favorite,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            favorite: None,
            message: message.into(),
        }
    }
}

/// Loads contacts from device storage, fetching them on first run.
///
/// # FFI contract
/// - Sync call; blocks on disk and, on first run only, on the network.
/// - Call from a background isolate.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_load() -> ContactListView {
    match store() {
        Ok(store) => {
            store.load();
            to_list_view(&store.state())
        }
        Err(err) => bootstrap_failure_view(err),
    }
}

/// Returns the current snapshot without touching storage or network.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_snapshot() -> ContactListView {
    match store() {
        Ok(store) => to_list_view(&store.state()),
        Err(err) => bootstrap_failure_view(err),
    }
}

/// Replaces one contact by id.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_update(item: ContactItem) -> ContactActionResponse {
    match store() {
        Ok(store) => update_in(store, item),
        Err(err) => ContactActionResponse::rejected(err),
    }
}

/// Flips the favorite flag of one contact.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_toggle_favorite(id: String) -> ContactActionResponse {
    match store() {
        Ok(store) => toggle_favorite_in(store, &id),
        Err(err) => ContactActionResponse::rejected(err),
    }
}

/// Clears stored contacts for logout/reset flows.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_reset() -> ContactActionResponse {
    match store() {
        Ok(store) => reset_in(store),
        Err(err) => ContactActionResponse::rejected(err),
    }
}

fn update_in(store: &DeviceContactStore, item: ContactItem) -> ContactActionResponse {
    if store.update_contact(from_item(item)) {
        ContactActionResponse::applied("Contact updated.", None)
    } else {
        ContactActionResponse::rejected("Contact not found.")
    }
}

fn toggle_favorite_in(store: &DeviceContactStore, id: &str) -> ContactActionResponse {
    match store.toggle_favorite(id.trim()) {
        Some(favorite) => ContactActionResponse::applied("Favorite toggled.", Some(favorite)),
        None => ContactActionResponse::rejected("Contact not found."),
    }
}

fn reset_in(store: &DeviceContactStore) -> ContactActionResponse {
    if store.reset() {
        ContactActionResponse::applied("Contacts cleared.", None)
    } else {
        ContactActionResponse::rejected("Contacts could not be removed from storage.")
    }
}

fn store() -> Result<&'static DeviceContactStore, String> {
    STORE.get_or_try_init(|| {
        open_device_store(&ContactsConfig::from_env()).inspect_err(|err| {
            error!("event=store_open module=ffi status=error error={err}");
        })
    })
}

fn bootstrap_failure_view(err: String) -> ContactListView {
    ContactListView {
        contacts: Vec::new(),
        loading: false,
        error: Some(err),
        phase: phase_label(StorePhase::Errored).to_string(),
        revision: 0,
    }
}

fn to_list_view(state: &StoreState) -> ContactListView {
    ContactListView {
        contacts: state.contacts.iter().cloned().map(to_item).collect(),
        loading: state.loading,
        error: state.error.clone(),
        phase: phase_label(state.phase).to_string(),
        revision: state.revision,
    }
}

fn to_item(contact: Contact) -> ContactItem {
    ContactItem {
        id: contact.id,
        name: contact.name,
        avatar: contact.avatar,
        phone: contact.phone,
        cell: contact.cell,
        email: contact.email,
        favorite: contact.favorite,
    }
}

fn from_item(item: ContactItem) -> Contact {
    Contact {
        id: item.id,
        name: item.name,
        avatar: item.avatar,
        phone: item.phone,
        cell: item.cell,
        email: item.email,
        favorite: item.favorite,
    }
}

fn phase_label(phase: StorePhase) -> &'static str {
    match phase {
        StorePhase::Uninitialized => "uninitialized",
        StorePhase::Loading => "loading",
        StorePhase::Ready => "ready",
        StorePhase::Errored => "errored",
    }
}
