//! Contact store: command pipelines over the reducer.
//!
//! # Responsibility
//! - Run Load / UpdateContact / ToggleFavorite as sequential pipelines.
//! - Keep the in-memory snapshot and the persisted snapshot in step.
//! - Notify subscribers after every committed transition.
//!
//! # Invariants
//! - Commands hold one command turn for their whole read-modify-write,
//!   including I/O, so they never interleave; turns go out in call order.
//! - Remote fetch only runs when persisted storage is empty.
//! - Persistence failures after a mutation are logged, never rolled back.
//! - Listeners run outside internal locks.

use crate::kv::KeyValueStore;
use crate::model::contact::Contact;
use crate::remote::{FetchError, RemoteContactSource};
use crate::store::command_queue::{CommandQueue, CommandTurn};
use crate::repo::contact_gateway::{ContactGateway, GatewayError};
use crate::store::reducer::{apply, Action, StoreState};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

/// Handle returned by [`ContactStore::subscribe`].
pub type SubscriptionId = u64;

type Listener = Arc<dyn Fn(&StoreState) + Send + Sync>;

/// Result of one Load command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Contacts adopted from persisted storage; no fetch happened.
    Restored { count: usize },
    /// Storage was empty; contacts were fetched, mapped and persisted.
    Fetched { count: usize },
    /// Load failed; see `StoreState::error`.
    Failed,
}

/// Failure of the Load pipeline, reported through `StoreState::error`.
#[derive(Debug)]
pub enum LoadError {
    Fetch(FetchError),
    Persist(GatewayError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<FetchError> for LoadError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<GatewayError> for LoadError {
    fn from(value: GatewayError) -> Self {
        Self::Persist(value)
    }
}

/// Owned contact state container.
///
/// Listeners must not issue store commands themselves; commands from a
/// listener would wait behind the notifying command forever.
pub struct ContactStore<K: KeyValueStore, R: RemoteContactSource> {
    gateway: ContactGateway<K>,
    remote: R,
    batch_size: u32,
    commands: CommandQueue,
    state: RwLock<Arc<StoreState>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl<K: KeyValueStore, R: RemoteContactSource> ContactStore<K, R> {
    /// Creates an empty store; nothing is read until [`ContactStore::load`].
    pub fn new(gateway: ContactGateway<K>, remote: R, batch_size: u32) -> Self {
        Self {
            gateway,
            remote,
            batch_size,
            commands: CommandQueue::default(),
            state: RwLock::new(Arc::new(StoreState::default())),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn gateway(&self) -> &ContactGateway<K> {
        &self.gateway
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<StoreState> {
        Arc::clone(&*self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn contact(&self, id: &str) -> Option<Contact> {
        self.state().contact(id).cloned()
    }

    pub fn favorites(&self) -> Vec<Contact> {
        self.state().favorites().cloned().collect()
    }

    /// Registers a listener called with every committed snapshot.
    pub fn subscribe(
        &self,
        listener: impl Fn(&StoreState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener; returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Populates the store, from storage when possible, else from remote.
    pub fn load(&self) -> LoadOutcome {
        let _command = self.lock_commands();
        let started_at = Instant::now();
        info!("event=contacts_load module=store status=start");

        self.commit(Action::LoadStarted);

        match self.populate() {
            Ok((contacts, outcome)) => {
                self.commit(Action::LoadSucceeded(contacts));
                info!(
                    "event=contacts_load module=store status=ok outcome={outcome:?} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                outcome
            }
            Err(err) => {
                error!(
                    "event=contacts_load module=store status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                self.commit(Action::LoadFailed(err.to_string()));
                LoadOutcome::Failed
            }
        }
    }

    /// Replaces the contact with the same id and persists the list.
    ///
    /// Returns `false` (and changes nothing) when the id is unknown.
    pub fn update_contact(&self, contact: Contact) -> bool {
        let _command = self.lock_commands();
        let id = contact.id.clone();

        match self.commit(Action::ContactUpdated(contact)) {
            Some(next) => {
                self.persist_after_mutation("contacts_update", &id, &next);
                true
            }
            None => {
                debug!("event=contacts_update module=store status=skip reason=not_found id={id}");
                false
            }
        }
    }

    /// Flips the favorite flag of one contact and persists the list.
    ///
    /// Returns the new flag, or `None` when the id is unknown.
    pub fn toggle_favorite(&self, id: &str) -> Option<bool> {
        let _command = self.lock_commands();

        let Some(next) = self.commit(Action::FavoriteToggled(id.to_string())) else {
            debug!(
                "event=contacts_toggle_favorite module=store status=skip reason=not_found id={id}"
            );
            return None;
        };
        self.persist_after_mutation("contacts_toggle_favorite", id, &next);
        next.contact(id).map(|contact| contact.favorite)
    }

    /// Drops persisted and in-memory contacts (logout/reset).
    ///
    /// Returns whether the persisted snapshot was removed. In-memory state
    /// is reset either way.
    pub fn reset(&self) -> bool {
        let _command = self.lock_commands();
        let cleared = self.gateway.clear();
        self.commit(Action::Reset);
        if cleared {
            info!("event=contacts_reset module=store status=ok");
        } else {
            warn!("event=contacts_reset module=store status=error reason=storage_clear_failed");
        }
        cleared
    }

    fn populate(&self) -> Result<(Vec<Contact>, LoadOutcome), LoadError> {
        let stored = self.gateway.read_all();
        if !stored.is_empty() {
            let count = stored.len();
            return Ok((stored, LoadOutcome::Restored { count }));
        }

        let contacts = self
            .remote
            .fetch(self.batch_size)?
            .into_iter()
            .map(Contact::from_raw)
            .collect::<Vec<_>>();
        self.gateway.try_write_all(&contacts)?;

        let count = contacts.len();
        Ok((contacts, LoadOutcome::Fetched { count }))
    }

    fn persist_after_mutation(&self, event: &str, id: &str, state: &StoreState) {
        if self.gateway.write_all(&state.contacts) {
            debug!("event={event} module=store status=ok id={id}");
        } else {
            warn!("event={event} module=store status=error reason=persist_failed id={id}");
        }
    }

    /// Applies `action`; returns the new snapshot when state changed.
    fn commit(&self, action: Action) -> Option<Arc<StoreState>> {
        let next = {
            let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let next = apply(&current, action);
            if next.revision == current.revision {
                return None;
            }
            let next = Arc::new(next);
            *current = Arc::clone(&next);
            next
        };

        self.notify(&next);
        Some(next)
    }

    fn notify(&self, state: &StoreState) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect::<Vec<_>>();

        for listener in listeners {
            listener(state);
        }
    }

    fn lock_commands(&self) -> CommandTurn<'_> {
        self.commands.enter()
    }
}
