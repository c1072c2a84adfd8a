//! Pure state transitions for the contact store.
//!
//! # Responsibility
//! - Define the immutable snapshot handed to subscribers.
//! - Apply one action to one snapshot without side effects.
//!
//! # Invariants
//! - `revision` increases by one for every transition that changes state
//!   and stays put for no-op actions.
//! - `error` is only set by `LoadFailed` and only cleared by
//!   `LoadSucceeded` or `Reset`.
//! - Updates and toggles never touch `loading`, `error` or `phase`.

use crate::model::contact::{Contact, ContactId};

/// Macro-state of the store lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorePhase {
    /// No load attempted yet.
    #[default]
    Uninitialized,
    /// A load is in flight.
    Loading,
    /// Last load succeeded.
    Ready,
    /// Last load failed; contacts keep their prior value.
    Errored,
}

/// Immutable store snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub contacts: Vec<Contact>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: StorePhase,
    pub revision: u64,
}

impl StoreState {
    /// Looks up a contact by id.
    pub fn contact(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|contact| contact.id == id)
    }

    /// Iterates favorite contacts in snapshot order.
    pub fn favorites(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter().filter(|contact| contact.favorite)
    }
}

/// State change requested by a store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadStarted,
    LoadSucceeded(Vec<Contact>),
    LoadFailed(String),
    ContactUpdated(Contact),
    FavoriteToggled(ContactId),
    Reset,
}

/// Returns the snapshot that results from applying `action` to `state`.
pub fn apply(state: &StoreState, action: Action) -> StoreState {
    let mut next = state.clone();

    let changed = match action {
        Action::LoadStarted => {
            next.loading = true;
            next.phase = StorePhase::Loading;
            true
        }
        Action::LoadSucceeded(contacts) => {
            next.contacts = contacts;
            next.loading = false;
            next.error = None;
            next.phase = StorePhase::Ready;
            true
        }
        Action::LoadFailed(message) => {
            next.loading = false;
            next.error = Some(message);
            next.phase = StorePhase::Errored;
            true
        }
        Action::ContactUpdated(contact) => {
            match next.contacts.iter_mut().find(|stored| stored.id == contact.id) {
                Some(slot) => {
                    *slot = contact;
                    true
                }
                None => false,
            }
        }
        Action::FavoriteToggled(id) => {
            match next.contacts.iter_mut().find(|stored| stored.id == id) {
                Some(contact) => {
                    contact.toggle_favorite();
                    true
                }
                None => false,
            }
        }
        Action::Reset => {
            next = StoreState::default();
            true
        }
    };

    next.revision = if changed {
        state.revision + 1
    } else {
        state.revision
    };
    next
}

#[cfg(test)]
mod tests {
    use super::{apply, Action, StorePhase, StoreState};
    use crate::model::contact::Contact;

    fn contact(id: &str, favorite: bool) -> Contact {
        Contact {
            id: id.to_string(),
            name: format!("Name {id}"),
            avatar: String::new(),
            phone: "111".to_string(),
            cell: "222".to_string(),
            email: format!("{id}@example.com"),
            favorite,
        }
    }

    fn ready_with(contacts: Vec<Contact>) -> StoreState {
        apply(&StoreState::default(), Action::LoadSucceeded(contacts))
    }

    #[test]
    fn load_lifecycle_moves_through_phases() {
        let initial = StoreState::default();
        assert_eq!(initial.phase, StorePhase::Uninitialized);

        let loading = apply(&initial, Action::LoadStarted);
        assert!(loading.loading);
        assert_eq!(loading.phase, StorePhase::Loading);

        let failed = apply(&loading, Action::LoadFailed("offline".to_string()));
        assert!(!failed.loading);
        assert_eq!(failed.error.as_deref(), Some("offline"));
        assert_eq!(failed.phase, StorePhase::Errored);

        let retry = apply(&failed, Action::LoadStarted);
        assert_eq!(retry.error.as_deref(), Some("offline"));

        let ready = apply(&retry, Action::LoadSucceeded(vec![contact("a", false)]));
        assert!(!ready.loading);
        assert_eq!(ready.error, None);
        assert_eq!(ready.phase, StorePhase::Ready);
        assert_eq!(ready.revision, 4);
    }

    #[test]
    fn load_failure_keeps_prior_contacts() {
        let ready = ready_with(vec![contact("a", false)]);
        let failed = apply(&ready, Action::LoadFailed("boom".to_string()));
        assert_eq!(failed.contacts, ready.contacts);
    }

    #[test]
    fn update_replaces_in_place_and_keeps_order() {
        let ready = ready_with(vec![contact("a", false), contact("b", false), contact("c", true)]);
        let mut edited = contact("b", false);
        edited.name = "Edited".to_string();

        let next = apply(&ready, Action::ContactUpdated(edited.clone()));

        let ids = next.contacts.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(next.contacts[1], edited);
        assert_eq!(next.revision, ready.revision + 1);
    }

    #[test]
    fn update_with_unknown_id_is_a_noop() {
        let ready = ready_with(vec![contact("a", false)]);
        let next = apply(&ready, Action::ContactUpdated(contact("zzz", true)));
        assert_eq!(next, ready);
    }

    #[test]
    fn toggle_twice_restores_flag_and_leaves_others_alone() {
        let ready = ready_with(vec![contact("a", false), contact("b", true)]);

        let once = apply(&ready, Action::FavoriteToggled("a".to_string()));
        assert!(once.contact("a").expect("a present").favorite);
        assert!(once.contact("b").expect("b present").favorite);

        let twice = apply(&once, Action::FavoriteToggled("a".to_string()));
        assert_eq!(twice.contacts, ready.contacts);
    }

    #[test]
    fn toggle_unknown_id_keeps_revision() {
        let ready = ready_with(vec![contact("a", false)]);
        let next = apply(&ready, Action::FavoriteToggled("missing".to_string()));
        assert_eq!(next.revision, ready.revision);
    }

    #[test]
    fn mutations_do_not_touch_error_or_phase() {
        let ready = ready_with(vec![contact("a", false)]);
        let failed = apply(&ready, Action::LoadFailed("offline".to_string()));

        let toggled = apply(&failed, Action::FavoriteToggled("a".to_string()));
        assert_eq!(toggled.error.as_deref(), Some("offline"));
        assert_eq!(toggled.phase, StorePhase::Errored);
        assert!(!toggled.loading);
    }

    #[test]
    fn reset_returns_to_uninitialized_with_new_revision() {
        let ready = ready_with(vec![contact("a", true)]);
        let reset = apply(&ready, Action::Reset);

        assert!(reset.contacts.is_empty());
        assert_eq!(reset.phase, StorePhase::Uninitialized);
        assert_eq!(reset.revision, ready.revision + 1);
        assert_eq!(reset.favorites().count(), 0);
    }
}
