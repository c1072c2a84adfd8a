use contact_core::{
    Contact, ContactGateway, ContactStore, FetchError, FetchResult, InMemoryKeyValueStore,
    KeyValueStore, KvError, KvResult, LoadOutcome, RawContactRecord, RawName, RawPicture,
    RemoteContactSource, SqliteKeyValueStore, StorePhase,
};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

const BATCH_SIZE: u32 = 50;

/// Remote source returning a fixed batch and counting calls.
#[derive(Default)]
struct FakeSource {
    records: Vec<RawContactRecord>,
    failing: AtomicBool,
    calls: AtomicUsize,
    last_batch_size: AtomicU32,
}

impl FakeSource {
    fn with_records(records: Vec<RawContactRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RemoteContactSource for FakeSource {
    fn fetch(&self, batch_size: u32) -> FetchResult<Vec<RawContactRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_batch_size.store(batch_size, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Malformed("unexpected payload".to_string()));
        }
        Ok(self.records.clone())
    }
}

/// In-memory backend whose writes can be switched off.
#[derive(Default)]
struct FlakyKv {
    inner: InMemoryKeyValueStore,
    reject_writes: AtomicBool,
}

impl KeyValueStore for FlakyKv {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(KvError::Backend("quota exceeded".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.inner.remove(key)
    }
}

type TestStore<K> = ContactStore<Arc<K>, Arc<FakeSource>>;

fn store_with<K: KeyValueStore>(kv: &Arc<K>, source: &Arc<FakeSource>) -> TestStore<K> {
    ContactStore::new(
        ContactGateway::new(Arc::clone(kv)),
        Arc::clone(source),
        BATCH_SIZE,
    )
}

fn raw(first: &str, last: &str, phone: &str) -> RawContactRecord {
    RawContactRecord {
        name: RawName {
            title: None,
            first: first.to_string(),
            last: last.to_string(),
        },
        picture: RawPicture {
            large: format!("https://img.example/{first}/large.jpg"),
            medium: None,
            thumbnail: None,
        },
        phone: phone.to_string(),
        cell: format!("{phone}9"),
        email: format!("{}@example.com", first.to_lowercase()),
    }
}

fn contact(id: &str, name: &str, favorite: bool) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
        avatar: String::new(),
        phone: "000".to_string(),
        cell: "001".to_string(),
        email: String::new(),
        favorite,
    }
}

fn persisted<K: KeyValueStore>(kv: &Arc<K>) -> Vec<Contact> {
    ContactGateway::new(Arc::clone(kv)).read_all()
}

fn prepopulate<K: KeyValueStore>(kv: &Arc<K>, contacts: &[Contact]) {
    assert!(ContactGateway::new(Arc::clone(kv)).write_all(contacts));
}

#[test]
fn load_on_empty_storage_fetches_maps_and_persists() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111"), raw("Bob", "Lee", "222")]);
    let store = store_with(&kv, &source);

    let outcome = store.load();

    assert_eq!(outcome, LoadOutcome::Fetched { count: 2 });
    assert_eq!(source.calls(), 1);
    assert_eq!(source.last_batch_size.load(Ordering::SeqCst), BATCH_SIZE);

    let state = store.state();
    assert_eq!(state.contacts.len(), 2);
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.phase, StorePhase::Ready);
    assert!(state.contacts.iter().all(|c| !c.id.is_empty()));
    assert_ne!(state.contacts[0].id, state.contacts[1].id);
    assert_eq!(state.contacts[0].name, "Alice Smith");
    assert_eq!(state.contacts[0].phone, "111");
    assert_eq!(state.contacts[1].name, "Bob Lee");
    assert_eq!(state.contacts[1].phone, "222");

    assert_eq!(persisted(&kv), state.contacts);
}

#[test]
fn load_with_populated_storage_never_fetches() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let carl = contact("x", "Carl Young", false);
    prepopulate(&kv, &[carl.clone()]);
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    let store = store_with(&kv, &source);

    assert_eq!(store.load(), LoadOutcome::Restored { count: 1 });
    assert_eq!(store.load(), LoadOutcome::Restored { count: 1 });

    assert_eq!(source.calls(), 0);
    assert_eq!(store.state().contacts, vec![carl]);
}

#[test]
fn partially_stored_records_are_restored_without_fetching() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    kv.set(
        contact_core::CONTACTS_KEY,
        r#"[{"id":"x","name":"Carl Young","favorite":true}]"#,
    )
    .unwrap();
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    let store = store_with(&kv, &source);

    assert_eq!(store.load(), LoadOutcome::Restored { count: 1 });
    assert_eq!(source.calls(), 0);

    let restored = store.contact("x").unwrap();
    assert_eq!(restored.name, "Carl Young");
    assert!(restored.favorite);
    assert_eq!(persisted(&kv).len(), 1);
}

#[test]
fn second_load_after_fetch_restores_instead_of_refetching() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    let store = store_with(&kv, &source);

    store.load();
    let first = store.state().contacts.clone();
    assert_eq!(store.load(), LoadOutcome::Restored { count: 1 });

    assert_eq!(source.calls(), 1);
    assert_eq!(store.state().contacts, first);
}

#[test]
fn favorite_edits_survive_restart() {
    let kv = Arc::new(SqliteKeyValueStore::open_in_memory().unwrap());
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);

    let first_run = store_with(&kv, &source);
    first_run.load();
    let id = first_run.state().contacts[0].id.clone();
    let flipped = first_run.toggle_favorite(&id).unwrap();
    drop(first_run);

    let second_run = store_with(&kv, &source);
    assert_eq!(second_run.load(), LoadOutcome::Restored { count: 1 });
    assert_eq!(second_run.contact(&id).unwrap().favorite, flipped);
    assert_eq!(source.calls(), 1);
}

#[test]
fn toggle_favorite_updates_memory_and_storage() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    prepopulate(&kv, &[contact("x", "Carl Young", false)]);
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));
    store.load();

    assert_eq!(store.toggle_favorite("x"), Some(true));

    assert!(store.contact("x").unwrap().favorite);
    assert_eq!(persisted(&kv), store.state().contacts);
    assert!(persisted(&kv)[0].favorite);
}

#[test]
fn toggle_twice_restores_flag_and_leaves_others_untouched() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let original = vec![
        contact("a", "Alice Smith", false),
        contact("b", "Bob Lee", true),
        contact("c", "Carl Young", false),
    ];
    prepopulate(&kv, &original);
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));
    store.load();

    store.toggle_favorite("b");
    store.toggle_favorite("b");

    assert_eq!(store.state().contacts, original);
    assert_eq!(persisted(&kv), original);
}

#[test]
fn toggle_unknown_id_is_a_noop() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    prepopulate(&kv, &[contact("x", "Carl Young", false)]);
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));
    store.load();
    let before = store.state();

    assert_eq!(store.toggle_favorite("nope"), None);
    assert_eq!(store.state(), before);
}

#[test]
fn update_contact_replaces_in_place_and_persists() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    prepopulate(
        &kv,
        &[contact("a", "Alice Smith", false), contact("b", "Bob Lee", false)],
    );
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));
    store.load();

    let mut edited = store.contact("a").unwrap();
    edited.phone = "999".to_string();
    edited.email = "alice@new.example".to_string();
    assert!(store.update_contact(edited.clone()));

    let state = store.state();
    assert_eq!(state.contacts[0], edited);
    assert_eq!(state.contacts[1].id, "b");
    assert_eq!(persisted(&kv), state.contacts);
}

#[test]
fn update_unknown_id_leaves_contacts_unchanged() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let original = vec![contact("a", "Alice Smith", false), contact("b", "Bob Lee", true)];
    prepopulate(&kv, &original);
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));
    store.load();

    assert!(!store.update_contact(contact("ghost", "Nobody", true)));

    assert_eq!(store.state().contacts, original);
    assert_eq!(persisted(&kv), original);
}

#[test]
fn fetch_failure_sets_error_and_retry_recovers() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    source.failing.store(true, Ordering::SeqCst);
    let store = store_with(&kv, &source);

    assert_eq!(store.load(), LoadOutcome::Failed);
    let failed = store.state();
    assert!(!failed.loading);
    assert!(failed.contacts.is_empty());
    assert_eq!(failed.phase, StorePhase::Errored);
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("unexpected payload"));
    assert!(persisted(&kv).is_empty());

    source.failing.store(false, Ordering::SeqCst);
    assert_eq!(store.load(), LoadOutcome::Fetched { count: 1 });
    let recovered = store.state();
    assert_eq!(recovered.error, None);
    assert_eq!(recovered.phase, StorePhase::Ready);
    assert_eq!(source.calls(), 2);
}

#[test]
fn load_failure_keeps_previously_loaded_contacts() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    let store = store_with(&kv, &source);
    store.load();
    let loaded = store.state().contacts.clone();

    kv.remove(contact_core::CONTACTS_KEY).unwrap();
    source.failing.store(true, Ordering::SeqCst);

    assert_eq!(store.load(), LoadOutcome::Failed);
    assert_eq!(store.state().contacts, loaded);
}

#[test]
fn persistence_failure_during_load_is_reported_and_nothing_adopted() {
    let kv = Arc::new(FlakyKv::default());
    kv.reject_writes.store(true, Ordering::SeqCst);
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    let store = store_with(&kv, &source);

    assert_eq!(store.load(), LoadOutcome::Failed);

    let state = store.state();
    assert!(state.contacts.is_empty());
    assert!(!state.loading);
    assert!(state.error.as_deref().unwrap().contains("quota exceeded"));
}

#[test]
fn persistence_failure_after_toggle_keeps_in_memory_change() {
    let kv = Arc::new(FlakyKv::default());
    prepopulate(&kv, &[contact("x", "Carl Young", false)]);
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));
    store.load();

    kv.reject_writes.store(true, Ordering::SeqCst);
    assert_eq!(store.toggle_favorite("x"), Some(true));

    let state = store.state();
    assert!(state.contact("x").unwrap().favorite);
    assert_eq!(state.error, None);
    assert!(!persisted(&kv)[0].favorite);
}

#[test]
fn subscribers_see_loading_then_ready_and_stop_after_unsubscribe() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    let store = store_with(&kv, &source);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = store.subscribe(move |state| {
        sink.lock()
            .unwrap()
            .push((state.loading, state.phase, state.contacts.len()));
    });

    store.load();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(true, StorePhase::Loading, 0), (false, StorePhase::Ready, 1)]
    );

    let id = store.state().contacts[0].id.clone();
    store.toggle_favorite(&id);
    assert_eq!(seen.lock().unwrap().len(), 3);

    store.toggle_favorite("unknown");
    assert_eq!(seen.lock().unwrap().len(), 3);

    assert!(store.unsubscribe(subscription));
    assert!(!store.unsubscribe(subscription));
    store.toggle_favorite(&id);
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn revisions_increase_with_every_committed_command() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    prepopulate(&kv, &[contact("x", "Carl Young", false)]);
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));

    let initial = store.state().revision;
    store.load();
    let loaded = store.state().revision;
    store.toggle_favorite("x");
    let toggled = store.state().revision;

    assert!(initial < loaded);
    assert_eq!(toggled, loaded + 1);
}

#[test]
fn concurrent_toggles_are_serialized_without_lost_updates() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    prepopulate(
        &kv,
        &[contact("a", "Alice Smith", false), contact("b", "Bob Lee", false)],
    );
    let store = Arc::new(store_with(&kv, &FakeSource::with_records(Vec::new())));
    store.load();

    let handles = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..25 {
                    store.toggle_favorite("a");
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    // 200 toggles: back to the original flag.
    let state = store.state();
    assert!(!state.contact("a").unwrap().favorite);
    assert!(!state.contact("b").unwrap().favorite);
    assert_eq!(persisted(&kv), state.contacts);
}

#[test]
fn reset_clears_storage_and_next_load_fetches_again() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let source = FakeSource::with_records(vec![raw("Alice", "Smith", "111")]);
    let store = store_with(&kv, &source);
    store.load();

    assert!(store.reset());
    let state = store.state();
    assert!(state.contacts.is_empty());
    assert_eq!(state.phase, StorePhase::Uninitialized);
    assert!(persisted(&kv).is_empty());

    assert_eq!(store.load(), LoadOutcome::Fetched { count: 1 });
    assert_eq!(source.calls(), 2);
}

#[test]
fn favorites_lists_only_flagged_contacts() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    prepopulate(
        &kv,
        &[
            contact("a", "Alice Smith", true),
            contact("b", "Bob Lee", false),
            contact("c", "Carl Young", true),
        ],
    );
    let store = store_with(&kv, &FakeSource::with_records(Vec::new()));
    store.load();

    let ids = store
        .favorites()
        .into_iter()
        .map(|c| c.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
}
