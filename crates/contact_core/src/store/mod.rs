//! Reactive contact state.
//!
//! # Responsibility
//! - Hold the process-visible contact snapshot for UI consumers.
//! - Split pure transitions (`reducer`) from side-effecting commands
//!   (`contact_store`).
//!
//! # Invariants
//! - Snapshots are immutable once published.
//! - Every published snapshot has a higher `revision` than the previous one.

mod command_queue;
pub mod contact_store;
pub mod reducer;

pub use contact_store::{ContactStore, LoadError, LoadOutcome, SubscriptionId};
pub use reducer::{apply, Action, StorePhase, StoreState};
