//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record persisted and rendered by clients.
//! - Define the raw remote payload shape and its one-way ingestion mapping.
//!
//! # Invariants
//! - Every contact is identified by a stable `ContactId`.
//! - `favorite` is the only field mutated after ingestion.

pub mod contact;
