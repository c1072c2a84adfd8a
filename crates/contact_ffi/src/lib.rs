//! Flutter-facing bindings for the contact core.

pub mod api;
