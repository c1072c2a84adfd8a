//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise the device store (SQLite + HTTP source) without Flutter.
//! - Print a short, deterministic summary of the loaded snapshot.
//!
//! Configuration comes from `CONTACTS_*` environment variables.

use contact_core::{open_device_store, ContactsConfig, LoadOutcome};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("contact_core ping={}", contact_core::ping());
    println!("contact_core version={}", contact_core::core_version());

    let config = ContactsConfig::from_env();
    println!("db_path={}", config.db_path.display());

    let store = match open_device_store(&config) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("store_open failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = store.load();
    let state = store.state();
    match outcome {
        LoadOutcome::Restored { count } => println!("load=restored count={count}"),
        LoadOutcome::Fetched { count } => println!("load=fetched count={count}"),
        LoadOutcome::Failed => {
            eprintln!(
                "load=failed error={}",
                state.error.as_deref().unwrap_or("unknown")
            );
            return ExitCode::FAILURE;
        }
    }

    println!("favorites={}", state.favorites().count());
    for contact in state.contacts.iter().take(5) {
        let marker = if contact.favorite { '*' } else { ' ' };
        println!("{marker} {} <{}> {}", contact.name, contact.email, contact.phone);
    }
    ExitCode::SUCCESS
}
