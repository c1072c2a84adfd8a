//! Remote contact source contract.
//!
//! # Responsibility
//! - Define the single fetch operation the store depends on.
//! - Collapse transport and payload problems into one failure type.
//!
//! # Invariants
//! - A source never retries on its own; callers decide.

use crate::model::contact::RawContactRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod http;

pub use http::HttpContactSource;

pub type FetchResult<T> = Result<T, FetchError>;

/// Remote fetch failure.
#[derive(Debug)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure.
    Transport(reqwest::Error),
    /// Non-success HTTP status.
    Status(u16),
    /// Response body did not have the expected shape.
    Malformed(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "contact source unreachable: {err}"),
            Self::Status(code) => write!(f, "contact source returned HTTP {code}"),
            Self::Malformed(message) => write!(f, "malformed contact source response: {message}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Status(_) | Self::Malformed(_) => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

/// Source of raw contact batches.
pub trait RemoteContactSource {
    fn fetch(&self, batch_size: u32) -> FetchResult<Vec<RawContactRecord>>;
}

impl<T: RemoteContactSource + ?Sized> RemoteContactSource for Arc<T> {
    fn fetch(&self, batch_size: u32) -> FetchResult<Vec<RawContactRecord>> {
        (**self).fetch(batch_size)
    }
}
