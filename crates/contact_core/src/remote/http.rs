//! HTTP contact source for randomuser.me-compatible endpoints.
//!
//! Request: `GET <url>?results=<batch_size>`.
//! Response: `{ "results": [RawContactRecord, ...], ... }`.

use super::{FetchError, FetchResult, RemoteContactSource};
use crate::config::ContactsConfig;
use crate::model::contact::RawContactRecord;
use log::{error, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct BatchResponse {
    results: Vec<RawContactRecord>,
}

/// Blocking HTTP client for one contact endpoint.
pub struct HttpContactSource {
    client: Client,
    url: String,
}

impl HttpContactSource {
    /// Builds a client whose requests time out after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &ContactsConfig) -> FetchResult<Self> {
        Self::new(config.source_url.clone(), config.request_timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, batch_size: u32) -> FetchResult<Vec<RawContactRecord>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("results", batch_size)])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        parse_batch(&response.text()?)
    }
}

impl RemoteContactSource for HttpContactSource {
    fn fetch(&self, batch_size: u32) -> FetchResult<Vec<RawContactRecord>> {
        let started_at = Instant::now();
        info!("event=contacts_fetch module=remote status=start batch_size={batch_size}");

        let result = self.request(batch_size);
        match &result {
            Ok(records) => info!(
                "event=contacts_fetch module=remote status=ok count={} duration_ms={}",
                records.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=contacts_fetch module=remote status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

/// Decodes one response body into raw records.
pub(crate) fn parse_batch(body: &str) -> FetchResult<Vec<RawContactRecord>> {
    serde_json::from_str::<BatchResponse>(body)
        .map(|batch| batch.results)
        .map_err(|err| FetchError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_batch;
    use crate::remote::FetchError;

    #[test]
    fn parse_batch_reads_results_and_ignores_extra_fields() {
        let body = r#"{
            "results": [{
                "gender": "female",
                "name": {"title": "Ms", "first": "Alice", "last": "Smith"},
                "picture": {
                    "large": "https://img.example/l.jpg",
                    "medium": "https://img.example/m.jpg",
                    "thumbnail": "https://img.example/t.jpg"
                },
                "phone": "111",
                "cell": "112",
                "email": "alice@example.com"
            }],
            "info": {"seed": "abc", "results": 1, "page": 1, "version": "1.4"}
        }"#;

        let records = parse_batch(body).expect("valid body should parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.first, "Alice");
        assert_eq!(records[0].picture.large, "https://img.example/l.jpg");
        assert_eq!(records[0].cell, "112");
    }

    #[test]
    fn parse_batch_rejects_missing_results() {
        let err = parse_batch(r#"{"error": "Uh oh"}"#).expect_err("missing results must fail");
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn parse_batch_rejects_record_without_picture() {
        let body = r#"{"results": [{
            "name": {"first": "Bob", "last": "Lee"},
            "phone": "222", "cell": "223", "email": "bob@example.com"
        }]}"#;
        assert!(matches!(parse_batch(body), Err(FetchError::Malformed(_))));
    }
}
