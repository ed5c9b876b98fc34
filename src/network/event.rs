// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Traffic records and stock observers

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use super::observer::{RequestObserver, ResponseObserver};
use crate::error::Result;
use crate::xhr::{SendArgs, XhrHandle};

/// Summary of a completed request, as handed to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub status: u16,
    pub status_text: String,
    /// Body pretty-printed when it is JSON, verbatim otherwise
    pub response: String,
    /// Method captured at open time
    pub method: Option<String>,
    /// URL captured at open time
    pub url: Option<String>,
    /// RFC 3339, UTC, millisecond precision
    pub timestamp: String,
}

impl ResponseRecord {
    /// Build a record from a completed request
    pub fn from_xhr(xhr: &XhrHandle) -> Self {
        Self {
            status: xhr.status(),
            status_text: xhr.status_text(),
            response: pretty_body(&xhr.response_text()),
            method: xhr.method(),
            url: xhr.url(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Host part of the recorded URL
    pub fn host(&self) -> Option<String> {
        self.url
            .as_deref()
            .and_then(|u| url::Url::parse(u).ok())
            .and_then(|u| u.host_str().map(String::from))
    }
}

/// Re-indent a JSON body with two spaces; anything else is returned as is
fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| body.to_string())
}

/// Bounded in-memory log of completed requests
#[derive(Clone)]
pub struct TrafficLog {
    records: Arc<RwLock<Vec<ResponseRecord>>>,
    max_records: usize,
}

impl Default for TrafficLog {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl TrafficLog {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            max_records: max_records.max(1),
        }
    }

    /// Append a record, evicting the oldest when full
    pub fn push(&self, record: ResponseRecord) {
        let mut records = self.records.write();
        if records.len() >= self.max_records {
            records.remove(0);
        }
        records.push(record);
    }

    pub fn records(&self) -> Vec<ResponseRecord> {
        self.records.read().clone()
    }

    pub fn last(&self) -> Option<ResponseRecord> {
        self.records.read().last().cloned()
    }

    /// Records with a non-2xx status, including network failures
    pub fn failed(&self) -> Vec<ResponseRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| !r.is_success())
            .cloned()
            .collect()
    }

    /// Records whose URL host matches `host`, case-insensitively
    pub fn for_host(&self, host: &str) -> Vec<ResponseRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| {
                r.host()
                    .map(|h| h.eq_ignore_ascii_case(host))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn unique_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .records
            .read()
            .iter()
            .filter_map(|r| r.url.clone())
            .collect();
        urls.sort();
        urls.dedup();
        urls
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Export records as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.records.read())
    }
}

impl ResponseObserver for TrafficLog {
    fn on_response(&self, xhr: &XhrHandle) -> Result<()> {
        self.push(ResponseRecord::from_xhr(xhr));
        Ok(())
    }
}

/// Forwards every completed request into a channel
pub struct RecordSender {
    tx: UnboundedSender<ResponseRecord>,
}

impl RecordSender {
    pub fn new(tx: UnboundedSender<ResponseRecord>) -> Self {
        Self { tx }
    }
}

impl ResponseObserver for RecordSender {
    fn on_response(&self, xhr: &XhrHandle) -> Result<()> {
        // A dropped receiver only means nobody is listening any more
        if self.tx.send(ResponseRecord::from_xhr(xhr)).is_err() {
            tracing::debug!(id = xhr.id(), "Record receiver closed");
        }
        Ok(())
    }
}

/// Logs traffic through `tracing`
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    /// Log request bodies
    pub log_bodies: bool,
    /// Log response bodies
    pub log_responses: bool,
    /// Only log URLs containing this substring
    pub url_filter: Option<String>,
}

impl RequestLogger {
    fn matches(&self, xhr: &XhrHandle) -> bool {
        match (&self.url_filter, xhr.url()) {
            (Some(filter), Some(url)) => url.contains(filter.as_str()),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

impl RequestObserver for RequestLogger {
    fn on_request(&self, xhr: &XhrHandle, args: &SendArgs) -> Result<()> {
        if !self.matches(xhr) {
            return Ok(());
        }

        let method = xhr.method().unwrap_or_default();
        let url = xhr.url().unwrap_or_default();
        tracing::info!(id = xhr.id(), method = %method, url = %url, "Request");

        if self.log_bodies {
            if let Some(body) = args.body_text() {
                tracing::debug!(id = xhr.id(), body = %body, "Request body");
            }
        }
        Ok(())
    }
}

impl ResponseObserver for RequestLogger {
    fn on_response(&self, xhr: &XhrHandle) -> Result<()> {
        if !self.matches(xhr) {
            return Ok(());
        }

        let url = xhr.url().unwrap_or_default();
        match xhr.error() {
            Some(error) => {
                tracing::warn!(id = xhr.id(), url = %url, error = %error, "Request failed")
            }
            None => tracing::info!(
                id = xhr.id(),
                url = %url,
                status = xhr.status(),
                elapsed_ms = xhr.response_time_ms(),
                "Response"
            ),
        }

        if self.log_responses {
            let body = xhr.response_text();
            tracing::debug!(id = xhr.id(), body = %body, "Response body");
        }
        Ok(())
    }
}
