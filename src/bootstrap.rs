// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Dashboard bootstrap
//!
//! Loads `config.json`, makes sure the interceptor is wired and connects
//! completed requests to the dashboard's traffic view.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::{Error, ErrorContext, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::network::{
    Interceptor, InterceptorConfig, RecordSender, RequestLogger, RequestObserver,
    ResponseObserver, ResponseRecord, TrafficLog,
};
use crate::xhr::{HttpTransport, XhrHandle, XhrPrototype};

lazy_static! {
    static ref GLOBAL: Interceptor = Interceptor::new(XhrPrototype::new(Arc::new(
        HttpTransport::new(HttpClient::default())
    )));
}

/// Process-wide interceptor over the default HTTP prototype
pub fn global() -> &'static Interceptor {
    &GLOBAL
}

/// HTTP client section of the dashboard config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
    pub headers: BTreeMap<String, String>,
    pub proxy: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: 30,
            headers: BTreeMap::new(),
            proxy: None,
        }
    }
}

impl HttpSettings {
    pub fn client_config(&self) -> Result<HttpClientConfig> {
        if self.timeout_secs == 0 {
            return Err(Error::config("http.timeout_secs must be positive"));
        }

        let mut config =
            HttpClientConfig::default().timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref user_agent) = self.user_agent {
            config = config.user_agent(user_agent.clone());
        }
        for (name, value) in &self.headers {
            config = config.header(name, value)?;
        }
        if let Some(ref proxy) = self.proxy {
            config = config.proxy(proxy.clone());
        }
        Ok(config)
    }
}

/// Contents of `config.json`
///
/// Keys other than the known sections are application flags and are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub interceptor: InterceptorConfig,
    pub http: HttpSettings,
    /// Capacity of the in-memory traffic log
    pub max_records: usize,
    #[serde(flatten)]
    pub flags: serde_json::Map<String, serde_json::Value>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            interceptor: InterceptorConfig::default(),
            http: HttpSettings::default(),
            max_records: 1000,
            flags: serde_json::Map::new(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json).config_context("dashboard config")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).config_context(&path.display().to_string())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), flags = config.flags.len(), "Loaded dashboard config");
        Ok(config)
    }

    /// Application flag by name
    pub fn flag(&self, name: &str) -> Option<&serde_json::Value> {
        self.flags.get(name)
    }

    /// Interceptor over a fresh HTTP prototype built from this config
    pub fn build_interceptor(&self) -> Result<Interceptor> {
        let client = HttpClient::with_config(self.http.client_config()?)?;
        let prototype = XhrPrototype::new(Arc::new(HttpTransport::new(client)));
        Ok(Interceptor::with_config(prototype, self.interceptor.clone()))
    }
}

/// Running dashboard: a wired interceptor feeding the traffic view
pub struct Dashboard {
    interceptor: Interceptor,
    traffic: TrafficLog,
    observers: Vec<Arc<dyn ResponseObserver>>,
    request_observers: Vec<Arc<dyn RequestObserver>>,
    records: Option<UnboundedReceiver<ResponseRecord>>,
}

impl Dashboard {
    /// Wire `interceptor` unless it already is, and register the traffic
    /// log and the record channel
    pub fn start(interceptor: Interceptor, max_records: usize) -> Result<Self> {
        match interceptor.wire() {
            Ok(()) => tracing::info!("Ajax interceptor wired by dashboard"),
            Err(Error::AlreadyWired) => tracing::debug!("Ajax interceptor was already wired"),
            Err(e) => return Err(e),
        }

        let traffic = TrafficLog::new(max_records);
        let (tx, rx) = mpsc::unbounded_channel();
        let log_observer: Arc<dyn ResponseObserver> = Arc::new(traffic.clone());
        let channel_observer: Arc<dyn ResponseObserver> = Arc::new(RecordSender::new(tx));
        let observers = vec![log_observer, channel_observer];
        for observer in &observers {
            interceptor.add_response_callback(observer.clone());
        }

        Ok(Self {
            interceptor,
            traffic,
            observers,
            request_observers: Vec::new(),
            records: Some(rx),
        })
    }

    /// Build the interceptor from `config` and start on it
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        Self::start(config.build_interceptor()?, config.max_records)
    }

    /// Also log all traffic through `tracing`
    pub fn with_logging(mut self, logger: RequestLogger) -> Self {
        let logger = Arc::new(logger);
        let on_request: Arc<dyn RequestObserver> = logger.clone();
        let on_response: Arc<dyn ResponseObserver> = logger;
        self.interceptor.add_request_callback(on_request.clone());
        self.interceptor.add_response_callback(on_response.clone());
        self.request_observers.push(on_request);
        self.observers.push(on_response);
        self
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    pub fn traffic(&self) -> &TrafficLog {
        &self.traffic
    }

    /// New request on the intercepted prototype
    pub fn new_request(&self) -> XhrHandle {
        self.interceptor.prototype().new_request()
    }

    /// Take the receiving end of the record channel
    pub fn take_records(&mut self) -> Option<UnboundedReceiver<ResponseRecord>> {
        self.records.take()
    }

    /// Wait for the next completed request; `None` once the records
    /// channel was taken
    pub async fn next_record(&mut self) -> Option<ResponseRecord> {
        match self.records {
            Some(ref mut rx) => rx.recv().await,
            None => None,
        }
    }

    /// Remove every observer the dashboard registered. The interceptor
    /// stays wired for other consumers.
    pub fn shutdown(self) -> Result<()> {
        for observer in &self.observers {
            self.interceptor.remove_response_callback(observer)?;
        }
        for observer in &self.request_observers {
            self.interceptor.remove_request_callback(observer)?;
        }
        tracing::debug!("Dashboard observers removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::xhr::testing::recording_prototype;
    use crate::xhr::{ReadyState, SendArgs};

    #[test]
    fn test_config_from_file_keeps_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "apiRoot": "https://api.example.com",
                "refreshSeconds": 15,
                "interceptor": {{ "deduplicate_completion": true }},
                "http": {{ "timeout_secs": 5, "headers": {{ "x-dashboard": "1" }} }},
                "max_records": 50
            }}"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert!(config.interceptor.deduplicate_completion);
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.max_records, 50);
        assert_eq!(config.flag("apiRoot").unwrap(), "https://api.example.com");
        assert_eq!(config.flag("refreshSeconds").unwrap(), 15);
        assert!(config.flag("interceptor").is_none());

        let client = config.http.client_config().unwrap();
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert!(client.default_headers.contains_key("x-dashboard"));
    }

    #[test]
    fn test_config_defaults() {
        let config = DashboardConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.max_records, 1000);
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            DashboardConfig::from_json_str("{not json"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_file("/nonexistent/config.json"),
            Err(Error::Config(_))
        ));

        let settings = HttpSettings {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(settings.client_config().is_err());
    }

    #[test]
    fn test_start_wires_once() {
        let (proto, _log) = recording_prototype();
        let interceptor = Interceptor::new(proto);
        interceptor.wire().unwrap();

        let dashboard = Dashboard::start(interceptor.clone(), 10).unwrap();
        assert!(dashboard.interceptor().is_wired());
        assert_eq!(interceptor.response_callback_count(), 2);
    }

    #[tokio::test]
    async fn test_records_flow_and_shutdown() {
        let (proto, _log) = recording_prototype();
        let interceptor = Interceptor::new(proto);
        let mut dashboard = Dashboard::start(interceptor.clone(), 10)
            .unwrap()
            .with_logging(RequestLogger::default());
        assert!(interceptor.is_wired());
        assert_eq!(interceptor.request_callback_count(), 1);

        let xhr = dashboard.new_request();
        xhr.open("GET", "https://example.com/api/status").unwrap();
        xhr.send(SendArgs::empty()).unwrap();
        xhr.set_ready_state(ReadyState::Done).unwrap();

        let record = dashboard.next_record().await.unwrap();
        assert_eq!(record.url.as_deref(), Some("https://example.com/api/status"));
        assert_eq!(dashboard.traffic().len(), 1);

        dashboard.shutdown().unwrap();
        assert_eq!(interceptor.response_callback_count(), 0);
        assert_eq!(interceptor.request_callback_count(), 0);
        assert!(interceptor.is_wired());
    }

    #[tokio::test]
    async fn test_taken_records_receiver() {
        let (proto, _log) = recording_prototype();
        let mut dashboard = Dashboard::start(Interceptor::new(proto), 10).unwrap();
        let mut records = dashboard.take_records().unwrap();
        assert!(dashboard.take_records().is_none());
        assert!(dashboard.next_record().await.is_none());

        let xhr = dashboard.new_request();
        xhr.open("POST", "https://example.com/api/items").unwrap();
        xhr.send(SendArgs::with_body("{}")).unwrap();
        xhr.fail("connection reset").unwrap();

        let record = records.recv().await.unwrap();
        assert_eq!(record.method.as_deref(), Some("POST"));
        assert_eq!(record.status, 0);
    }

    #[test]
    fn test_global_interceptor() {
        let interceptor = global();
        interceptor.wire().unwrap();
        assert!(global().is_wired());
        assert!(global().hooks_installed());
        global().unwire().unwrap();
        assert!(!interceptor.is_wired());
    }
}
