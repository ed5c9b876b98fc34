// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # ajax-intercept - Transparent XHR traffic interception
//!
//! Hooks the `open` and `send` entry points of an XHR-style request
//! prototype so that every asynchronous HTTP request is observable without
//! changing call sites. Request observers run right before transmission,
//! response observers whenever a request reaches the completed ready state.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ajax_intercept::{
//!     response_observer, HttpClient, HttpTransport, Interceptor, SendArgs, XhrPrototype,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(HttpClient::new()?);
//!     let prototype = XhrPrototype::new(Arc::new(transport));
//!
//!     let interceptor = Interceptor::new(prototype.clone());
//!     interceptor.add_response_callback(response_observer(|xhr| {
//!         println!("{:?} {:?} -> {}", xhr.method(), xhr.url(), xhr.status());
//!         Ok(())
//!     }));
//!     interceptor.wire()?;
//!
//!     let xhr = prototype.new_request();
//!     xhr.open("GET", "https://example.com/api/status")?;
//!     xhr.send(SendArgs::empty())?;
//!     xhr.completed().await;
//!
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod error;
pub mod http;
pub mod network;
pub mod xhr;

// Bootstrap
pub use bootstrap::{global, Dashboard, DashboardConfig, HttpSettings};

// Errors
pub use error::{Error, ErrorContext, ObserverKind, Result};

// HTTP
pub use http::{HttpClient, HttpClientConfig, Request, Response};

// Interception
pub use network::{
    request_observer, response_observer, Interceptor, InterceptorConfig, ObserverList,
    RecordSender, RequestLogger, RequestObserver, ResponseObserver, ResponseRecord, TrafficLog,
    UnwirePolicy,
};

// Request object
pub use xhr::{
    listener, HttpTransport, OpenFn, ReadyState, ReadyStateListener, SendArgs, SendFn,
    XhrHandle, XhrPrototype, XhrTransport, COMPLETED_READY_STATE,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
