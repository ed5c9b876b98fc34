// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client layer
//!
//! The real network side of an intercepted request. Transports translate
//! the state of a request handle into a [`Request`] and feed the resulting
//! [`Response`] back into the handle.

mod client;
mod request;
mod response;

pub use client::{HttpClient, HttpClientConfig};
pub use request::Request;
pub use response::Response;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("ajax-intercept/", env!("CARGO_PKG_VERSION"));
