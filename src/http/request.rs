// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Outgoing HTTP request

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use url::Url;

use crate::error::{Error, Result};

/// HTTP request representation
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
}

impl Request {
    /// Create a request with an already parsed method and URL
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parse a method and URL the way `open()` receives them
    pub fn parse(method: &str, url: &str) -> Result<Self> {
        let method = parse_method(method)?;
        Ok(Self::new(method, Url::parse(url)?))
    }
}

/// Parse an HTTP method token. Well-known methods are case-insensitive,
/// extension methods are kept verbatim.
pub(crate) fn parse_method(method: &str) -> Result<Method> {
    let upper = method.to_ascii_uppercase();
    let candidate = match upper.as_str() {
        "GET" | "POST" | "PUT" | "DELETE" | "HEAD" | "OPTIONS" | "PATCH" | "TRACE"
        | "CONNECT" => upper.as_str(),
        _ => method,
    };
    Method::from_bytes(candidate.as_bytes()).map_err(|_| Error::Method(method.to_string()))
}
