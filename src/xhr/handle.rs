// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Live request handle

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use url::Url;

use super::prototype::{SendArgs, XhrPrototype};
use crate::error::{Error, Result};
use crate::http::{Request, Response};

/// Request lifecycle stage, numbered as in the classic XHR model
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ReadyState {
    /// Created, `open()` not called yet
    #[default]
    Unsent = 0,
    /// `open()` succeeded
    Opened = 1,
    /// Status line and headers received
    HeadersReceived = 2,
    /// Body is downloading
    Loading = 3,
    /// Request finished, successfully or not
    Done = 4,
}

impl ReadyState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_done(self) -> bool {
        self == ReadyState::Done
    }
}

impl From<ReadyState> for u8 {
    fn from(state: ReadyState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for ReadyState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ReadyState::Unsent),
            1 => Ok(ReadyState::Opened),
            2 => Ok(ReadyState::HeadersReceived),
            3 => Ok(ReadyState::Loading),
            4 => Ok(ReadyState::Done),
            other => Err(Error::other(format!("invalid ready state {}", other))),
        }
    }
}

/// `readystatechange` listener or `onreadystatechange` handler
pub type ReadyStateListener = Arc<dyn Fn(&XhrHandle) -> Result<()> + Send + Sync>;

/// Wrap a closure as a [`ReadyStateListener`]
pub fn listener<F>(f: F) -> ReadyStateListener
where
    F: Fn(&XhrHandle) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Debug, Default)]
struct RequestState {
    ready_state: ReadyState,
    /// Parsed method and URL from the real `open()`
    target: Option<(Method, Url)>,
    request_headers: HeaderMap,
    send_flag: bool,
    /// Annotation written by the interceptor's `open` hook
    method: Option<String>,
    /// Annotation written by the interceptor's `open` hook
    url: Option<String>,
    status: u16,
    status_text: String,
    response_headers: HeaderMap,
    response_url: Option<Url>,
    response: Bytes,
    response_time_ms: u64,
    error: Option<String>,
}

struct XhrInner {
    id: u64,
    prototype: XhrPrototype,
    state: RwLock<RequestState>,
    listeners: RwLock<Vec<ReadyStateListener>>,
    onreadystatechange: RwLock<Option<ReadyStateListener>>,
    /// Completion watchers installed by interceptors, keyed by registry
    watchers: RwLock<Vec<(usize, ReadyStateListener)>>,
    changed: Notify,
}

/// Handle to one asynchronous HTTP request
///
/// Clones share the request; equality is identity.
#[derive(Clone)]
pub struct XhrHandle {
    inner: Arc<XhrInner>,
}

impl XhrHandle {
    pub(crate) fn new(id: u64, prototype: XhrPrototype) -> Self {
        Self {
            inner: Arc::new(XhrInner {
                id,
                prototype,
                state: RwLock::new(RequestState::default()),
                listeners: RwLock::new(Vec::new()),
                onreadystatechange: RwLock::new(None),
                watchers: RwLock::new(Vec::new()),
                changed: Notify::new(),
            }),
        }
    }

    /// Per-prototype request number
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn prototype(&self) -> &XhrPrototype {
        &self.inner.prototype
    }

    /// Call whatever currently sits in the prototype's `open` slot
    pub fn open(&self, method: &str, url: &str) -> Result<()> {
        let open = self.inner.prototype.open_slot();
        open(self, method, url)
    }

    /// Call whatever currently sits in the prototype's `send` slot
    pub fn send(&self, args: SendArgs) -> Result<()> {
        let send = self.inner.prototype.send_slot();
        send(self, args)
    }

    /// Set a request header between `open()` and `send()`
    pub fn set_request_header(&self, name: &str, value: &str) -> Result<()> {
        let mut state = self.inner.state.write();
        if state.ready_state != ReadyState::Opened || state.send_flag {
            return Err(Error::invalid_state(
                "setRequestHeader",
                "an opened, unsent request",
                state.ready_state,
            ));
        }
        let name = HeaderName::try_from(name)
            .map_err(|e| Error::other(format!("invalid header name {:?}: {}", name, e)))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| Error::other(format!("invalid value for header {}: {}", name, e)))?;
        state.request_headers.append(name, value);
        Ok(())
    }

    pub fn ready_state(&self) -> ReadyState {
        self.inner.state.read().ready_state
    }

    /// Method captured by the interceptor at open time
    pub fn method(&self) -> Option<String> {
        self.inner.state.read().method.clone()
    }

    /// URL captured by the interceptor at open time
    pub fn url(&self) -> Option<String> {
        self.inner.state.read().url.clone()
    }

    pub(crate) fn annotate(&self, method: &str, url: &str) {
        let mut state = self.inner.state.write();
        state.method = Some(method.to_string());
        state.url = Some(url.to_string());
    }

    pub fn is_sent(&self) -> bool {
        self.inner.state.read().send_flag
    }

    /// HTTP status, 0 until headers arrive or after a network error
    pub fn status(&self) -> u16 {
        self.inner.state.read().status
    }

    pub fn status_text(&self) -> String {
        self.inner.state.read().status_text.clone()
    }

    pub fn response_bytes(&self) -> Bytes {
        self.inner.state.read().response.clone()
    }

    pub fn response_text(&self) -> String {
        String::from_utf8_lossy(&self.inner.state.read().response).into_owned()
    }

    pub fn response_header(&self, name: &str) -> Option<String> {
        self.inner
            .state
            .read()
            .response_headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    /// Final URL after redirects
    pub fn response_url(&self) -> Option<Url> {
        self.inner.state.read().response_url.clone()
    }

    /// Time from transmission to the full response body, 0 if none
    pub fn response_time_ms(&self) -> u64 {
        self.inner.state.read().response_time_ms
    }

    /// Network error recorded by the transport
    pub fn error(&self) -> Option<String> {
        self.inner.state.read().error.clone()
    }

    pub fn supports_event_listeners(&self) -> bool {
        self.inner.prototype.supports_event_listeners()
    }

    /// Register a `readystatechange` listener
    pub fn add_event_listener(&self, listener: ReadyStateListener) -> Result<()> {
        if !self.supports_event_listeners() {
            return Err(Error::Unsupported("addEventListener".to_string()));
        }
        self.inner.listeners.write().push(listener);
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    pub fn onreadystatechange(&self) -> Option<ReadyStateListener> {
        self.inner.onreadystatechange.read().clone()
    }

    pub fn set_onreadystatechange(&self, handler: Option<ReadyStateListener>) {
        *self.inner.onreadystatechange.write() = handler;
    }

    pub(crate) fn watcher(&self, key: usize) -> Option<ReadyStateListener> {
        self.inner
            .watchers
            .read()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, watcher)| watcher.clone())
    }

    pub(crate) fn set_watcher(&self, key: usize, watcher: ReadyStateListener) {
        let mut watchers = self.inner.watchers.write();
        match watchers.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = watcher,
            None => watchers.push((key, watcher)),
        }
    }

    /// Record a new ready state and dispatch `readystatechange`
    ///
    /// Listeners run in registration order, then the handler. The first
    /// failure stops the dispatch and is returned.
    pub fn set_ready_state(&self, ready_state: ReadyState) -> Result<()> {
        self.inner.state.write().ready_state = ready_state;
        let result = self.dispatch_ready_state_change();
        self.inner.changed.notify_waiters();
        result
    }

    fn dispatch_ready_state_change(&self) -> Result<()> {
        // Snapshot so listeners may register further listeners
        let listeners = self.inner.listeners.read().clone();
        for listener in &listeners {
            listener(self)?;
        }

        let handler = self.inner.onreadystatechange.read().clone();
        if let Some(handler) = handler {
            handler(self)?;
        }
        Ok(())
    }

    /// Real `open()` behaviour shared by transports
    pub fn begin_open(&self, method: &str, url: &str) -> Result<()> {
        let request = Request::parse(method, url)?;
        {
            let mut state = self.inner.state.write();
            state.target = Some((request.method, request.url));
            state.request_headers.clear();
            state.send_flag = false;
            state.status = 0;
            state.status_text.clear();
            state.response_headers.clear();
            state.response_url = None;
            state.response = Bytes::new();
            state.response_time_ms = 0;
            state.error = None;
        }
        self.set_ready_state(ReadyState::Opened)
    }

    /// Real `send()` precondition shared by transports; returns the
    /// request to put on the wire
    pub fn mark_sent(&self, args: &SendArgs) -> Result<Request> {
        let mut state = self.inner.state.write();
        if state.ready_state != ReadyState::Opened || state.send_flag {
            return Err(Error::invalid_state(
                "send",
                "an opened, unsent request",
                state.ready_state,
            ));
        }
        let (method, url) = state
            .target
            .clone()
            .ok_or_else(|| Error::invalid_state("send", "a request target", "none"))?;
        state.send_flag = true;

        let mut request = Request::new(method, url);
        request.headers = state.request_headers.clone();
        // GET and HEAD never carry a body
        if request.method != Method::GET && request.method != Method::HEAD {
            request.body = args.body.clone();
        }
        Ok(request)
    }

    /// Feed a finished response into the handle, walking through the
    /// remaining ready states
    pub fn complete(&self, response: Response) -> Result<()> {
        {
            let mut state = self.inner.state.write();
            state.status = response.status.as_u16();
            state.status_text = response.status_text().to_string();
            state.response_headers = response.headers.clone();
            state.response_url = Some(response.url.clone());
            state.response_time_ms = response.response_time_ms;
        }
        self.set_ready_state(ReadyState::HeadersReceived)?;

        self.inner.state.write().response = response.body;
        self.set_ready_state(ReadyState::Loading)?;
        self.set_ready_state(ReadyState::Done)
    }

    /// Record a network failure and finish the request
    pub fn fail(&self, reason: impl Into<String>) -> Result<()> {
        {
            let mut state = self.inner.state.write();
            state.status = 0;
            state.status_text.clear();
            state.response = Bytes::new();
            state.error = Some(reason.into());
        }
        self.set_ready_state(ReadyState::Done)
    }

    /// Resolves once the request reaches [`ReadyState::Done`]
    pub async fn completed(&self) {
        loop {
            let notified = self.inner.changed.notified();
            if self.ready_state().is_done() {
                return;
            }
            notified.await;
        }
    }
}

impl PartialEq for XhrHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for XhrHandle {}

impl fmt::Debug for XhrHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("XhrHandle")
            .field("id", &self.inner.id)
            .field("ready_state", &state.ready_state)
            .field("method", &state.method)
            .field("url", &state.url)
            .field("status", &state.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use reqwest::StatusCode;

    use super::*;
    use crate::xhr::testing::{legacy_prototype, recording_prototype};

    fn ok_response(body: &'static str) -> Response {
        Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from(body),
            Url::parse("https://example.com/api").unwrap(),
            5,
        )
    }

    #[test]
    fn test_ready_state_numbers() {
        assert_eq!(ReadyState::Done.as_u8(), 4);
        assert_eq!(ReadyState::try_from(2).unwrap(), ReadyState::HeadersReceived);
        assert!(ReadyState::try_from(5).is_err());
        assert_eq!(crate::xhr::COMPLETED_READY_STATE, 4);
    }

    #[test]
    fn test_open_send_lifecycle() {
        let (proto, log) = recording_prototype();
        let xhr = proto.new_request();
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);

        xhr.open("GET", "https://example.com/api").unwrap();
        assert_eq!(xhr.ready_state(), ReadyState::Opened);
        xhr.set_request_header("accept", "application/json").unwrap();

        xhr.send(SendArgs::empty()).unwrap();
        assert!(xhr.is_sent());
        assert_eq!(*log.lock(), vec!["open GET https://example.com/api", "send "]);

        // Annotations belong to the interceptor, plain open leaves them empty
        assert_eq!(xhr.method(), None);
        assert_eq!(xhr.url(), None);
    }

    #[test]
    fn test_send_out_of_order() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        assert!(matches!(
            xhr.send(SendArgs::empty()),
            Err(Error::InvalidState { operation: "send", .. })
        ));

        xhr.open("POST", "https://example.com/api").unwrap();
        xhr.send(SendArgs::with_body("{}")).unwrap();
        assert!(matches!(
            xhr.send(SendArgs::empty()),
            Err(Error::InvalidState { .. })
        ));
        assert!(xhr.set_request_header("x-late", "1").is_err());
    }

    #[test]
    fn test_get_drops_body() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        xhr.begin_open("GET", "https://example.com").unwrap();
        let request = xhr.mark_sent(&SendArgs::with_body("ignored")).unwrap();
        assert!(request.body.is_none());

        let xhr = proto.new_request();
        xhr.begin_open("PUT", "https://example.com").unwrap();
        let request = xhr.mark_sent(&SendArgs::with_body("kept")).unwrap();
        assert_eq!(request.body.as_deref(), Some(&b"kept"[..]));
    }

    #[test]
    fn test_dispatch_order_listeners_then_handler() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let seen = seen.clone();
            xhr.add_event_listener(listener(move |x| {
                seen.lock().push(format!("{}:{}", name, x.ready_state().as_u8()));
                Ok(())
            }))
            .unwrap();
        }
        let handler_seen = seen.clone();
        xhr.set_onreadystatechange(Some(listener(move |x| {
            handler_seen.lock().push(format!("handler:{}", x.ready_state().as_u8()));
            Ok(())
        })));

        xhr.set_ready_state(ReadyState::Done).unwrap();
        assert_eq!(*seen.lock(), vec!["first:4", "second:4", "handler:4"]);
    }

    #[test]
    fn test_dispatch_fails_fast() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        let reached = Arc::new(Mutex::new(false));

        xhr.add_event_listener(listener(|_| Err(Error::observer("broken"))))
            .unwrap();
        let flag = reached.clone();
        xhr.add_event_listener(listener(move |_| {
            *flag.lock() = true;
            Ok(())
        }))
        .unwrap();

        assert!(xhr.set_ready_state(ReadyState::Loading).is_err());
        assert!(!*reached.lock());
        assert_eq!(xhr.ready_state(), ReadyState::Loading);
    }

    #[test]
    fn test_legacy_host_rejects_listeners() {
        let (proto, _log) = legacy_prototype();
        let xhr = proto.new_request();
        assert!(matches!(
            xhr.add_event_listener(listener(|_| Ok(()))),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_complete_walks_states() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        xhr.open("GET", "https://example.com/api").unwrap();
        let states = Arc::new(Mutex::new(Vec::new()));
        let recorded = states.clone();
        xhr.add_event_listener(listener(move |x| {
            recorded.lock().push(x.ready_state().as_u8());
            Ok(())
        }))
        .unwrap();

        xhr.send(SendArgs::empty()).unwrap();
        xhr.complete(ok_response("{\"ok\":true}")).unwrap();

        assert_eq!(*states.lock(), vec![2, 3, 4]);
        assert_eq!(xhr.status(), 200);
        assert_eq!(xhr.status_text(), "OK");
        assert_eq!(xhr.response_text(), "{\"ok\":true}");
        assert_eq!(xhr.response_time_ms(), 5);

        // Reopening clears the previous exchange
        xhr.open("GET", "https://example.com/api").unwrap();
        assert_eq!(xhr.status(), 0);
        assert_eq!(xhr.response_time_ms(), 0);
    }

    #[test]
    fn test_fail_records_error() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        xhr.open("GET", "https://example.com/api").unwrap();
        xhr.send(SendArgs::empty()).unwrap();
        xhr.fail("connection refused").unwrap();
        assert_eq!(xhr.ready_state(), ReadyState::Done);
        assert_eq!(xhr.status(), 0);
        assert_eq!(xhr.error().as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_handle_identity() {
        let (proto, _log) = recording_prototype();
        let a = proto.new_request();
        let b = proto.new_request();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_completed_resolves_on_done() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        xhr.open("GET", "https://example.com/api").unwrap();
        xhr.send(SendArgs::empty()).unwrap();

        let driver = xhr.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            driver.complete(ok_response("done")).unwrap();
        });

        tokio::time::timeout(Duration::from_secs(2), xhr.completed())
            .await
            .unwrap();
        assert_eq!(xhr.response_text(), "done");
    }

    #[test]
    fn test_completed_immediately_when_done() {
        let (proto, _log) = recording_prototype();
        let xhr = proto.new_request();
        xhr.set_ready_state(ReadyState::Done).unwrap();
        tokio_test::block_on(xhr.completed());
    }
}
