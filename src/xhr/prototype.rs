// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Replaceable `open` / `send` slots shared by every request handle

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use super::handle::XhrHandle;
use super::transport::XhrTransport;
use crate::error::Result;

/// Implementation stored in the `open` slot: `(request, method, url)`
pub type OpenFn = Arc<dyn Fn(&XhrHandle, &str, &str) -> Result<()> + Send + Sync>;

/// Implementation stored in the `send` slot
pub type SendFn = Arc<dyn Fn(&XhrHandle, SendArgs) -> Result<()> + Send + Sync>;

/// Arguments of a `send()` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendArgs {
    pub body: Option<Bytes>,
}

impl SendArgs {
    /// `send()` without a body
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_body(body: impl Into<Bytes>) -> Self {
        Self {
            body: Some(body.into()),
        }
    }

    /// Body decoded as UTF-8, lossy
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

struct PrototypeInner {
    open: RwLock<OpenFn>,
    send: RwLock<SendFn>,
    /// Host implements `addEventListener` on request objects
    event_listeners: bool,
    next_id: AtomicU64,
}

/// The host's request prototype
///
/// Handles resolve `open` and `send` through this object on every call,
/// so swapping a slot affects requests that already exist as well as new
/// ones.
#[derive(Clone)]
pub struct XhrPrototype {
    inner: Arc<PrototypeInner>,
}

impl XhrPrototype {
    /// Prototype for a host with event listener support
    pub fn new(transport: Arc<dyn XhrTransport>) -> Self {
        Self::build(transport, true)
    }

    /// Prototype for a legacy host that only offers `onreadystatechange`
    pub fn without_event_listeners(transport: Arc<dyn XhrTransport>) -> Self {
        Self::build(transport, false)
    }

    fn build(transport: Arc<dyn XhrTransport>, event_listeners: bool) -> Self {
        let opener = transport.clone();
        let open: OpenFn = Arc::new(move |xhr: &XhrHandle, method: &str, url: &str| {
            opener.open(xhr, method, url)
        });
        let send: SendFn =
            Arc::new(move |xhr: &XhrHandle, args: SendArgs| transport.send(xhr, args));

        Self {
            inner: Arc::new(PrototypeInner {
                open: RwLock::new(open),
                send: RwLock::new(send),
                event_listeners,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Create a request bound to this prototype
    pub fn new_request(&self) -> XhrHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        XhrHandle::new(id, self.clone())
    }

    /// Current `open` implementation
    pub fn open_slot(&self) -> OpenFn {
        self.inner.open.read().clone()
    }

    /// Current `send` implementation
    pub fn send_slot(&self) -> SendFn {
        self.inner.send.read().clone()
    }

    /// Install a new `open` implementation, returning the previous one
    pub fn replace_open(&self, open: OpenFn) -> OpenFn {
        std::mem::replace(&mut *self.inner.open.write(), open)
    }

    /// Install a new `send` implementation, returning the previous one
    pub fn replace_send(&self, send: SendFn) -> SendFn {
        std::mem::replace(&mut *self.inner.send.write(), send)
    }

    pub fn supports_event_listeners(&self) -> bool {
        self.inner.event_listeners
    }

    /// Number of requests created so far
    pub fn request_count(&self) -> u64 {
        self.inner.next_id.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for XhrPrototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XhrPrototype")
            .field("event_listeners", &self.inner.event_listeners)
            .field("requests", &self.request_count())
            .finish()
    }
}

/// Pointer identity of two shared values, ignoring vtables
pub(crate) fn same_arc<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
