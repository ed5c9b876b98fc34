// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request/response interceptor
//!
//! Hooks the `open` and `send` slots of an [`XhrPrototype`] so that every
//! request made through it is observable without touching call sites:
//!
//! - `open` records the method and URL on the handle, then calls the real
//!   `open` unchanged.
//! - `send` fires the request observers, attaches a completion watcher and
//!   then calls the real `send` with the original arguments.
//! - the watcher fires the response observers whenever the request signals
//!   [`ReadyState::Done`](crate::xhr::ReadyState::Done).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::config::{InterceptorConfig, UnwirePolicy};
use super::observer::{ObserverList, RequestObserver, ResponseObserver};
use crate::error::{Error, ObserverKind, Result};
use crate::xhr::{
    listener, same_arc, OpenFn, ReadyState, SendArgs, SendFn, XhrHandle, XhrPrototype,
};

/// Observer lists plus the switches the hooks consult at call time
struct Registry {
    request_observers: ObserverList<dyn RequestObserver>,
    response_observers: ObserverList<dyn ResponseObserver>,
    config: InterceptorConfig,
}

impl Registry {
    fn fire_request(&self, xhr: &XhrHandle, args: &SendArgs) -> Result<()> {
        for observer in self.request_observers.snapshot() {
            if let Err(e) = observer.on_request(xhr, args) {
                self.observer_failed(ObserverKind::Request, xhr, e)?;
            }
        }
        Ok(())
    }

    fn fire_response(&self, xhr: &XhrHandle) -> Result<()> {
        for observer in self.response_observers.snapshot() {
            if let Err(e) = observer.on_response(xhr) {
                self.observer_failed(ObserverKind::Response, xhr, e)?;
            }
        }
        Ok(())
    }

    fn observer_failed(&self, kind: ObserverKind, xhr: &XhrHandle, error: Error) -> Result<()> {
        if self.config.isolate_observer_failures {
            tracing::warn!(id = xhr.id(), %kind, error = %error, "Observer failed");
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Runs on every readiness signal of a watched request
    fn check_completion(&self, xhr: &XhrHandle, fired: &AtomicBool) -> Result<()> {
        match xhr.ready_state() {
            ReadyState::Done => {}
            // A reopened request starts a new completion cycle
            ReadyState::Opened => {
                fired.store(false, Ordering::SeqCst);
                return Ok(());
            }
            _ => return Ok(()),
        }
        if self.config.deduplicate_completion && fired.swap(true, Ordering::SeqCst) {
            tracing::trace!(id = xhr.id(), "Duplicate completion signal ignored");
            return Ok(());
        }
        self.fire_response(xhr)
    }

    /// Key under which this registry's watcher is stored on a handle.
    /// The watcher holds the registry, so the key cannot be reused while
    /// the entry exists.
    fn watcher_key(self: &Arc<Self>) -> usize {
        Arc::as_ptr(self) as usize
    }

    /// Attach at most one watcher per request, however often it is sent
    fn attach_completion_watcher(self: &Arc<Self>, xhr: &XhrHandle) -> Result<()> {
        let key = self.watcher_key();
        let installed = xhr.watcher(key);

        if xhr.supports_event_listeners() {
            if installed.is_some() {
                tracing::trace!(id = xhr.id(), "Request already watched");
                return Ok(());
            }
            let registry = self.clone();
            let fired = AtomicBool::new(false);
            let watcher = listener(move |xhr| registry.check_completion(xhr, &fired));
            xhr.add_event_listener(watcher.clone())?;
            xhr.set_watcher(key, watcher);
            return Ok(());
        }

        // Legacy hosts: chain in front of an existing handler. Requests
        // without a handler get no watcher at all.
        let original = match xhr.onreadystatechange() {
            Some(original) => original,
            None => {
                tracing::trace!(id = xhr.id(), "No readystatechange handler to wrap");
                return Ok(());
            }
        };
        if installed.map_or(false, |watcher| same_arc(&watcher, &original)) {
            tracing::trace!(id = xhr.id(), "Request already watched");
            return Ok(());
        }

        let registry = self.clone();
        let fired = AtomicBool::new(false);
        let watcher = listener(move |xhr| {
            registry.check_completion(xhr, &fired)?;
            original(xhr)
        });
        xhr.set_onreadystatechange(Some(watcher.clone()));
        xhr.set_watcher(key, watcher);
        Ok(())
    }
}

/// Wrappers currently installed in the prototype
struct Hooks {
    open: OpenFn,
    send: SendFn,
}

struct InterceptorInner {
    prototype: XhrPrototype,
    real_open: OpenFn,
    real_send: SendFn,
    registry: Arc<Registry>,
    hooks: RwLock<Option<Hooks>>,
}

/// Interception registry for one request prototype
///
/// Cheap to clone; clones share state. Starts unwired.
#[derive(Clone)]
pub struct Interceptor {
    inner: Arc<InterceptorInner>,
}

impl Interceptor {
    /// Create an interceptor with the default configuration
    pub fn new(prototype: XhrPrototype) -> Self {
        Self::with_config(prototype, InterceptorConfig::default())
    }

    /// Create an interceptor; the prototype's current slots are saved as
    /// the real implementations
    pub fn with_config(prototype: XhrPrototype, config: InterceptorConfig) -> Self {
        let real_open = prototype.open_slot();
        let real_send = prototype.send_slot();

        Self {
            inner: Arc::new(InterceptorInner {
                prototype,
                real_open,
                real_send,
                registry: Arc::new(Registry {
                    request_observers: ObserverList::new(),
                    response_observers: ObserverList::new(),
                    config,
                }),
                hooks: RwLock::new(None),
            }),
        }
    }

    pub fn prototype(&self) -> &XhrPrototype {
        &self.inner.prototype
    }

    pub fn config(&self) -> &InterceptorConfig {
        &self.inner.registry.config
    }

    /// Install the hooks
    pub fn wire(&self) -> Result<()> {
        let mut hooks = self.inner.hooks.write();
        if hooks.is_some() {
            return Err(Error::AlreadyWired);
        }

        let real_open = self.inner.real_open.clone();
        let open: OpenFn = Arc::new(move |xhr: &XhrHandle, method: &str, url: &str| {
            xhr.annotate(method, url);
            real_open(xhr, method, url)
        });

        let registry = self.inner.registry.clone();
        let real_send = self.inner.real_send.clone();
        let send: SendFn = Arc::new(move |xhr: &XhrHandle, args: SendArgs| {
            registry.fire_request(xhr, &args)?;
            registry.attach_completion_watcher(xhr)?;
            real_send(xhr, args)
        });

        self.inner.prototype.replace_open(open.clone());
        self.inner.prototype.replace_send(send.clone());
        *hooks = Some(Hooks { open, send });

        tracing::debug!("Ajax interceptor wired");
        Ok(())
    }

    /// Restore the real implementations
    ///
    /// Requests already sent keep their completion watchers and still
    /// notify response observers.
    pub fn unwire(&self) -> Result<()> {
        let mut hooks = self.inner.hooks.write();
        if hooks.is_none() {
            return Err(Error::NotWired);
        }

        self.inner.prototype.replace_send(self.inner.real_send.clone());
        if self.config().unwire_policy == UnwirePolicy::RestoreBoth {
            self.inner.prototype.replace_open(self.inner.real_open.clone());
        }
        *hooks = None;

        tracing::debug!(policy = ?self.config().unwire_policy, "Ajax interceptor unwired");
        Ok(())
    }

    pub fn is_wired(&self) -> bool {
        self.inner.hooks.read().is_some()
    }

    /// Whether both prototype slots currently hold this interceptor's
    /// wrappers
    pub fn hooks_installed(&self) -> bool {
        match *self.inner.hooks.read() {
            Some(ref hooks) => {
                same_arc(&hooks.open, &self.inner.prototype.open_slot())
                    && same_arc(&hooks.send, &self.inner.prototype.send_slot())
            }
            None => false,
        }
    }

    /// Register a request observer; adding the same observer twice makes
    /// it fire twice
    pub fn add_request_callback(&self, observer: Arc<dyn RequestObserver>) {
        self.inner.registry.request_observers.add(observer);
        tracing::trace!(
            count = self.request_callback_count(),
            "Request observer added"
        );
    }

    /// Remove the first registration of `observer`
    pub fn remove_request_callback(&self, observer: &Arc<dyn RequestObserver>) -> Result<()> {
        if self.inner.registry.request_observers.remove(observer) {
            Ok(())
        } else {
            Err(Error::observer_not_found(ObserverKind::Request))
        }
    }

    /// Register a response observer; adding the same observer twice makes
    /// it fire twice
    pub fn add_response_callback(&self, observer: Arc<dyn ResponseObserver>) {
        self.inner.registry.response_observers.add(observer);
        tracing::trace!(
            count = self.response_callback_count(),
            "Response observer added"
        );
    }

    /// Remove the first registration of `observer`
    pub fn remove_response_callback(&self, observer: &Arc<dyn ResponseObserver>) -> Result<()> {
        if self.inner.registry.response_observers.remove(observer) {
            Ok(())
        } else {
            Err(Error::observer_not_found(ObserverKind::Response))
        }
    }

    pub fn request_callback_count(&self) -> usize {
        self.inner.registry.request_observers.len()
    }

    pub fn response_callback_count(&self) -> usize {
        self.inner.registry.response_observers.len()
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("wired", &self.is_wired())
            .field("request_callbacks", &self.request_callback_count())
            .field("response_callbacks", &self.response_callback_count())
            .field("config", self.config())
            .finish()
    }
}
