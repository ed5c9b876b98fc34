// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Observer traits and the identity-keyed observer list

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::xhr::{same_arc, SendArgs, XhrHandle};

/// Notified right before a request is transmitted
///
/// Returning an error aborts the remaining request observers and the
/// transmission itself, unless the interceptor isolates failures.
pub trait RequestObserver: Send + Sync {
    fn on_request(&self, xhr: &XhrHandle, args: &SendArgs) -> Result<()>;
}

/// Notified each time a request signals the completed ready state
pub trait ResponseObserver: Send + Sync {
    fn on_response(&self, xhr: &XhrHandle) -> Result<()>;
}

impl<F> RequestObserver for F
where
    F: Fn(&XhrHandle, &SendArgs) -> Result<()> + Send + Sync,
{
    fn on_request(&self, xhr: &XhrHandle, args: &SendArgs) -> Result<()> {
        self(xhr, args)
    }
}

impl<F> ResponseObserver for F
where
    F: Fn(&XhrHandle) -> Result<()> + Send + Sync,
{
    fn on_response(&self, xhr: &XhrHandle) -> Result<()> {
        self(xhr)
    }
}

/// Wrap a closure as a shareable request observer
pub fn request_observer<F>(f: F) -> Arc<dyn RequestObserver>
where
    F: Fn(&XhrHandle, &SendArgs) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a shareable response observer
pub fn response_observer<F>(f: F) -> Arc<dyn ResponseObserver>
where
    F: Fn(&XhrHandle) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered observer list
///
/// Duplicates are allowed. Removal matches on `Arc` identity and drops the
/// first matching entry only.
pub struct ObserverList<T: ?Sized> {
    entries: RwLock<Vec<Arc<T>>>,
}

impl<T: ?Sized> Default for ObserverList<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> ObserverList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Arc<T>) {
        self.entries.write().push(observer);
    }

    /// Returns false when the observer is not registered
    pub fn remove(&self, observer: &Arc<T>) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|o| same_arc(o, observer)) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, observer: &Arc<T>) -> bool {
        self.entries.read().iter().any(|o| same_arc(o, observer))
    }

    /// Copy of the current entries; firing iterates this so observers can
    /// add or remove observers without deadlocking
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
