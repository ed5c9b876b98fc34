// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Traffic interception
//!
//! The [`Interceptor`] hooks a request prototype and notifies registered
//! observers before each transmission and on each completion.

mod config;
mod event;
mod interceptor;
mod observer;

pub use config::{InterceptorConfig, UnwirePolicy};
pub use event::{RecordSender, RequestLogger, ResponseRecord, TrafficLog};
pub use interceptor::Interceptor;
pub use observer::{
    request_observer, response_observer, ObserverList, RequestObserver, ResponseObserver,
};
