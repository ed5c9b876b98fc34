// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! XHR-style request object
//!
//! Models the host side of an asynchronous HTTP request: a handle that
//! moves through the classic ready states and a prototype whose `open` and
//! `send` slots every handle looks up at call time. Replacing a slot
//! changes the behaviour of every request created from that prototype,
//! which is what the interceptor relies on.

mod handle;
mod prototype;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use handle::{listener, ReadyState, ReadyStateListener, XhrHandle};
pub use prototype::{OpenFn, SendArgs, SendFn, XhrPrototype};
pub(crate) use prototype::same_arc;
pub use transport::{HttpTransport, XhrTransport};

/// Ready state value of a fully completed request
pub const COMPLETED_READY_STATE: u8 = ReadyState::Done as u8;
