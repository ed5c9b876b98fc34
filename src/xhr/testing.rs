// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport that records calls instead of touching the network

use std::sync::Arc;

use parking_lot::Mutex;

use super::{SendArgs, XhrHandle, XhrPrototype, XhrTransport};
use crate::error::Result;

pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) struct RecordingTransport {
    log: CallLog,
}

impl XhrTransport for RecordingTransport {
    fn open(&self, xhr: &XhrHandle, method: &str, url: &str) -> Result<()> {
        self.log.lock().push(format!("open {} {}", method, url));
        xhr.begin_open(method, url)
    }

    fn send(&self, xhr: &XhrHandle, args: SendArgs) -> Result<()> {
        xhr.mark_sent(&args)?;
        self.log
            .lock()
            .push(format!("send {}", args.body_text().unwrap_or_default()));
        Ok(())
    }
}

/// Prototype whose real `open`/`send` append to the returned log
pub(crate) fn recording_prototype() -> (XhrPrototype, CallLog) {
    let log = CallLog::default();
    let transport = RecordingTransport { log: log.clone() };
    (XhrPrototype::new(Arc::new(transport)), log)
}

/// Same as [`recording_prototype`] for a host without event listeners
pub(crate) fn legacy_prototype() -> (XhrPrototype, CallLog) {
    let log = CallLog::default();
    let transport = RecordingTransport { log: log.clone() };
    (XhrPrototype::without_event_listeners(Arc::new(transport)), log)
}
