// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interceptor configuration

use serde::{Deserialize, Serialize};

/// Which slots `unwire()` puts back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnwirePolicy {
    /// Restore both the real `open` and the real `send`
    #[default]
    RestoreBoth,
    /// Restore only `send`; the `open` hook keeps annotating requests
    SendOnly,
}

/// Interceptor behaviour switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorConfig {
    pub unwire_policy: UnwirePolicy,
    /// Fire response observers at most once per open/send cycle, even if
    /// the host signals the completed state repeatedly
    pub deduplicate_completion: bool,
    /// Log observer failures and keep going instead of aborting the
    /// dispatch (and, for request observers, the transmission)
    pub isolate_observer_failures: bool,
}

impl InterceptorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set unwire policy
    pub fn unwire_policy(mut self, policy: UnwirePolicy) -> Self {
        self.unwire_policy = policy;
        self
    }

    /// Latch response notifications per request
    pub fn deduplicate_completion(mut self, dedupe: bool) -> Self {
        self.deduplicate_completion = dedupe;
        self
    }

    /// Isolate observer failures
    pub fn isolate_observer_failures(mut self, isolate: bool) -> Self {
        self.isolate_observer_failures = isolate;
        self
    }

    /// Hardened variant: completion latch and isolated observers
    pub fn hardened() -> Self {
        Self {
            deduplicate_completion: true,
            isolate_observer_failures: true,
            ..Default::default()
        }
    }
}
