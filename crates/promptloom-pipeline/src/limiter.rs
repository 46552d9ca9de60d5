// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window rate limiter keyed by (window, caller).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use promptloom_core::{PromptloomError, RateDecision, RateLimiter};
use tokio::sync::Mutex;
use tracing::debug;

use crate::limits::{RateWindows, WindowSpec};

struct WindowState {
    opened: Instant,
    count: u32,
}

/// In-process fixed-window limiter.
///
/// Each (window, key) pair gets an independent counter that resets when the
/// window elapses. A denied check reports the remainder of the current
/// window as retry-after. Counters are only ever incremented on admission,
/// so a denied request does not extend its own penalty.
pub struct FixedWindowLimiter {
    specs: HashMap<&'static str, (u32, Duration)>,
    states: Mutex<HashMap<(String, String), WindowState>>,
}

impl FixedWindowLimiter {
    pub fn new(windows: &RateWindows) -> Self {
        Self::with_windows(windows.all().cloned())
    }

    pub fn with_windows(windows: impl IntoIterator<Item = WindowSpec>) -> Self {
        Self {
            specs: windows
                .into_iter()
                .map(|w| (w.name, (w.max_requests, w.window)))
                .collect(),
            states: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn check(&self, limit: &str, key: &str) -> Result<RateDecision, PromptloomError> {
        let (max_requests, window) = *self
            .specs
            .get(limit)
            .ok_or_else(|| PromptloomError::Internal(format!("unknown rate window `{limit}`")))?;

        let now = Instant::now();
        let mut states = self.states.lock().await;
        let state = states
            .entry((limit.to_string(), key.to_string()))
            .or_insert(WindowState {
                opened: now,
                count: 0,
            });

        let elapsed = now.duration_since(state.opened);
        if elapsed >= window {
            state.opened = now;
            state.count = 0;
        }

        if state.count < max_requests {
            state.count += 1;
            return Ok(RateDecision::admit());
        }

        let retry_after = window.saturating_sub(now.duration_since(state.opened));
        debug!(limit, key, ?retry_after, "rate window exhausted");
        Ok(RateDecision::deny(retry_after))
    }
}
