// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable clock so polling delays are testable.

use std::time::Duration;

use async_trait::async_trait;

/// Sleep abstraction used by the polling loop. Production code uses
/// [`TokioClock`]; tests inject a clock that returns immediately.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Suspends the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
