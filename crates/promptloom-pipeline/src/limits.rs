// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named rate-limit windows for the generation endpoint.

use std::time::Duration;

use promptloom_core::RequestOrigin;

/// Per-minute window for anonymous callers.
pub const GUEST_MINUTE_WINDOW: &str = "generate-guest-minute";
/// Per-hour window for anonymous callers.
pub const GUEST_HOUR_WINDOW: &str = "generate-guest-hour";
/// Per-minute window for signed-in accounts.
pub const USER_MINUTE_WINDOW: &str = "generate-user-minute";
/// Per-hour window for signed-in accounts.
pub const USER_HOUR_WINDOW: &str = "generate-user-hour";

/// One named fixed window: at most `max_requests` per `window` per key.
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub name: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

/// The four generation windows, grouped by request origin. Both windows for
/// an origin must admit a request before it proceeds.
#[derive(Debug, Clone)]
pub struct RateWindows {
    guest: [WindowSpec; 2],
    user: [WindowSpec; 2],
}

impl RateWindows {
    pub fn new(
        guest_per_minute: u32,
        guest_per_hour: u32,
        user_per_minute: u32,
        user_per_hour: u32,
    ) -> Self {
        let minute = Duration::from_secs(60);
        let hour = Duration::from_secs(3600);
        Self {
            guest: [
                WindowSpec {
                    name: GUEST_MINUTE_WINDOW,
                    max_requests: guest_per_minute,
                    window: minute,
                },
                WindowSpec {
                    name: GUEST_HOUR_WINDOW,
                    max_requests: guest_per_hour,
                    window: hour,
                },
            ],
            user: [
                WindowSpec {
                    name: USER_MINUTE_WINDOW,
                    max_requests: user_per_minute,
                    window: minute,
                },
                WindowSpec {
                    name: USER_HOUR_WINDOW,
                    max_requests: user_per_hour,
                    window: hour,
                },
            ],
        }
    }

    /// The windows checked for a request of the given origin, tightest first.
    pub fn for_origin(&self, origin: RequestOrigin) -> &[WindowSpec] {
        match origin {
            RequestOrigin::Guest => &self.guest,
            RequestOrigin::Authenticated => &self.user,
        }
    }

    /// All four windows, for seeding a limiter.
    pub fn all(&self) -> impl Iterator<Item = &WindowSpec> {
        self.guest.iter().chain(self.user.iter())
    }
}

impl Default for RateWindows {
    fn default() -> Self {
        Self::new(1, 10, 5, 60)
    }
}
