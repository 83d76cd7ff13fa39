// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::time::Duration;

use tokio::time::Instant;

/// A single cancellable deadline.
///
/// Arming replaces whatever deadline was pending, so there is never more than
/// one outstanding. Cancelling a disarmed timer does nothing.
#[derive(Debug)]
pub struct LivenessTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl LivenessTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Starts a fresh window from now.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Completes once the armed deadline passes. Never completes while
    /// disarmed.
    ///
    /// The timer stays armed afterwards; the owner decides whether expiry
    /// cancels it.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
