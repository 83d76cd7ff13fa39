// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::time::Duration;

use humidity_monitor_model::{decode_frame, ConnectionState, Reading};
use tokio::sync::mpsc;

use crate::ingest::{IngestEvent, LivenessTimer, Notice};
use crate::transport::TransportError;

/// State of one ingestion session, fed one input at a time.
///
/// Owns the connection state and the liveness timer and emits every change
/// as an [`IngestEvent`]. Inputs that make no sense in the current state are
/// ignored.
pub(crate) struct Session {
    state: ConnectionState,
    timer: LivenessTimer,
    events: mpsc::UnboundedSender<IngestEvent>,
    torn_down: bool,
}

impl Session {
    pub fn new(window: Duration, events: mpsc::UnboundedSender<IngestEvent>) -> Self {
        Self {
            state: ConnectionState::Connecting,
            timer: LivenessTimer::new(window),
            events,
            torn_down: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn timer(&self) -> &LivenessTimer {
        &self.timer
    }

    pub fn connecting(&mut self, endpoint: &str) {
        log::info!("Connecting to {endpoint}");
        self.emit(IngestEvent::State(ConnectionState::Connecting));
    }

    pub fn opened(&mut self) {
        if self.state != ConnectionState::Connecting {
            return;
        }

        log::info!("Connected, expecting a frame every {:?}", self.timer.window());
        self.timer.arm();
        self.set_state(ConnectionState::Connected);
    }

    pub fn open_failed(&mut self, error: &TransportError) {
        if self.state != ConnectionState::Connecting {
            return;
        }

        log::warn!("{error}");
        self.disconnect(error.to_string());
    }

    /// Decodes one frame. Malformed frames are logged and dropped.
    pub fn frame(&mut self, frame: &str) -> Option<Reading> {
        if !self.state.is_open() {
            return None;
        }

        let reading = match decode_frame(frame) {
            Ok(reading) => reading,
            Err(e) if e.is_silent() => {
                log::debug!("Dropping frame {frame:?}: {e}");
                return None;
            }
            Err(e) => {
                log::warn!("Dropping frame {frame:?}: {e}");
                return None;
            }
        };

        let flags = reading.range_flags();
        if flags.any() {
            log::warn!("Reading outside the sensor range: {reading:?} ({flags:?})");
        }

        self.timer.arm();
        if self.state == ConnectionState::Stalled {
            log::info!("Stream resumed");
            self.set_state(ConnectionState::Connected);
        }
        self.emit(IngestEvent::Reading(reading));

        Some(reading)
    }

    /// The liveness timer expired.
    pub fn silence(&mut self) {
        self.timer.cancel();
        if self.state != ConnectionState::Connected {
            return;
        }

        let silent_for = self.timer.window();
        log::warn!("No frame decoded for {silent_for:?}, stream stalled");
        self.set_state(ConnectionState::Stalled);
        self.emit(IngestEvent::Notice(Notice::Stalled { silent_for }));
    }

    pub fn failed(&mut self, error: &TransportError) {
        if !self.state.is_open() {
            return;
        }

        log::warn!("{error}");
        self.disconnect(error.to_string());
    }

    pub fn closed(&mut self) {
        if !self.state.is_open() {
            return;
        }

        log::warn!("Connection closed by the remote end");
        self.disconnect("connection closed".to_string());
    }

    /// Deliberate end of the session. Nothing is emitted from here on.
    pub fn teardown(&mut self) {
        if !self.torn_down {
            log::debug!("Tearing down session in state {}", self.state);
        }
        self.torn_down = true;
        self.timer.cancel();
    }

    fn disconnect(&mut self, reason: String) {
        self.timer.cancel();
        self.set_state(ConnectionState::Disconnected);
        self.emit(IngestEvent::Notice(Notice::ConnectionLost { reason }));
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.emit(IngestEvent::State(state));
    }

    fn emit(&self, event: IngestEvent) {
        if self.torn_down {
            return;
        }
        // The consumer may have gone away already, that is not our problem.
        let _ = self.events.send(event);
    }
}
