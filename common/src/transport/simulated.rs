// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use crate::transport::{Connection, Transport, TransportError, TransportEvent};

/// One entry of a replay script.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ScriptedFrame {
    /// Wait before this frame is delivered.
    pub delay_ms: u64,
    pub frame: String,
}

/// A transport replaying a script of frames in a loop, for running without a
/// live sensor.
#[derive(Clone, Debug)]
pub struct SimulatedTransport {
    script: Arc<[ScriptedFrame]>,
}

pub struct SimulatedConnection {
    script: Arc<[ScriptedFrame]>,
    position: usize,
    /// When the frame at `position` is due. Survives a cancelled wait.
    due: Option<Instant>,
    closed: bool,
}

impl SimulatedTransport {
    /// Loads the bundled script.
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./simulated_frames.json");

        Self::from_json(json_data)
    }

    pub fn from_json(json_data: &str) -> Result<Self, serde_json::Error> {
        let script = serde_json::from_str::<Vec<ScriptedFrame>>(json_data)?;

        Ok(Self::with_script(script))
    }

    pub fn with_script(script: Vec<ScriptedFrame>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Transport for SimulatedTransport {
    type Connection = SimulatedConnection;

    async fn connect(&self, endpoint: &str) -> Result<SimulatedConnection, TransportError> {
        log::info!("Replaying {} simulated frames instead of {endpoint}", self.script.len());

        Ok(SimulatedConnection {
            script: self.script.clone(),
            position: 0,
            due: None,
            closed: false,
        })
    }
}

impl Connection for SimulatedConnection {
    async fn next_event(&mut self) -> TransportEvent {
        if self.closed || self.script.is_empty() {
            return TransportEvent::Closed;
        }

        let entry = &self.script[self.position % self.script.len()];
        let due = *self
            .due
            .get_or_insert_with(|| Instant::now() + Duration::from_millis(entry.delay_ms));

        tokio::time::sleep_until(due).await;
        self.due = None;
        self.position += 1;

        TransportEvent::Frame(entry.frame.clone())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[test]
fn test_bundled_script_loads() {
    let transport = SimulatedTransport::new().unwrap();

    assert_eq!(transport.script.len(), 10);
    assert!(transport.script.iter().all(|entry| entry.delay_ms <= 1000));
}

#[tokio::test(start_paused = true)]
async fn test_script_repeats_after_its_delays() {
    let transport = SimulatedTransport::from_json(
        r#"[{"delay_ms": 200, "frame": "a|b"}, {"delay_ms": 300, "frame": "c|d"}]"#,
    )
    .unwrap();
    let mut connection = transport.connect("sim").await.unwrap();
    let started = Instant::now();

    assert_eq!(connection.next_event().await, TransportEvent::Frame("a|b".into()));
    assert_eq!(connection.next_event().await, TransportEvent::Frame("c|d".into()));
    assert_eq!(connection.next_event().await, TransportEvent::Frame("a|b".into()));
    assert!(started.elapsed() >= Duration::from_millis(700));

    connection.close().await;
    assert_eq!(connection.next_event().await, TransportEvent::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_wait_keeps_the_frame() {
    let transport = SimulatedTransport::from_json(
        r#"[{"delay_ms": 1000, "frame": "a|b"}, {"delay_ms": 1000, "frame": "c|d"}]"#,
    )
    .unwrap();
    let mut connection = transport.connect("sim").await.unwrap();
    let started = Instant::now();

    let interrupted =
        tokio::time::timeout(Duration::from_millis(600), connection.next_event()).await;
    assert!(interrupted.is_err());

    assert_eq!(connection.next_event().await, TransportEvent::Frame("a|b".into()));
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(connection.next_event().await, TransportEvent::Frame("c|d".into()));
}
