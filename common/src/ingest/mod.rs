// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! The ingestion session: one connection, its frames and its liveness timer.

use std::fmt;
use std::time::Duration;

use humidity_monitor_model::{ConnectionState, Reading};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::transport::{Connection, Transport, TransportEvent};

mod liveness;
mod session;

pub use liveness::LivenessTimer;

use session::Session;

/// The stream counts as stalled when nothing was decoded for this long.
pub const DEFAULT_LIVENESS_WINDOW: Duration = Duration::from_secs(10);

pub const DEFAULT_ENDPOINT: &str = "wss://servidor-1hnh.onrender.com";

/// What a [`StreamIngestor`] connects to and how long it tolerates silence.
#[derive(Clone, Debug, PartialEq)]
pub struct IngestConfig {
    pub endpoint: String,
    pub liveness_window: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            liveness_window: DEFAULT_LIVENESS_WINDOW,
        }
    }
}

/// Everything a consumer learns about a session, in the order it happened.
#[derive(Clone, Debug, PartialEq)]
pub enum IngestEvent {
    State(ConnectionState),
    Reading(Reading),
    Notice(Notice),
}

/// A failure the user should see, together with the reconnect action.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    /// The connection may still be open, but the data stopped.
    Stalled { silent_for: Duration },
    ConnectionLost { reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Stalled { silent_for } => write!(
                f,
                "No data received for {} s, the sensor stream stalled",
                silent_for.as_secs()
            ),
            Notice::ConnectionLost { reason } => write!(f, "Connection lost: {reason}"),
        }
    }
}

/// Owns one ingestion session running on the tokio runtime.
///
/// [`StreamIngestor::start`] connects right away. The session ends on its own
/// once the connection is lost; [`StreamIngestor::teardown`] ends it early
/// without reporting anything. Dropping the ingestor tears the session down
/// as well.
pub struct StreamIngestor {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

enum Step {
    Teardown,
    Transport(TransportEvent),
    Silence,
}

impl StreamIngestor {
    /// Spawns the session. Must be called from within a tokio runtime.
    ///
    /// Returns the ingestor and the receiving end of its events. The channel
    /// closes when the session is over.
    pub fn start<T: Transport>(
        transport: T,
        config: IngestConfig,
    ) -> (Self, mpsc::UnboundedReceiver<IngestEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run_session(transport, config, events_tx, shutdown_rx));

        (
            Self {
                shutdown: Some(shutdown_tx),
                task: Some(task),
            },
            events_rx,
        )
    }

    /// Whether the session task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the session: cancels the liveness timer, closes the connection
    /// and suppresses the close notification. Calling it again does nothing.
    pub async fn teardown(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // Fails when the session already ended on its own.
            let _ = shutdown.send(());
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Ingestion task failed: {e}");
            }
        }
    }
}

impl Drop for StreamIngestor {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn run_session<T: Transport>(
    transport: T,
    config: IngestConfig,
    events: mpsc::UnboundedSender<IngestEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut session = Session::new(config.liveness_window, events);
    session.connecting(&config.endpoint);

    let connected = tokio::select! {
        biased;
        _ = &mut shutdown => {
            session.teardown();
            return;
        }
        result = transport.connect(&config.endpoint) => result,
    };

    let mut connection = match connected {
        Ok(connection) => connection,
        Err(e) => {
            session.open_failed(&e);
            return;
        }
    };
    session.opened();

    while session.state().is_open() {
        // Teardown wins over anything else that is ready, and a frame arriving
        // right at the deadline still counts.
        let step = tokio::select! {
            biased;
            _ = &mut shutdown => Step::Teardown,
            event = connection.next_event() => Step::Transport(event),
            _ = session.timer().expired() => Step::Silence,
        };

        match step {
            Step::Teardown => {
                session.teardown();
                break;
            }
            Step::Transport(TransportEvent::Frame(frame)) => {
                session.frame(&frame);
            }
            Step::Transport(TransportEvent::Error(e)) => session.failed(&e),
            Step::Transport(TransportEvent::Closed) => session.closed(),
            Step::Silence => session.silence(),
        }
    }

    connection.close().await;
}
