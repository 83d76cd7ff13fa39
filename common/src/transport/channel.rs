// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::transport::{Connection, Transport, TransportError, TransportEvent};

/// A transport whose connections are fed by the caller.
///
/// Every [`accept`](ChannelTransport::accept) or
/// [`refuse`](ChannelTransport::refuse) queues the outcome of one future
/// `connect` call. Handy for driving the ingestor through exact sequences.
#[derive(Clone, Default)]
pub struct ChannelTransport {
    pending: Arc<Mutex<VecDeque<Result<ChannelConnection, TransportError>>>>,
    connects: Arc<AtomicUsize>,
}

/// The far end of a [`ChannelConnection`].
pub struct ChannelPeer {
    events: mpsc::UnboundedSender<TransportEvent>,
    closed: Arc<AtomicBool>,
}

pub struct ChannelConnection {
    events: mpsc::UnboundedReceiver<TransportEvent>,
    closed: Arc<AtomicBool>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful connect and returns the peer feeding it.
    pub fn accept(&self) -> ChannelPeer {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        self.queue(Ok(ChannelConnection {
            events: rx,
            closed: closed.clone(),
        }));

        ChannelPeer { events: tx, closed }
    }

    /// Queues a failing connect.
    pub fn refuse(&self, reason: &str) {
        self.queue(Err(TransportError::Connect {
            endpoint: String::new(),
            reason: reason.to_string(),
        }));
    }

    /// Number of `connect` calls made so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn queue(&self, outcome: Result<ChannelConnection, TransportError>) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }
}

impl Transport for ChannelTransport {
    type Connection = ChannelConnection;

    async fn connect(&self, endpoint: &str) -> Result<ChannelConnection, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let next = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Ok(connection)) => Ok(connection),
            Some(Err(TransportError::Connect { reason, .. })) => Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                reason,
            }),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                reason: "no connection queued".to_string(),
            }),
        }
    }
}

impl Connection for ChannelConnection {
    async fn next_event(&mut self) -> TransportEvent {
        // A dropped peer looks like the network going away.
        self.events.recv().await.unwrap_or(TransportEvent::Closed)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.events.close();
    }
}

impl ChannelPeer {
    pub fn send_frame(&self, frame: &str) {
        self.send(TransportEvent::Frame(frame.to_string()));
    }

    /// Sends an event; ignored once the connection is gone.
    pub fn send(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    /// Whether the consumer released the connection.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
