// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Where frames come from.
//!
//! The ingestor only sees the [`Transport`] and [`Connection`] traits, so a
//! live WebSocket, a replayed script and a test channel are interchangeable.

use std::future::Future;

use thiserror::Error;

mod channel;
mod simulated;

#[cfg(feature = "websocket")]
mod websocket;

pub use channel::{ChannelConnection, ChannelTransport};
pub use simulated::{ScriptedFrame, SimulatedConnection, SimulatedTransport};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

/// A connection level failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("connection failed: {0}")]
    Stream(String),
}

/// What a [`Connection`] delivers, one at a time and in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// One transport message, carrying one frame.
    Frame(String),
    Error(TransportError),
    /// The peer closed the connection or the network dropped it.
    Closed,
}

/// Opens connections to an endpoint.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    fn connect(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// An open connection.
pub trait Connection: Send + 'static {
    /// Waits for the next inbound event.
    ///
    /// After `Error` or `Closed` the connection is finished and callers stop
    /// polling it.
    fn next_event(&mut self) -> impl Future<Output = TransportEvent> + Send;

    /// Releases the connection. Closing twice is a no-op.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
