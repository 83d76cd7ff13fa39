// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::transport::{Connection, Transport, TransportError, TransportEvent};

/// Connects to a `ws://` or `wss://` endpoint that pushes one frame per
/// message.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketTransport;

pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn connect(&self, endpoint: &str) -> Result<WebSocketConnection, TransportError> {
        let (stream, response) =
            connect_async(endpoint)
                .await
                .map_err(|e| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })?;
        log::debug!("WebSocket handshake with {endpoint}: {}", response.status());

        Ok(WebSocketConnection {
            stream,
            closed: false,
        })
    }
}

impl Connection for WebSocketConnection {
    async fn next_event(&mut self) -> TransportEvent {
        if self.closed {
            return TransportEvent::Closed;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return TransportEvent::Frame(text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => return TransportEvent::Frame(text),
                    Err(e) => log::warn!("Ignoring binary message that is not UTF-8: {e}"),
                },
                Some(Ok(Message::Close(frame))) => {
                    log::debug!("Server closed the connection: {frame:?}");
                    return TransportEvent::Closed;
                }
                // Ping, pong and raw frames carry no readings.
                Some(Ok(_)) => {}
                Some(Err(e)) => return TransportEvent::Error(TransportError::Stream(e.to_string())),
                None => return TransportEvent::Closed,
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.stream.close(None).await {
            log::debug!("Close handshake failed: {e}");
        }
    }
}
