use std::time::Duration;

use humidity_monitor_common::transport::ChannelTransport;
use humidity_monitor_common::{
    IngestConfig, IngestEvent, Notice, StreamIngestor, TransportError, TransportEvent,
};
use humidity_monitor_model::{ConnectionState, Reading};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;

const FRAME: &str = "Valor: 252 | Volts: 4.94";

fn config() -> IngestConfig {
    IngestConfig {
        endpoint: "ws://sensor.test".to_string(),
        liveness_window: Duration::from_secs(10),
    }
}

fn drain(events: &mut UnboundedReceiver<IngestEvent>) -> Vec<IngestEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

fn stalls(events: &[IngestEvent]) -> usize {
    events
        .iter()
        .filter(|e| **e == IngestEvent::State(ConnectionState::Stalled))
        .count()
}

async fn expect_connected(events: &mut UnboundedReceiver<IngestEvent>) {
    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Connecting))
    );
    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Connected))
    );
}

#[tokio::test(start_paused = true)]
async fn test_decodes_frames_into_readings() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (mut ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    peer.send_frame(FRAME);
    peer.send_frame("garbage");
    peer.send_frame("Valor: abc|Volts: 1.0");
    peer.send_frame("Valor: 17|Volts: 0.5|extra");

    assert_eq!(
        events.recv().await,
        Some(IngestEvent::Reading(Reading::new(252, 4.94)))
    );
    assert_eq!(
        events.recv().await,
        Some(IngestEvent::Reading(Reading::new(17, 0.5)))
    );

    ingestor.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_silence_after_connecting_stalls() {
    let transport = ChannelTransport::new();
    let _peer = transport.accept();
    let (mut ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    sleep(Duration::from_secs(9)).await;
    assert!(drain(&mut events).is_empty());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(
        drain(&mut events),
        vec![
            IngestEvent::State(ConnectionState::Stalled),
            IngestEvent::Notice(Notice::Stalled {
                silent_for: Duration::from_secs(10)
            }),
        ]
    );
    assert!(ingestor.is_running());

    ingestor.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_steady_frames_never_stall() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (mut ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    for _ in 0..6 {
        sleep(Duration::from_secs(9)).await;
        peer.send_frame(FRAME);
    }
    sleep(Duration::from_secs(1)).await;

    let seen = drain(&mut events);
    assert_eq!(stalls(&seen), 0);
    assert_eq!(seen.len(), 6);

    ingestor.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_garbage_does_not_keep_the_stream_alive() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (mut ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    for _ in 0..4 {
        sleep(Duration::from_secs(3)).await;
        peer.send_frame("garbage");
    }

    let seen = drain(&mut events);
    assert_eq!(stalls(&seen), 1);

    ingestor.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stalls_once_per_silence_period() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (mut ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    sleep(Duration::from_secs(60)).await;
    assert_eq!(stalls(&drain(&mut events)), 1);

    peer.send_frame(FRAME);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        drain(&mut events),
        vec![
            IngestEvent::State(ConnectionState::Connected),
            IngestEvent::Reading(Reading::new(252, 4.94)),
        ]
    );

    sleep(Duration::from_secs(60)).await;
    assert_eq!(stalls(&drain(&mut events)), 1);

    ingestor.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn test_remote_close_disconnects() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (_ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    peer.send(TransportEvent::Closed);

    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Disconnected))
    );
    assert_eq!(
        events.recv().await,
        Some(IngestEvent::Notice(Notice::ConnectionLost {
            reason: "connection closed".into()
        }))
    );
    assert_eq!(events.recv().await, None);
    assert!(peer.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_stalled_stream_can_still_be_closed() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (_ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    sleep(Duration::from_secs(11)).await;
    drain(&mut events);
    peer.send(TransportEvent::Closed);

    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Disconnected))
    );
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_disconnects_without_retry() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (_ingestor, mut events) = StreamIngestor::start(transport.clone(), config());
    expect_connected(&mut events).await;

    peer.send(TransportEvent::Error(TransportError::Stream("reset".into())));

    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Disconnected))
    );
    assert!(matches!(
        events.recv().await,
        Some(IngestEvent::Notice(Notice::ConnectionLost { reason })) if reason.contains("reset")
    ));
    assert_eq!(events.recv().await, None);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_connect_disconnects() {
    let transport = ChannelTransport::new();
    transport.refuse("connection refused");
    let (_ingestor, mut events) = StreamIngestor::start(transport, config());

    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Connecting))
    );
    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Disconnected))
    );
    assert!(matches!(
        events.recv().await,
        Some(IngestEvent::Notice(Notice::ConnectionLost { reason }))
            if reason.contains("ws://sensor.test") && reason.contains("refused")
    ));
    assert_eq!(events.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_is_silent_and_cancels_the_timer() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (mut ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    peer.send_frame(FRAME);
    sleep(Duration::from_secs(1)).await;
    ingestor.teardown().await;
    ingestor.teardown().await;

    assert!(peer.is_closed());
    assert!(!ingestor.is_running());

    // The remote end noticing the close afterwards changes nothing.
    peer.send(TransportEvent::Closed);
    sleep(Duration::from_secs(30)).await;

    assert_eq!(
        drain(&mut events),
        vec![IngestEvent::Reading(Reading::new(252, 4.94))]
    );
    assert_eq!(events.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_before_connecting_skips_the_connection() {
    let transport = ChannelTransport::new();
    let _peer = transport.accept();
    let (mut ingestor, mut events) = StreamIngestor::start(transport.clone(), config());

    ingestor.teardown().await;

    assert_eq!(
        events.recv().await,
        Some(IngestEvent::State(ConnectionState::Connecting))
    );
    assert_eq!(events.recv().await, None);
    assert_eq!(transport.connect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_ingestor_tears_down() {
    let transport = ChannelTransport::new();
    let peer = transport.accept();
    let (ingestor, mut events) = StreamIngestor::start(transport, config());
    expect_connected(&mut events).await;

    drop(ingestor);

    assert_eq!(events.recv().await, None);
    assert!(peer.is_closed());
}
