// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

//! Stream ingestion for the humidity monitor.
//!
//! A [`StreamIngestor`] owns one connection made through a [`Transport`],
//! decodes every frame into a [`Reading`](humidity_monitor_model::Reading) and
//! reports a stall when nothing arrives for the liveness window.
//! [`run_monitor`] puts a presenter on top and handles reconnects.

pub mod config;
pub mod ingest;
pub mod presenter;
pub mod transport;

pub use config::{ConfigError, MonitorConfig};
pub use ingest::{IngestConfig, IngestEvent, LivenessTimer, Notice, StreamIngestor};
pub use presenter::{run_monitor, MonitorCommand, MonitorView, ReadingPresenter};
pub use transport::{Connection, Transport, TransportError, TransportEvent};

use std::sync::{Arc, Mutex, PoisonError};

/// Convenience helper for passing the last of a value between threads. For example from the
/// runtime driving the ingestion session to the UI thread drawing it.
///
/// A newer value replaces an older one that was not taken yet.
#[derive(Clone, Default)]
pub struct ValueStore<T>(Arc<Mutex<Option<T>>>);

impl<T: Clone> ValueStore<T> {
    /// Sets `value` as the last value.
    pub fn set(&self, value: T) {
        let mut data = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = data.insert(value);
    }

    /// Takes the stored value, leaving the store empty.
    pub fn take(&self) -> Option<T> {
        let mut data = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        data.take()
    }
}

#[test]
fn test_value_store_keeps_the_last_value() {
    let store = ValueStore::default();
    let writer = store.clone();

    writer.set(1);
    writer.set(2);

    assert_eq!(store.take(), Some(2));
    assert_eq!(store.take(), None);
}

#[test]
fn test_value_store_crosses_threads() {
    let store = ValueStore::default();
    let writer = store.clone();

    std::thread::spawn(move || writer.set("reading".to_string()))
        .join()
        .unwrap();

    assert_eq!(store.take().as_deref(), Some("reading"));
}
