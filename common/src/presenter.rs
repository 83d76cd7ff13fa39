// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Local};
use humidity_monitor_model::{display, ConnectionState, Reading};
use tokio::sync::mpsc;

use crate::ingest::{IngestConfig, IngestEvent, Notice, StreamIngestor};
use crate::transport::Transport;

/// Everything a presenter draws: the latest reading and the session status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonitorView {
    pub reading: Option<Reading>,
    pub state: ConnectionState,
    pub notice: Option<Notice>,
    /// Local time the shown reading arrived.
    pub updated_at: Option<DateTime<Local>>,
}

impl MonitorView {
    /// Folds one event into the view. A reading replaces the previous one.
    pub fn apply(&mut self, event: IngestEvent) {
        match event {
            IngestEvent::State(state) => {
                self.state = state;
                if !state.offers_reconnect() {
                    self.notice = None;
                }
            }
            IngestEvent::Reading(reading) => {
                self.reading = Some(reading);
                self.updated_at = Some(Local::now());
            }
            IngestEvent::Notice(notice) => self.notice = Some(notice),
        }
    }

    pub fn humidity_text(&self) -> String {
        display::humidity_text(self.reading.as_ref())
    }

    pub fn voltage_text(&self) -> String {
        display::voltage_text(self.reading.as_ref())
    }

    pub fn adc_text(&self) -> String {
        display::adc_text(self.reading.as_ref())
    }

    pub fn status_text(&self) -> &'static str {
        self.state.label()
    }

    pub fn notice_text(&self) -> String {
        self.notice.as_ref().map(Notice::to_string).unwrap_or_default()
    }

    pub fn reconnect_offered(&self) -> bool {
        self.state.offers_reconnect()
    }
}

/// Draws the monitor. Called with the complete view after every change.
pub trait ReadingPresenter {
    fn present(&mut self, view: &MonitorView);
}

/// Instructions for [`run_monitor`] from the frontend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Throw the current session away and start over with an empty view.
    Reconnect,
    Shutdown,
}

/// Runs ingestion sessions until told to shut down.
///
/// Every event of the current session is folded into a [`MonitorView`] that
/// is handed to `presenter`. A session that ended stays on screen until a
/// [`MonitorCommand::Reconnect`] arrives. Closing the command channel counts
/// as [`MonitorCommand::Shutdown`].
pub async fn run_monitor<T, P>(
    transport: T,
    config: IngestConfig,
    mut commands: mpsc::UnboundedReceiver<MonitorCommand>,
    mut presenter: P,
) where
    T: Transport + Clone,
    P: ReadingPresenter,
{
    loop {
        let mut view = MonitorView::default();
        presenter.present(&view);

        let (mut ingestor, mut events) = StreamIngestor::start(transport.clone(), config.clone());
        let mut session_over = false;

        let command = loop {
            tokio::select! {
                event = events.recv(), if !session_over => match event {
                    Some(event) => {
                        view.apply(event);
                        presenter.present(&view);
                    }
                    None => {
                        log::debug!("Session ended in state {}", view.state);
                        session_over = true;
                    }
                },
                command = commands.recv() => break command.unwrap_or(MonitorCommand::Shutdown),
            }
        };

        ingestor.teardown().await;

        match command {
            MonitorCommand::Reconnect => log::info!("Reconnecting"),
            MonitorCommand::Shutdown => {
                log::info!("Monitor shut down");
                return;
            }
        }
    }
}
