// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use std::time::Duration;

use chrono::{DateTime, Local};
use humidity_monitor_common::transport::{SimulatedTransport, WebSocketTransport};
use humidity_monitor_common::{
    run_monitor, MonitorCommand, MonitorConfig, MonitorView, ReadingPresenter, ValueStore,
};
use humidity_monitor_model::ConnectionState;
use slint::ComponentHandle;
use tokio::sync::mpsc;

/// Hands every view over to the UI thread. Only the latest one is kept.
struct StorePresenter(ValueStore<MonitorView>);

impl ReadingPresenter for StorePresenter {
    fn present(&mut self, view: &MonitorView) {
        self.0.set(view.clone());
    }
}

/// Our App struct that holds the UI and the runtime the ingestion session runs on.
///
/// The monitor task pushes each new view into a ValueStore, and a UI timer
/// copies the latest one into the ViewModel. The reconnect button sends a
/// command back to the monitor task.
struct App {
    ui: AppWindow,
    runtime: tokio::runtime::Runtime,
    monitor: tokio::task::JoinHandle<()>,
    commands: mpsc::UnboundedSender<MonitorCommand>,
    views: ValueStore<MonitorView>,
    timer: slint::Timer,
}

impl App {
    const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

    /// Create a new App struct.
    ///
    /// Starts the monitor right away, against the configured endpoint or the
    /// simulated sensor.
    fn new(config: MonitorConfig) -> anyhow::Result<Self> {
        // Make a new AppWindow
        let ui = AppWindow::new()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ingest")
            .enable_all()
            .build()?;

        let views = ValueStore::default();
        let presenter = StorePresenter(views.clone());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let ingest = config.ingest();

        let monitor = if config.simulate {
            log::info!("Using the simulated sensor");
            let transport = SimulatedTransport::new()?;
            runtime.spawn(run_monitor(transport, ingest, command_rx, presenter))
        } else {
            log::info!("Using {}", config.endpoint);
            runtime.spawn(run_monitor(WebSocketTransport, ingest, command_rx, presenter))
        };

        // The reconnect button reloads the whole session.
        let reconnect = commands.clone();
        ui.global::<ViewModel>().on_reconnect(move || {
            log::info!("Reconnect requested");
            if reconnect.send(MonitorCommand::Reconnect).is_err() {
                log::error!("Monitor is not running anymore");
            }
        });

        Ok(Self {
            ui,
            runtime,
            monitor,
            commands,
            views,
            timer: slint::Timer::default(),
        })
    }

    /// Run the App until the window is closed.
    fn run(&mut self) -> anyhow::Result<()> {
        // Get the handle to the UI as a weak reference.
        let ui_handle = self.ui.as_weak();
        let views = self.views.clone();

        self.timer.start(
            slint::TimerMode::Repeated,
            Self::REFRESH_INTERVAL,
            move || {
                let Some(view) = views.take() else {
                    return;
                };
                let Some(ui) = ui_handle.upgrade() else {
                    return;
                };

                show_view(&ui.global::<ViewModel>(), &view);
            },
        );

        // Run the UI (and map an error to an anyhow::Error).
        self.ui.run().map_err(|e| e.into())
    }

    /// Tears down the running session so the close is a deliberate one.
    fn shutdown(self) -> anyhow::Result<()> {
        self.timer.stop();
        // Fails only when the monitor already returned.
        let _ = self.commands.send(MonitorCommand::Shutdown);
        self.runtime.block_on(self.monitor)?;

        Ok(())
    }
}

fn show_view(model: &ViewModel, view: &MonitorView) {
    model.set_humidity(view.humidity_text().into());
    model.set_sensor_voltage(view.voltage_text().into());
    model.set_adc_value(view.adc_text().into());
    model.set_status(view.state.into());
    model.set_status_text(view.status_text().into());
    model.set_notice(view.notice_text().into());
    model.set_updated_at(updated_text(view.updated_at).into());
    model.set_reconnect_offered(view.reconnect_offered());
}

/// Wall clock time of the last reading, empty before the first one.
fn updated_text(updated_at: Option<DateTime<Local>>) -> String {
    updated_at
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

impl From<ConnectionState> for LinkStatus {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Connecting => LinkStatus::Connecting,
            ConnectionState::Connected => LinkStatus::Connected,
            ConnectionState::Stalled => LinkStatus::Stalled,
            ConnectionState::Disconnected => LinkStatus::Disconnected,
        }
    }
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = MonitorConfig::load()?;
    let mut app = App::new(config)?;

    let result = app.run();
    app.shutdown()?;

    result
}
