use std::sync::Arc;
use tokio::sync::mpsc;

use adblock_options::backend::{BackendService, HttpFetcher};
use adblock_options::config::SettingsManager;
use adblock_options::log_collector::{ensure_logs_dir_exists, get_global_logs_path};
use adblock_options::system::SystemLauncher;
use adblock_options::ui::app::AppUI;
use adblock_options::ui::controller::PageController;
use adblock_options::ui::threading::{spawn_monitored_task, BackendBridge};
use adblock_options::{LogCollector, LogLine};

#[tokio::main]
async fn main() -> adblock_options::Result<()> {
    // =========================================================================
    // LOG COLLECTOR - MUST BE FIRST
    // =========================================================================
    let log_dir = match get_global_logs_path() {
        Ok(dir) => {
            ensure_logs_dir_exists(&dir)?;
            dir
        }
        Err(e) => {
            eprintln!("[Main] ERROR: Failed to get global logs path: {}", e);
            return Err(format!("Failed to determine logs directory: {}", e).into());
        }
    };
    let (log_ui_tx, log_ui_rx) = mpsc::channel::<LogLine>(1024);
    let log_collector = match LogCollector::new(log_dir.clone(), Some(log_ui_tx)) {
        Ok(collector) => Arc::new(collector),
        Err(e) => {
            eprintln!("[Main] WARNING: LogCollector initialization failed: {}", e);
            return Err(format!("LogCollector initialization failed: {}", e).into());
        }
    };

    // =========================================================================
    // WINDOW PREFERENCES
    // =========================================================================
    let app_state = match SettingsManager::load() {
        Ok(state) => state,
        Err(e) => {
            eprintln!("[Main] WARNING: Using default settings: {}", e);
            Default::default()
        }
    };

    let max_level = if app_state.debug_logging {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    if let Err(e) = log::set_boxed_logger(Box::new((*log_collector).clone()))
        .map(|()| log::set_max_level(max_level))
    {
        eprintln!("[Main] WARNING: Failed to set LogCollector as global logger: {}", e);
    }
    log::info!(
        "Adblock options {} starting, session log {}",
        adblock_options::VERSION,
        log_collector.session_log_path().display()
    );

    // =========================================================================
    // FILTERING SERVICE
    // =========================================================================
    let bridge = BackendBridge::new();
    let BackendBridge {
        client,
        events_rx,
        requests_rx,
        events_tx,
    } = bridge;

    let service = BackendService::with_default_catalog(Arc::new(HttpFetcher::new()));
    spawn_monitored_task("filtering-service", async move {
        service.run(requests_rx, events_tx).await;
        Ok(())
    });

    // =========================================================================
    // CONTROLLER AND EGUI APP
    // =========================================================================
    let mut controller = PageController::new(
        Arc::new(client),
        Arc::new(SystemLauncher::new()),
        log_dir,
        &app_state,
    );
    controller.initialize();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Adblock settings")
            .with_inner_size([app_state.window_width, app_state.window_height])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    let app_ui = AppUI::new(controller, app_state, Some(events_rx), Some(log_ui_rx));

    adblock_options::log_info!("[Main] Launching options window, logs in {}", log_collector.log_dir().display());
    let result = eframe::run_native(
        "Adblock settings",
        options,
        Box::new(move |_cc| Box::new(app_ui)),
    );

    // =========================================================================
    // SHUTDOWN
    // =========================================================================
    log::info!("[Main] Options window closed");
    if let Err(e) = log_collector.wait_for_empty().await {
        eprintln!("[Main] WARNING: Failed to wait for log collector to empty: {}", e);
    }

    result.map_err(|e| e.into())
}
