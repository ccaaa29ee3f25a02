pub mod app;

use std::sync::Arc;

use tauri::{Emitter, Manager};
use tracing::{info, warn};
use uuid::Uuid;

use app::commands::{
    adb_connect, adb_pair, adb_status, cancel_action, check_adb, clear_console, clear_log,
    connect_usb, copy_console, device_info, disconnect, force_clean, get_form_defaults,
    get_quick_commands, get_session, install_apk, kill_logcat, list_apps, pull_file, push_file,
    restart_adb, run_console, save_console, scan_network, select_file, spawn_action,
    take_screenshot,
};
use app::config::{load_config, AppConfig};
use app::connection;
use app::error::AppError;
use app::logging::init_logging;
use app::scheduler::ActionKind;
use app::session::{EventSink, UiEvent};
use app::state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let (config, config_error) = match load_config() {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    init_logging(&config.logging);
    if let Some(err) = config_error {
        warn!(error = %err, "config unreadable, using defaults");
    }

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_clipboard_manager::init())
        .plugin(tauri_plugin_opener::init())
        .setup(move |app| {
            let handle = app.handle().clone();
            let sink: EventSink = Arc::new(move |event: UiEvent| {
                if let Err(err) = handle.emit(event.name(), event.payload()) {
                    warn!(error = %err, event = event.name(), "failed to emit ui event");
                }
            });
            let state = AppState::new(config, sink);
            info!(adb = %state.adb_program, "adb manager starting");

            let trace_id = Uuid::new_v4().to_string();
            if let Err(err) = spawn_action(&state, ActionKind::CheckAdb, &trace_id, |ctx| {
                Ok::<_, AppError>(connection::check_adb(ctx))
            }) {
                warn!(trace_id = %trace_id, error = %err, "startup adb check not started");
            }
            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_session,
            get_form_defaults,
            get_quick_commands,
            check_adb,
            adb_pair,
            adb_connect,
            connect_usb,
            disconnect,
            force_clean,
            restart_adb,
            adb_status,
            select_file,
            push_file,
            pull_file,
            install_apk,
            device_info,
            list_apps,
            take_screenshot,
            scan_network,
            run_console,
            clear_console,
            save_console,
            copy_console,
            clear_log,
            kill_logcat,
            cancel_action
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
