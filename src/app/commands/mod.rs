use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tauri::{AppHandle, State};
use tauri_plugin_clipboard_manager::ClipboardExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::adb::endpoint::{scan_base, ConnectRequest, PairRequest};
use crate::app::config::AppConfig;
use crate::app::connection;
use crate::app::console::{self, CLEAR_COMMAND};
use crate::app::context::ActionContext;
use crate::app::error::AppError;
use crate::app::models::{
    ActionStarted, CommandResponse, FormDefaults, LogLevel, NotificationKind, QuickCommand,
    SelectedFile, SessionSnapshot,
};
use crate::app::scan::{check_host, scan_subnet, ScanSettings};
use crate::app::scheduler::{ActionKind, ADB_SERVER_LANE};
use crate::app::session::SessionHandle;
use crate::app::state::AppState;
use crate::app::tools;
use crate::app::transfer::{self, describe_file};

pub const PLATFORM_TOOLS_URL: &str = "https://developer.android.com/tools/releases/platform-tools";

fn resolve_trace_id(input: Option<String>) -> String {
    input
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn ensure_non_empty(value: &str, field: &str, trace_id: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(
            format!("{field} is required"),
            trace_id,
        ));
    }
    Ok(())
}

fn started(kind: ActionKind, trace_id: String) -> CommandResponse<ActionStarted> {
    CommandResponse {
        trace_id,
        data: ActionStarted {
            action: kind.label().to_string(),
        },
    }
}

/// Cancelled runs log a warning; every other failure is logged and shown as
/// an error notification. The result value itself has already been reported.
fn finish_action<T>(ctx: &ActionContext, kind: ActionKind, result: Result<T, AppError>) {
    match result {
        Ok(_) => info!(trace_id = %ctx.trace_id(), action = kind.label(), "action finished"),
        Err(err) if err.is_cancelled() => {
            ctx.reporter.warn(format!("{} cancelled", kind.label()));
        }
        Err(err) => {
            ctx.reporter
                .error(format!("{} failed: {}", kind.label(), err.error));
            ctx.reporter.notify(
                NotificationKind::Error,
                &format!("{} failed", kind.label()),
                err.error,
            );
        }
    }
}

/// Registers `kind`, then runs `job` on its own thread behind a global permit
/// and, for anything that talks to the adb server, the server lane.
pub(crate) fn spawn_action<T, F>(
    state: &AppState,
    kind: ActionKind,
    trace_id: &str,
    job: F,
) -> Result<JoinHandle<()>, AppError>
where
    F: FnOnce(&ActionContext) -> Result<T, AppError> + Send + 'static,
{
    let guard = state.actions.begin(kind, trace_id)?;
    let ctx = state.action_context(trace_id, guard.token().clone());
    let scheduler = Arc::clone(&state.scheduler);
    info!(trace_id = %trace_id, action = kind.label(), "action queued");

    thread::Builder::new()
        .name(format!("action-{}", kind.label()))
        .spawn(move || {
            let _guard = guard;
            let _permit = scheduler.acquire_global();
            let lane = kind
                .uses_adb_server()
                .then(|| scheduler.lane(ADB_SERVER_LANE));
            let _lane = lane
                .as_ref()
                .map(|lane| lane.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
            let result = ctx.check_cancelled().and_then(|()| job(&ctx));
            finish_action(&ctx, kind, result);
        })
        .map_err(|err| AppError::system(format!("Failed to start worker: {err}"), trace_id))
}

fn start<T, F>(
    state: &AppState,
    kind: ActionKind,
    trace_id: String,
    job: F,
) -> Result<CommandResponse<ActionStarted>, AppError>
where
    F: FnOnce(&ActionContext) -> Result<T, AppError> + Send + 'static,
{
    spawn_action(state, kind, &trace_id, job)?;
    Ok(started(kind, trace_id))
}

fn require_connected_target(session: &SessionHandle, trace_id: &str) -> Result<String, AppError> {
    session
        .connection(trace_id)?
        .target()
        .map(str::to_string)
        .ok_or_else(|| AppError::not_connected(trace_id))
}

fn require_selected_file(session: &SessionHandle, trace_id: &str) -> Result<SelectedFile, AppError> {
    session
        .snapshot(trace_id)?
        .selected_file
        .ok_or_else(|| AppError::validation("No file selected", trace_id))
}

fn form_defaults(config: &AppConfig) -> FormDefaults {
    FormDefaults {
        ip: config.connection.default_ip.clone(),
        port: config.connection.default_port.clone(),
        push_dir: config.connection.default_push_dir.clone(),
        pull_path: config.connection.default_pull_path.clone(),
        download_url: PLATFORM_TOOLS_URL.to_string(),
    }
}

fn scan_settings(config: &AppConfig) -> ScanSettings {
    ScanSettings {
        port: config.scheduler.scan_port,
        workers: config.scheduler.scan_workers,
        connect_timeout: config.timeouts.scan_connect(),
    }
}

pub(crate) fn select_file_inner(
    session: &SessionHandle,
    path: &str,
    trace_id: &str,
) -> Result<SelectedFile, AppError> {
    ensure_non_empty(path, "path", trace_id)?;
    let file = describe_file(path).map_err(|message| AppError::validation(message, trace_id))?;
    info!(trace_id = %trace_id, name = %file.name, size = %file.size_label, "file selected");
    session.select_file(Some(file.clone()));
    Ok(file)
}

pub(crate) fn pair_inner(
    state: &AppState,
    ip: &str,
    port: &str,
    code: &str,
    trace_id: String,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let request =
        PairRequest::parse(ip, port, code).map_err(|message| AppError::validation(message, &trace_id))?;
    start(state, ActionKind::Pair, trace_id, move |ctx| {
        connection::pair(ctx, &request)
    })
}

pub(crate) fn connect_inner(
    state: &AppState,
    ip: &str,
    port: &str,
    trace_id: String,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let request =
        ConnectRequest::parse(ip, port).map_err(|message| AppError::validation(message, &trace_id))?;
    start(state, ActionKind::Connect, trace_id, move |ctx| {
        connection::connect_network(ctx, &request)
    })
}

pub(crate) fn push_inner(
    state: &AppState,
    dest: &str,
    trace_id: String,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    ensure_non_empty(dest, "destination", &trace_id)?;
    require_connected_target(&state.session, &trace_id)?;
    let file = require_selected_file(&state.session, &trace_id)?;
    let dest = dest.trim().to_string();
    start(state, ActionKind::Push, trace_id, move |ctx| {
        transfer::push(ctx, &file, &dest)
    })
}

pub(crate) fn install_inner(
    state: &AppState,
    trace_id: String,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    require_connected_target(&state.session, &trace_id)?;
    let file = require_selected_file(&state.session, &trace_id)?;
    if !file.is_apk {
        return Err(AppError::validation(
            format!("{} is not an APK", file.name),
            &trace_id,
        ));
    }
    start(state, ActionKind::Install, trace_id, move |ctx| {
        transfer::install(ctx, &file)
    })
}

pub(crate) fn pull_inner(
    state: &AppState,
    remote: &str,
    local: &str,
    trace_id: String,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    ensure_non_empty(remote, "remote path", &trace_id)?;
    ensure_non_empty(local, "local path", &trace_id)?;
    require_connected_target(&state.session, &trace_id)?;
    let remote = remote.trim().to_string();
    let local = local.trim().to_string();
    start(state, ActionKind::Pull, trace_id, move |ctx| {
        transfer::pull(ctx, &remote, &local)
    })
}

pub(crate) fn scan_inner(
    state: &AppState,
    ip: &str,
    trace_id: String,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    scan_base(ip).map_err(|message| AppError::validation(message, &trace_id))?;
    let ip = ip.trim().to_string();
    let settings = scan_settings(&state.config);
    start(state, ActionKind::Scan, trace_id, move |ctx| {
        scan_subnet(&ctx.reporter, &ctx.token, &ip, &settings, check_host)
    })
}

pub(crate) fn console_inner(
    state: &AppState,
    command: &str,
    trace_id: String,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    ensure_non_empty(command, "command", &trace_id)?;
    if command.trim() == CLEAR_COMMAND {
        state.session.clear_console();
        return Ok(started(ActionKind::Console, trace_id));
    }
    let command = command.to_string();
    start(state, ActionKind::Console, trace_id, move |ctx| {
        console::run_console(ctx, &command)
    })
}

pub(crate) fn save_console_inner(
    session: &SessionHandle,
    path: &str,
    trace_id: &str,
) -> Result<String, AppError> {
    ensure_non_empty(path, "path", trace_id)?;
    let snapshot = session.snapshot(trace_id)?;
    console::save_output(Path::new(path.trim()), &snapshot.console_output, trace_id)?;
    info!(trace_id = %trace_id, path = %path.trim(), "console output saved");
    Ok(path.trim().to_string())
}

pub(crate) fn copy_console_inner(
    session: &SessionHandle,
    trace_id: &str,
    write: impl FnOnce(String) -> Result<(), String>,
) -> Result<usize, AppError> {
    let text = session.snapshot(trace_id)?.console_output;
    if text.trim().is_empty() {
        return Err(AppError::validation("No output to copy", trace_id));
    }
    let length = text.chars().count();
    write(text).map_err(|message| {
        AppError::system(format!("Failed to copy to clipboard: {message}"), trace_id)
    })?;
    Ok(length)
}

pub(crate) fn cancel_inner(state: &AppState, action: ActionKind, trace_id: &str) -> bool {
    let cancelled = state.actions.cancel(action);
    if cancelled {
        info!(trace_id = %trace_id, action = action.label(), "cancel requested");
        state
            .session
            .log(LogLevel::Warning, format!("Cancelling {}...", action.label()));
    } else {
        warn!(trace_id = %trace_id, action = action.label(), "nothing to cancel");
    }
    cancelled
}

#[tauri::command(async)]
pub fn get_session(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<SessionSnapshot>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let snapshot = state.session.snapshot(&trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: snapshot,
    })
}

#[tauri::command(async)]
pub fn get_form_defaults(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<FormDefaults>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    Ok(CommandResponse {
        trace_id,
        data: form_defaults(&state.config),
    })
}

#[tauri::command(async)]
pub fn get_quick_commands(trace_id: Option<String>) -> Result<CommandResponse<Vec<QuickCommand>>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    Ok(CommandResponse {
        trace_id,
        data: console::quick_commands(),
    })
}

#[tauri::command(async)]
pub fn check_adb(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "check_adb");
    start(&state, ActionKind::CheckAdb, trace_id, |ctx| {
        Ok::<_, AppError>(connection::check_adb(ctx))
    })
}

#[tauri::command(async)]
pub fn adb_pair(
    state: State<'_, AppState>,
    ip: String,
    port: String,
    code: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, ip = %ip, port = %port, "adb_pair");
    pair_inner(&state, &ip, &port, &code, trace_id)
}

#[tauri::command(async)]
pub fn adb_connect(
    state: State<'_, AppState>,
    ip: String,
    port: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, ip = %ip, port = %port, "adb_connect");
    connect_inner(&state, &ip, &port, trace_id)
}

#[tauri::command(async)]
pub fn connect_usb(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "connect_usb");
    start(&state, ActionKind::ConnectUsb, trace_id, connection::connect_usb)
}

#[tauri::command(async)]
pub fn disconnect(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "disconnect");
    start(&state, ActionKind::Disconnect, trace_id, connection::disconnect)
}

#[tauri::command(async)]
pub fn force_clean(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "force_clean");
    start(&state, ActionKind::ForceClean, trace_id, connection::force_clean)
}

#[tauri::command(async)]
pub fn restart_adb(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "restart_adb");
    start(&state, ActionKind::RestartServer, trace_id, connection::restart_server)
}

#[tauri::command(async)]
pub fn adb_status(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "adb_status");
    start(&state, ActionKind::Status, trace_id, |ctx| {
        let report = connection::status_report(ctx)?;
        ctx.reporter
            .notify(NotificationKind::Info, "ADB status", report);
        Ok(())
    })
}

#[tauri::command(async)]
pub fn select_file(
    state: State<'_, AppState>,
    path: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<SelectedFile>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let file = select_file_inner(&state.session, &path, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: file,
    })
}

#[tauri::command(async)]
pub fn push_file(
    state: State<'_, AppState>,
    dest: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, dest = %dest, "push_file");
    push_inner(&state, &dest, trace_id)
}

#[tauri::command(async)]
pub fn pull_file(
    state: State<'_, AppState>,
    remote: String,
    local: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, remote = %remote, local = %local, "pull_file");
    pull_inner(&state, &remote, &local, trace_id)
}

#[tauri::command(async)]
pub fn install_apk(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "install_apk");
    install_inner(&state, trace_id)
}

#[tauri::command(async)]
pub fn device_info(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    require_connected_target(&state.session, &trace_id)?;
    start(&state, ActionKind::DeviceInfo, trace_id, tools::device_info)
}

#[tauri::command(async)]
pub fn list_apps(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    require_connected_target(&state.session, &trace_id)?;
    start(&state, ActionKind::ListApps, trace_id, tools::list_apps)
}

#[tauri::command(async)]
pub fn take_screenshot(
    state: State<'_, AppState>,
    save_path: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    ensure_non_empty(&save_path, "save path", &trace_id)?;
    require_connected_target(&state.session, &trace_id)?;
    info!(trace_id = %trace_id, save_path = %save_path, "take_screenshot");
    start(&state, ActionKind::Screenshot, trace_id, move |ctx| {
        tools::screenshot(ctx, &save_path)
    })
}

#[tauri::command(async)]
pub fn scan_network(
    state: State<'_, AppState>,
    ip: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, ip = %ip, "scan_network");
    scan_inner(&state, &ip, trace_id)
}

#[tauri::command(async)]
pub fn run_console(
    state: State<'_, AppState>,
    command: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, command = %command, "run_console");
    console_inner(&state, &command, trace_id)
}

#[tauri::command(async)]
pub fn clear_console(state: State<'_, AppState>, trace_id: Option<String>) -> Result<CommandResponse<bool>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    state.session.clear_console();
    Ok(CommandResponse {
        trace_id,
        data: true,
    })
}

#[tauri::command(async)]
pub fn save_console(
    state: State<'_, AppState>,
    path: String,
    trace_id: Option<String>,
) -> Result<CommandResponse<String>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let saved = save_console_inner(&state.session, &path, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: saved,
    })
}

#[tauri::command(async)]
pub fn copy_console(
    app: AppHandle,
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<usize>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let copied = copy_console_inner(&state.session, &trace_id, |text| {
        app.clipboard().write_text(text).map_err(|err| err.to_string())
    })?;
    info!(trace_id = %trace_id, chars = copied, "console output copied");
    Ok(CommandResponse {
        trace_id,
        data: copied,
    })
}

#[tauri::command(async)]
pub fn clear_log(state: State<'_, AppState>, trace_id: Option<String>) -> Result<CommandResponse<bool>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    state.session.clear_log();
    Ok(CommandResponse {
        trace_id,
        data: true,
    })
}

#[tauri::command(async)]
pub fn kill_logcat(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ActionStarted>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "kill_logcat");
    start(&state, ActionKind::KillLogcat, trace_id, |ctx| {
        console::kill_logcat(ctx);
        Ok::<_, AppError>(())
    })
}

#[tauri::command(async)]
pub fn cancel_action(
    state: State<'_, AppState>,
    action: ActionKind,
    trace_id: Option<String>,
) -> Result<CommandResponse<bool>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let cancelled = cancel_inner(&state, action, &trace_id);
    Ok(CommandResponse {
        trace_id,
        data: cancelled,
    })
}
