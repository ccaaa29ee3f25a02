//! Push, pull and install against the connected target.

use std::fs;
use std::path::Path;

use crate::app::adb::endpoint::Transport;
use crate::app::adb::outcome::{
    classify_connect, classify_transfer, ConnectOutcome, TransferKind, TransferOutcome,
};
use crate::app::adb::parse::attached_endpoints;
use crate::app::adb::paths::{push_destination, validate_device_path};
use crate::app::connection::{log_steps, restart_server_steps, MANUAL_CLEANUP_STEPS};
use crate::app::context::ActionContext;
use crate::app::error::AppError;
use crate::app::models::{NotificationKind, SelectedFile};
use crate::app::retry::{poll_until, Attempt};
use crate::app::session::ConnectionEvent;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Display only; `12.34 MB` style with one decimal.
pub fn size_label(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / BYTES_PER_MB)
}

pub fn is_apk(path: &str) -> bool {
    path.to_lowercase().ends_with(".apk")
}

pub fn describe_file(path: &str) -> Result<SelectedFile, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("No file selected".to_string());
    }
    let metadata = fs::metadata(trimmed).map_err(|err| format!("Cannot read {trimmed}: {err}"))?;
    if !metadata.is_file() {
        return Err(format!("{trimmed} is not a file"));
    }
    let name = Path::new(trimmed)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| trimmed.to_string());
    Ok(SelectedFile {
        path: trimmed.to_string(),
        name,
        size_bytes: metadata.len(),
        size_label: size_label(metadata.len()),
        is_apk: is_apk(trimmed),
    })
}

/// Whether `target` is the only attached device of any transport.
fn only_target_attached(stdout: &str, target: &str) -> bool {
    let endpoints = attached_endpoints(stdout);
    endpoints.len() == 1 && endpoints[0] == target
}

fn reconnect(ctx: &ActionContext, target: &str) -> Result<(), AppError> {
    if Transport::of(target) == Transport::Usb {
        return Ok(());
    }
    let output = ctx.adb.run(&["connect", target], ctx.timeouts.default_timeout());
    match classify_connect(&output) {
        ConnectOutcome::Connected => Ok(()),
        ConnectOutcome::Failed { detail } => Err(AppError::process(
            format!("Reconnect to {target} failed: {detail}"),
            ctx.trace_id(),
        )),
    }
}

fn wait_for_only_target(ctx: &ActionContext, target: &str) -> Result<Option<usize>, AppError> {
    let attempt = poll_until(&ctx.backoff, &ctx.token, ctx.trace_id(), |_| {
        let stdout = ctx.devices().stdout;
        if only_target_attached(&stdout, target) {
            Attempt::Done(())
        } else {
            Attempt::Retry(attached_endpoints(&stdout).len())
        }
    })?;
    Ok(match attempt {
        Attempt::Done(()) => None,
        Attempt::Retry(count) => Some(count),
    })
}

/// Restarts the server and reattaches only the target before a push or install.
fn reset_to_target(ctx: &ActionContext, target: &str) -> Result<(), AppError> {
    ctx.reporter.info("Restarting ADB to avoid conflicts...");
    restart_server_steps(ctx)?;
    ctx.check_cancelled()?;
    ctx.reporter.info(format!("Connecting only to {target}..."));
    reconnect(ctx, target)?;

    if let Some(count) = wait_for_only_target(ctx, target)? {
        ctx.reporter
            .warn(format!("Detected {count} devices, forcing cleanup..."));
        ctx.adb.run(&["disconnect"], ctx.timeouts.kill());
        reconnect(ctx, target)?;
        if let Some(count) = wait_for_only_target(ctx, target)? {
            ctx.reporter
                .warn(format!("Still {count} devices attached after cleanup"));
            log_steps(ctx, "Manual fix:", MANUAL_CLEANUP_STEPS);
            ctx.reporter.transition(ConnectionEvent::Disconnect)?;
            return Err(AppError::ambiguous_device(
                format!("{count} devices attached, expected only {target}"),
                ctx.trace_id(),
            ));
        }
    } else {
        ctx.reporter.info("Devices attached: 1");
    }
    Ok(())
}

/// Scoped to the target first; one unscoped retry if adb reports ambiguity.
fn run_transfer(
    ctx: &ActionContext,
    kind: TransferKind,
    target: &str,
    args: &[&str],
    timeout: std::time::Duration,
) -> Result<(), AppError> {
    let scoped = ctx.adb.run_on(Some(target), args, timeout);
    let mut outcome = classify_transfer(kind, &scoped);
    if matches!(outcome, TransferOutcome::AmbiguousDevice { .. }) {
        ctx.check_cancelled()?;
        ctx.reporter.info("Retrying without device scoping...");
        let unscoped = ctx.adb.run(args, timeout);
        outcome = classify_transfer(kind, &unscoped);
    }
    if let TransferOutcome::AmbiguousDevice { .. } = outcome {
        log_steps(ctx, "Manual fix:", MANUAL_CLEANUP_STEPS);
    }
    outcome.into_result(kind, ctx.trace_id())
}

pub fn push(ctx: &ActionContext, file: &SelectedFile, dest: &str) -> Result<String, AppError> {
    let target = ctx.require_target()?;
    validate_device_path(dest).map_err(|message| AppError::validation(message, ctx.trace_id()))?;
    let full_dest = push_destination(dest, &file.name);
    ctx.reporter.info(format!(
        "Sending {} ({}) to {full_dest}...",
        file.name, file.size_label
    ));

    reset_to_target(ctx, &target)?;
    run_transfer(
        ctx,
        TransferKind::Push,
        &target,
        &["push", &file.path, &full_dest],
        ctx.timeouts.transfer(),
    )?;
    ctx.reporter.success(format!("{} sent", file.name));
    ctx.reporter.notify(
        NotificationKind::Info,
        "Push complete",
        format!("File sent to:\n{full_dest}"),
    );
    Ok(full_dest)
}

pub fn install(ctx: &ActionContext, file: &SelectedFile) -> Result<(), AppError> {
    let target = ctx.require_target()?;
    if !file.is_apk {
        return Err(AppError::validation(
            format!("{} is not an APK", file.name),
            ctx.trace_id(),
        ));
    }
    ctx.reporter.info(format!("Installing {}...", file.name));

    reset_to_target(ctx, &target)?;
    run_transfer(
        ctx,
        TransferKind::Install,
        &target,
        &["install", &file.path],
        ctx.timeouts.install(),
    )?;
    ctx.reporter.success(format!("{} installed", file.name));
    ctx.reporter.notify(
        NotificationKind::Info,
        "Install complete",
        format!("APK installed: {}", file.name),
    );
    Ok(())
}

/// No server reset: the established connection is trusted.
pub fn pull(ctx: &ActionContext, remote: &str, local: &str) -> Result<(), AppError> {
    let target = ctx.require_target()?;
    validate_device_path(remote)
        .map_err(|message| AppError::validation(message, ctx.trace_id()))?;
    if local.trim().is_empty() {
        return Err(AppError::validation("local path is required", ctx.trace_id()));
    }
    ctx.reporter.info(format!("Downloading {remote}..."));

    run_transfer(
        ctx,
        TransferKind::Pull,
        &target,
        &["pull", remote.trim(), local.trim()],
        ctx.timeouts.transfer(),
    )?;
    ctx.reporter.success(format!("Downloaded to {}", local.trim()));
    ctx.reporter.notify(
        NotificationKind::Info,
        "Pull complete",
        format!("File saved to:\n{}", local.trim()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adb::testing::{devices_output, ScriptedRunner};
    use crate::app::context::testing::context;
    use crate::app::session::testing::log_messages;
    use crate::app::session::{ConnectionState, SessionHandle};

    const TARGET: &str = "1.2.3.4:5555";

    fn connect(session: &SessionHandle, target: &str) {
        session
            .transition(
                ConnectionEvent::Begin {
                    target: target.to_string(),
                },
                "t",
            )
            .expect("begin");
        session
            .transition(
                ConnectionEvent::Verified {
                    target: target.to_string(),
                },
                "t",
            )
            .expect("verified");
    }

    fn apk() -> SelectedFile {
        SelectedFile {
            path: "/tmp/app.apk".to_string(),
            name: "app.apk".to_string(),
            size_bytes: 2_097_152,
            size_label: size_label(2_097_152),
            is_apk: true,
        }
    }

    fn healthy_target(runner: &ScriptedRunner) {
        runner
            .on("adb devices", 0, &devices_output(&[(TARGET, "device")]), "")
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555", "");
    }

    #[test]
    fn formats_size_label_with_one_decimal() {
        assert_eq!(size_label(0), "0.0 MB");
        assert_eq!(size_label(1_048_576), "1.0 MB");
        assert_eq!(size_label(1_572_864), "1.5 MB");
    }

    #[test]
    fn apk_detection_ignores_case() {
        assert!(is_apk("/tmp/App.APK"));
        assert!(!is_apk("/tmp/app.apk.txt"));
    }

    #[test]
    fn describes_a_local_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Build.APK");
        std::fs::write(&path, vec![0u8; 1_572_864]).expect("write");
        let file = describe_file(&path.to_string_lossy()).expect("describe");
        assert_eq!(file.name, "Build.APK");
        assert_eq!(file.size_label, "1.5 MB");
        assert!(file.is_apk);
        assert!(describe_file(&dir.path().to_string_lossy()).is_err());
    }

    #[test]
    fn transfers_require_a_connected_target() {
        let runner = ScriptedRunner::new();
        let (ctx, _) = context(&runner);
        let err = install(&ctx, &apk()).expect_err("not connected");
        assert_eq!(err.code, "ERR_NOT_CONNECTED");
        let err = pull(&ctx, "/sdcard/a.txt", "/tmp/a.txt").expect_err("not connected");
        assert_eq!(err.code, "ERR_NOT_CONNECTED");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn ambiguous_install_retries_unscoped_exactly_once() {
        let runner = ScriptedRunner::new();
        healthy_target(&runner);
        runner
            .on(
                &format!("adb -s {TARGET} install /tmp/app.apk"),
                1,
                "",
                "adb: error: more than one device/emulator",
            )
            .on(
                "adb install /tmp/app.apk",
                1,
                "",
                "adb: error: more than one device/emulator",
            );
        let (ctx, session) = context(&runner);
        connect(&session, TARGET);

        let err = install(&ctx, &apk()).expect_err("still ambiguous");

        assert!(err.is_ambiguous_device());
        assert_eq!(runner.count(&format!("adb -s {TARGET} install /tmp/app.apk")), 1);
        assert_eq!(runner.count("adb install /tmp/app.apk"), 1);
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Force clean")));
    }

    #[test]
    fn ambiguous_push_succeeds_on_unscoped_retry() {
        let runner = ScriptedRunner::new();
        healthy_target(&runner);
        runner
            .on(
                &format!("adb -s {TARGET} push /tmp/app.apk /sdcard/Download/app.apk"),
                1,
                "",
                "error: more than one device",
            )
            .on("adb push /tmp/app.apk /sdcard/Download/app.apk", 0, "1 file pushed", "");
        let (ctx, session) = context(&runner);
        connect(&session, TARGET);

        let dest = push(&ctx, &apk(), "/sdcard/Download/").expect("push");

        assert_eq!(dest, "/sdcard/Download/app.apk");
        assert_eq!(runner.count("adb push /tmp/app.apk /sdcard/Download/app.apk"), 1);
        assert_eq!(runner.count("adb kill-server"), 1);
    }

    #[test]
    fn non_ambiguous_failure_is_not_retried() {
        let runner = ScriptedRunner::new();
        healthy_target(&runner);
        runner.on(
            &format!("adb -s {TARGET} install /tmp/app.apk"),
            0,
            "Failure [INSTALL_FAILED_VERSION_DOWNGRADE]",
            "",
        );
        let (ctx, session) = context(&runner);
        connect(&session, TARGET);

        let err = install(&ctx, &apk()).expect_err("failure");
        assert_eq!(err.code, "ERR_PROCESS");
        assert_eq!(runner.count("adb install /tmp/app.apk"), 0);
    }

    #[test]
    fn extra_devices_force_a_disconnect_all_before_transfer() {
        let runner = ScriptedRunner::new();
        let single = devices_output(&[(TARGET, "device")]);
        let crowded = devices_output(&[(TARGET, "device"), ("10.0.0.9:5555", "device")]);
        // server check, then three verification attempts, then the recovered list
        runner.on("adb devices", 0, &single, "");
        for _ in 0..3 {
            runner.on("adb devices", 0, &crowded, "");
        }
        runner
            .on("adb devices", 0, &single, "")
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555", "")
            .on(&format!("adb -s {TARGET} install /tmp/app.apk"), 0, "Success\n", "");
        let (ctx, session) = context(&runner);
        connect(&session, TARGET);

        install(&ctx, &apk()).expect("install");
        assert_eq!(runner.count("adb disconnect"), 1);
        assert_eq!(runner.count(&format!("adb connect {TARGET}")), 2);
    }

    #[test]
    fn devices_that_survive_cleanup_drop_the_connection() {
        let runner = ScriptedRunner::new();
        runner
            .on(
                "adb devices",
                0,
                &devices_output(&[(TARGET, "device"), ("10.0.0.9:5555", "device")]),
                "",
            )
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555", "");
        let (ctx, session) = context(&runner);
        connect(&session, TARGET);
        let file = SelectedFile {
            path: "/tmp/notes.txt".to_string(),
            name: "notes.txt".to_string(),
            size_bytes: 10,
            size_label: size_label(10),
            is_apk: false,
        };

        let err = push(&ctx, &file, "/sdcard/Download").expect_err("still crowded");

        assert!(err.is_ambiguous_device());
        assert_eq!(
            session.connection("t").expect("state"),
            ConnectionState::Disconnected
        );
        assert_eq!(runner.count_prefix(&format!("adb -s {TARGET} push")), 0);
        assert_eq!(runner.count_prefix("adb push"), 0);
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Still 2 devices attached")));
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Force clean")));
    }

    #[test]
    fn pull_skips_the_server_reset() {
        let runner = ScriptedRunner::new();
        runner.on(
            &format!("adb -s {TARGET} pull /sdcard/a.txt /tmp/a.txt"),
            0,
            "1 file pulled",
            "",
        );
        let (ctx, session) = context(&runner);
        connect(&session, TARGET);

        pull(&ctx, "/sdcard/a.txt", "/tmp/a.txt").expect("pull");
        assert_eq!(runner.count("adb kill-server"), 0);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn install_rejects_non_apk() {
        let runner = ScriptedRunner::new();
        let (ctx, session) = context(&runner);
        connect(&session, TARGET);
        let mut file = apk();
        file.is_apk = false;
        assert_eq!(install(&ctx, &file).expect_err("not apk").code, "ERR_VALIDATION");
    }
}
