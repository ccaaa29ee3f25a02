//! Connection controller: pair, connect, disconnect and the cleanup scripts
//! that keep adb from holding on to stale endpoints.

use crate::app::adb::endpoint::{ConnectRequest, PairRequest, Transport};
use crate::app::adb::locator::validate_adb_program;
use crate::app::adb::outcome::{classify_connect, classify_pair, require_success, ConnectOutcome, PairOutcome};
use crate::app::adb::parse::{
    attached_endpoints, network_endpoints, parse_adb_devices, parse_adb_version, usb_endpoints,
};
use crate::app::context::ActionContext;
use crate::app::error::AppError;
use crate::app::models::AdbInfo;
use crate::app::retry::{poll_until, sleep_with_cancel, Attempt};
use crate::app::session::{ConnectionEvent, ConnectionState};

pub const MANUAL_CLEANUP_STEPS: &[&str] = &[
    "Run 'Force clean' to reset the adb server",
    "Toggle WiFi on the device or reboot it",
    "Pair again if the wireless-debugging port changed",
];

pub const PAIRING_STEPS: &[&str] = &[
    "On the device open Settings > System > Developer options",
    "Enable 'Wireless debugging'",
    "Tap 'Pair device with pairing code' to see IP:PORT and the code",
    "Enter exactly those values here",
];

pub fn log_steps(ctx: &ActionContext, heading: &str, steps: &[&str]) {
    ctx.reporter.info(heading);
    for (index, step) in steps.iter().enumerate() {
        ctx.reporter.info(format!("   {}. {step}", index + 1));
    }
}

/// Drops a live connection before the server is restarted underneath it.
fn drop_connection_for_restart(ctx: &ActionContext) -> Result<(), AppError> {
    if ctx.reporter.connection()?.is_connected() {
        ctx.reporter.warn("Restarting the adb server drops the current connection");
        ctx.reporter.transition(ConnectionEvent::Disconnect)?;
    }
    Ok(())
}

/// Polls `adb devices` until the server answers.
pub fn wait_for_server(ctx: &ActionContext) -> Result<String, AppError> {
    let attempt = poll_until(&ctx.backoff, &ctx.token, ctx.trace_id(), |_| {
        let output = ctx.devices();
        if output.is_success() {
            Attempt::Done(output.stdout)
        } else {
            Attempt::Retry(output.detail())
        }
    })?;
    match attempt {
        Attempt::Done(stdout) => Ok(stdout),
        Attempt::Retry(detail) => Err(AppError::process(
            format!("ADB server did not come up: {detail}"),
            ctx.trace_id(),
        )),
    }
}

pub fn restart_server_steps(ctx: &ActionContext) -> Result<String, AppError> {
    ctx.adb.run(&["kill-server"], ctx.timeouts.kill());
    ctx.check_cancelled()?;
    let started = ctx.adb.run(&["start-server"], ctx.timeouts.start_server());
    require_success(&started, "adb start-server", ctx.trace_id())?;
    wait_for_server(ctx)
}

fn disconnect_endpoints(ctx: &ActionContext, endpoints: &[String]) {
    for endpoint in endpoints {
        ctx.reporter.info(format!("Disconnecting {endpoint}"));
        ctx.adb.run(&["disconnect", endpoint], ctx.timeouts.kill());
    }
}

/// Disconnects every attached network endpoint and waits until the list is clear.
fn clear_network_endpoints(ctx: &ActionContext) -> Result<(), AppError> {
    let listed = ctx.devices();
    let stale = network_endpoints(&listed.stdout);
    if stale.is_empty() {
        return Ok(());
    }
    ctx.reporter
        .info(format!("Cleaning {} existing network connection(s)", stale.len()));
    disconnect_endpoints(ctx, &stale);

    let attempt = poll_until(&ctx.backoff, &ctx.token, ctx.trace_id(), |_| {
        let remaining = network_endpoints(&ctx.devices().stdout);
        if remaining.is_empty() {
            Attempt::Done(())
        } else {
            disconnect_endpoints(ctx, &remaining);
            Attempt::Retry(remaining)
        }
    })?;
    if let Attempt::Retry(remaining) = attempt {
        ctx.reporter.warn(format!(
            "Still listed after cleanup: {}",
            remaining.join(", ")
        ));
    }
    Ok(())
}

/// Waits until the target is the only attached device of any transport.
/// Returns the last observed endpoints when it never is.
fn verify_single_target(ctx: &ActionContext, target: &str) -> Result<Result<(), Vec<String>>, AppError> {
    let attempt = poll_until(&ctx.backoff, &ctx.token, ctx.trace_id(), |_| {
        let endpoints = attached_endpoints(&ctx.devices().stdout);
        if endpoints.len() == 1 && endpoints[0] == target {
            Attempt::Done(())
        } else {
            Attempt::Retry(endpoints)
        }
    })?;
    Ok(match attempt {
        Attempt::Done(()) => Ok(()),
        Attempt::Retry(endpoints) => Err(endpoints),
    })
}

fn begin_connecting(ctx: &ActionContext, target: &str) -> Result<(), AppError> {
    match ctx.reporter.transition(ConnectionEvent::Begin {
        target: target.to_string(),
    })? {
        ConnectionState::Connecting { target: current } if current == target => Ok(()),
        _ => Err(AppError::busy(
            "Another connection attempt is in progress",
            ctx.trace_id(),
        )),
    }
}

/// Runs `steps` inside Connecting and settles the state machine either way.
fn run_connecting(
    ctx: &ActionContext,
    target: &str,
    steps: impl FnOnce() -> Result<(), AppError>,
) -> Result<ConnectionState, AppError> {
    begin_connecting(ctx, target)?;
    match steps() {
        Ok(()) => {
            let state = ctx.reporter.transition(ConnectionEvent::Verified {
                target: target.to_string(),
            })?;
            if let ConnectionState::Connected { transport, .. } = &state {
                ctx.reporter
                    .success(format!("Connected to {target} ({})", transport.label()));
            }
            Ok(state)
        }
        Err(err) => {
            ctx.reporter.transition(ConnectionEvent::Failed)?;
            Err(err)
        }
    }
}

pub fn connect_network(ctx: &ActionContext, request: &ConnectRequest) -> Result<ConnectionState, AppError> {
    let target = request.endpoint();
    ctx.reporter.info(format!("Connecting to {target}..."));
    run_connecting(ctx, &target, || {
        clear_network_endpoints(ctx)?;
        ctx.check_cancelled()?;

        let output = ctx.adb.run(&["connect", &target], ctx.timeouts.default_timeout());
        if let ConnectOutcome::Failed { detail } = classify_connect(&output) {
            log_steps(ctx, "Try the following:", MANUAL_CLEANUP_STEPS);
            return Err(AppError::process(detail, ctx.trace_id()));
        }

        match verify_single_target(ctx, &target)? {
            Ok(()) => {
                ctx.reporter.info("Single device verified");
                Ok(())
            }
            Err(endpoints) if endpoints.len() > 1 => {
                ctx.reporter.warn(format!(
                    "Multiple devices detected ({}): {}",
                    endpoints.len(),
                    endpoints.join(", ")
                ));
                log_steps(ctx, "Refusing to continue. Manual cleanup:", MANUAL_CLEANUP_STEPS);
                Err(AppError::ambiguous_device(
                    format!("{} devices attached, expected only {target}", endpoints.len()),
                    ctx.trace_id(),
                ))
            }
            Err(endpoints) => {
                let listed = if endpoints.is_empty() {
                    "nothing".to_string()
                } else {
                    endpoints.join(", ")
                };
                ctx.reporter
                    .error(format!("{target} is not listed after connect (found {listed})"));
                log_steps(ctx, "Try the following:", MANUAL_CLEANUP_STEPS);
                Err(AppError::process(
                    format!("{target} did not appear in adb devices"),
                    ctx.trace_id(),
                ))
            }
        }
    })
}

pub fn pair(ctx: &ActionContext, request: &PairRequest) -> Result<PairOutcome, AppError> {
    let endpoint = request.endpoint();
    ctx.reporter
        .info(format!("Pairing with {endpoint} using code {}...", request.code));
    drop_connection_for_restart(ctx)?;
    restart_server_steps(ctx)?;
    ctx.check_cancelled()?;

    let output = ctx
        .adb
        .run(&["pair", &endpoint, &request.code], ctx.timeouts.default_timeout());
    let outcome = classify_pair(&output);
    match &outcome {
        PairOutcome::Paired => {
            ctx.reporter.success("Pairing successful");
            ctx.reporter
                .info("Now enter the connection port shown on the device and press Connect");
        }
        PairOutcome::AlreadyPaired => {
            ctx.reporter.success("Device already paired");
            ctx.reporter.info("Enter the connection port and press Connect");
        }
        PairOutcome::Failed { detail } => {
            log_steps(ctx, "Check on the device:", PAIRING_STEPS);
            return Err(AppError::process(detail.clone(), ctx.trace_id()));
        }
    }
    Ok(outcome)
}

pub fn connect_usb(ctx: &ActionContext) -> Result<ConnectionState, AppError> {
    ctx.reporter.info("Checking USB devices...");
    let output = ctx.devices();
    require_success(&output, "adb devices", ctx.trace_id())?;
    let Some(serial) = usb_endpoints(&output.stdout).into_iter().next() else {
        return Err(AppError::process("No USB devices connected", ctx.trace_id()));
    };
    run_connecting(ctx, &serial, || Ok(()))
}

pub fn disconnect(ctx: &ActionContext) -> Result<ConnectionState, AppError> {
    if let Some(target) = ctx.reporter.connection()?.target() {
        if Transport::of(target) == Transport::Network {
            ctx.adb.run(&["disconnect", target], ctx.timeouts.kill());
        }
    }
    let state = ctx.reporter.transition(ConnectionEvent::Disconnect)?;
    ctx.reporter.info("Disconnected");
    Ok(state)
}

fn kill_host_adb(ctx: &ActionContext) {
    let output = if cfg!(windows) {
        ctx.adb
            .run_host("taskkill", &["/f", "/im", "adb.exe"], ctx.timeouts.kill())
    } else {
        ctx.adb.run_host("pkill", &["-x", "adb"], ctx.timeouts.kill())
    };
    // pkill exits 1 when nothing matched.
    if output.exit_code > 1 || output.exit_code < 0 {
        ctx.reporter
            .warn(format!("Could not kill adb processes: {}", output.detail()));
    }
}

fn force_clean_steps(ctx: &ActionContext) -> Result<(), AppError> {
    ctx.reporter.info("Stopping the adb server...");
    for attempt in 0..3 {
        let delay = ctx.backoff.delay_before(attempt);
        if !sleep_with_cancel(delay, &ctx.token) {
            return Err(AppError::cancelled(ctx.trace_id()));
        }
        ctx.adb.run(&["kill-server"], ctx.timeouts.kill());
    }
    kill_host_adb(ctx);
    ctx.check_cancelled()?;

    ctx.reporter.info("Starting a clean adb server...");
    let started = ctx.adb.run(&["start-server"], ctx.timeouts.start_server());
    if !started.is_success() {
        return Err(AppError::process(
            format!("Failed to start adb: {}", started.detail()),
            ctx.trace_id(),
        ));
    }
    let listed = wait_for_server(ctx)?;

    let residual = network_endpoints(&listed);
    if !residual.is_empty() {
        ctx.reporter.info(format!(
            "Disconnecting {} residual device(s)...",
            residual.len()
        ));
        disconnect_endpoints(ctx, &residual);
    }
    ctx.reporter.success("ADB cleanup complete, ready for a new connection");
    Ok(())
}

/// Always ends in `Disconnected`, whatever the individual steps did.
pub fn force_clean(ctx: &ActionContext) -> Result<ConnectionState, AppError> {
    ctx.reporter.info("Full ADB cleanup started");
    let result = force_clean_steps(ctx);
    let state = ctx.reporter.transition(ConnectionEvent::Disconnect)?;
    result.map(|()| state)
}

pub fn restart_server(ctx: &ActionContext) -> Result<(), AppError> {
    ctx.reporter.info("Restarting ADB...");
    drop_connection_for_restart(ctx)?;
    let listed = restart_server_steps(ctx)?;
    let devices = parse_adb_devices(&listed);
    ctx.reporter
        .success(format!("ADB restarted, {} device(s) listed", devices.len()));
    for device in devices {
        ctx.reporter.info(format!("  {}\t{}", device.serial, device.state));
    }
    Ok(())
}

pub fn check_adb(ctx: &ActionContext) -> AdbInfo {
    let program = ctx.adb.program().to_string();
    if let Err(message) = validate_adb_program(&program) {
        ctx.reporter.error(format!("ADB not available: {message}"));
        return AdbInfo {
            available: false,
            command_path: program,
            version: None,
            error: Some(message),
        };
    }

    let output = ctx.adb.run(&["version"], ctx.timeouts.default_timeout());
    if !output.is_success() {
        let detail = output.detail();
        ctx.reporter.error(format!("ADB not available: {detail}"));
        ctx.reporter
            .info("Install Android Platform Tools or set adb.command_path in the config file");
        return AdbInfo {
            available: false,
            command_path: program,
            version: None,
            error: Some(detail),
        };
    }

    let version = parse_adb_version(&output.stdout);
    ctx.reporter.success(format!("ADB found: {}", version.first_line));
    if let Some(tools) = &version.platform_tools {
        ctx.reporter.info(format!("Platform tools {tools}"));
    }

    let listed = ctx.devices();
    if listed.is_success() {
        let devices = parse_adb_devices(&listed.stdout);
        if devices.is_empty() {
            ctx.reporter.info("No devices attached");
        }
        for device in devices {
            ctx.reporter.info(format!("Device: {}\t{}", device.serial, device.state));
        }
    }

    AdbInfo {
        available: true,
        command_path: program,
        version: Some(version),
        error: None,
    }
}

pub fn status_report(ctx: &ActionContext) -> Result<String, AppError> {
    let devices = ctx.devices_long()?;
    let state = ctx.reporter.connection()?;
    let mut report = String::from("=== ADB STATUS ===\n");
    report.push_str(&format!("App version: {}\n", env!("CARGO_PKG_VERSION")));
    report.push_str(&format!("ADB: {}\n", ctx.adb.program()));
    match state.target() {
        Some(target) => report.push_str(&format!("Active target: {target}\n")),
        None => report.push_str("Active target: none\n"),
    }
    report.push_str(&format!("Devices: {}\n", devices.len()));
    for device in &devices {
        report.push_str(&format!(
            "\n{}\n  state: {}\n  type: {}\n",
            device.serial,
            device.state,
            Transport::of(&device.serial).label()
        ));
        if let Some(model) = &device.model {
            report.push_str(&format!("  model: {model}\n"));
        }
    }
    if devices.len() > 1 {
        report.push_str("\nWARNING: more than one device attached, transfers may be ambiguous\n");
    }
    for line in report.lines().filter(|line| !line.trim().is_empty()) {
        ctx.reporter.info(line);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adb::testing::{devices_output, ScriptedRunner};
    use crate::app::context::testing::context;
    use crate::app::session::testing::log_messages;

    const TARGET: &str = "1.2.3.4:5555";

    fn request() -> ConnectRequest {
        ConnectRequest::parse("1.2.3.4", "5555").expect("valid")
    }

    #[test]
    fn connects_when_exactly_the_target_remains() {
        let runner = ScriptedRunner::new();
        runner
            .on("adb devices", 0, &devices_output(&[]), "")
            .on("adb devices", 0, &devices_output(&[(TARGET, "device")]), "")
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555\n", "");
        let (ctx, session) = context(&runner);

        let state = connect_network(&ctx, &request()).expect("connect");

        assert_eq!(
            state,
            ConnectionState::Connected {
                target: TARGET.to_string(),
                transport: Transport::Network
            }
        );
        assert_eq!(session.connection("t").expect("state").target(), Some(TARGET));
    }

    #[test]
    fn multiple_devices_after_connect_fail_back_to_disconnected() {
        let runner = ScriptedRunner::new();
        runner
            .on("adb devices", 0, &devices_output(&[]), "")
            .on(
                "adb devices",
                0,
                &devices_output(&[(TARGET, "device"), ("1.2.3.4:41235", "device")]),
                "",
            )
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555\n", "");
        let (ctx, session) = context(&runner);

        let err = connect_network(&ctx, &request()).expect_err("must not connect");

        assert!(err.is_ambiguous_device());
        assert_eq!(
            session.connection("t").expect("state"),
            ConnectionState::Disconnected
        );
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Multiple devices detected (2)")));
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Force clean")));
    }

    #[test]
    fn attached_usb_device_makes_network_connect_ambiguous() {
        let runner = ScriptedRunner::new();
        runner
            .on("adb devices", 0, &devices_output(&[("R58M123ABC", "device")]), "")
            .on(
                "adb devices",
                0,
                &devices_output(&[("R58M123ABC", "device"), (TARGET, "device")]),
                "",
            )
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555\n", "");
        let (ctx, session) = context(&runner);

        let err = connect_network(&ctx, &request()).expect_err("usb device also attached");

        assert!(err.is_ambiguous_device());
        assert_eq!(
            session.connection("t").expect("state"),
            ConnectionState::Disconnected
        );
        assert_eq!(runner.count_prefix("adb disconnect"), 0);
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Multiple devices detected (2)")));
    }

    #[test]
    fn stale_endpoints_are_disconnected_before_connecting() {
        let runner = ScriptedRunner::new();
        runner
            .on("adb devices", 0, &devices_output(&[("10.0.0.9:5555", "device")]), "")
            .on("adb devices", 0, &devices_output(&[]), "")
            .on("adb devices", 0, &devices_output(&[(TARGET, "device")]), "")
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555\n", "");
        let (ctx, _session) = context(&runner);

        connect_network(&ctx, &request()).expect("connect");

        assert_eq!(runner.count("adb disconnect 10.0.0.9:5555"), 1);
        let calls = runner.calls();
        let disconnect_at = calls
            .iter()
            .position(|call| call == "adb disconnect 10.0.0.9:5555")
            .expect("disconnect call");
        let connect_at = calls
            .iter()
            .position(|call| call.starts_with("adb connect"))
            .expect("connect call");
        assert!(disconnect_at < connect_at);
    }

    #[test]
    fn refused_connect_is_a_failure() {
        let runner = ScriptedRunner::new();
        runner.on(
            &format!("adb connect {TARGET}"),
            1,
            "failed to connect to '1.2.3.4:5555': Connection refused\n",
            "",
        );
        let (ctx, session) = context(&runner);

        let err = connect_network(&ctx, &request()).expect_err("refused");
        assert_eq!(err.code, "ERR_PROCESS");
        assert_eq!(
            session.connection("t").expect("state"),
            ConnectionState::Disconnected
        );
    }

    fn pair_request() -> PairRequest {
        PairRequest::parse("1.2.3.4", "37000", "123456").expect("valid")
    }

    #[test]
    fn pairing_outcomes() {
        let runner = ScriptedRunner::new();
        runner.on(
            "adb pair 1.2.3.4:37000 123456",
            0,
            "Successfully paired to 1.2.3.4:37000 [guid=adb-1]\n",
            "",
        );
        let (ctx, session) = context(&runner);
        assert_eq!(pair(&ctx, &pair_request()).expect("paired"), PairOutcome::Paired);
        assert_eq!(runner.count("adb kill-server"), 1);
        assert_eq!(runner.count("adb start-server"), 1);
        assert_eq!(
            session.connection("t").expect("state"),
            ConnectionState::Disconnected
        );

        let runner = ScriptedRunner::new();
        runner.on("adb pair 1.2.3.4:37000 123456", 1, "Already Paired", "");
        let (ctx, _) = context(&runner);
        assert_eq!(
            pair(&ctx, &pair_request()).expect("already paired"),
            PairOutcome::AlreadyPaired
        );

        let runner = ScriptedRunner::new();
        runner.on("adb pair 1.2.3.4:37000 123456", 1, "", "Failed: Wrong password");
        let (ctx, session) = context(&runner);
        let err = pair(&ctx, &pair_request()).expect_err("failure");
        assert_eq!(err.error, "Failed: Wrong password");
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Wireless debugging")));
    }

    #[test]
    fn force_clean_twice_stays_disconnected() {
        let runner = ScriptedRunner::new();
        let (ctx, session) = context(&runner);

        for _ in 0..2 {
            let state = force_clean(&ctx).expect("clean");
            assert_eq!(state, ConnectionState::Disconnected);
            assert_eq!(
                session.connection("t").expect("state"),
                ConnectionState::Disconnected
            );
        }
        assert_eq!(runner.count("adb kill-server"), 6);
        assert_eq!(runner.count_prefix("pkill").max(runner.count_prefix("taskkill")), 2);
    }

    #[test]
    fn force_clean_resets_even_when_server_fails_to_start() {
        let runner = ScriptedRunner::new();
        runner
            .on("adb devices", 0, &devices_output(&[]), "")
            .on("adb devices", 0, &devices_output(&[(TARGET, "device")]), "")
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555\n", "")
            .on("adb start-server", 1, "", "cannot bind to 5037");
        let (ctx, session) = context(&runner);
        connect_network(&ctx, &request()).expect("connect");

        let err = force_clean(&ctx).expect_err("start-server fails");
        assert_eq!(err.code, "ERR_PROCESS");
        assert_eq!(
            session.connection("t").expect("state"),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn usb_connect_picks_first_serial_without_colon() {
        let runner = ScriptedRunner::new();
        runner.on(
            "adb devices",
            0,
            &devices_output(&[("1.2.3.4:5555", "device"), ("R58M123ABC", "device")]),
            "",
        );
        let (ctx, _) = context(&runner);
        let state = connect_usb(&ctx).expect("usb");
        assert_eq!(
            state,
            ConnectionState::Connected {
                target: "R58M123ABC".to_string(),
                transport: Transport::Usb
            }
        );
    }

    #[test]
    fn usb_connect_without_devices_fails() {
        let runner = ScriptedRunner::new();
        runner.on("adb devices", 0, &devices_output(&[]), "");
        let (ctx, _) = context(&runner);
        assert_eq!(connect_usb(&ctx).expect_err("none").code, "ERR_PROCESS");
    }

    #[test]
    fn disconnect_drops_network_target() {
        let runner = ScriptedRunner::new();
        runner
            .on("adb devices", 0, &devices_output(&[]), "")
            .on("adb devices", 0, &devices_output(&[(TARGET, "device")]), "")
            .on(&format!("adb connect {TARGET}"), 0, "connected to 1.2.3.4:5555\n", "");
        let (ctx, _) = context(&runner);
        connect_network(&ctx, &request()).expect("connect");

        assert_eq!(disconnect(&ctx).expect("disconnect"), ConnectionState::Disconnected);
        assert_eq!(runner.count(&format!("adb disconnect {TARGET}")), 1);
    }

    #[test]
    fn check_adb_reports_version_or_soft_fails() {
        let runner = ScriptedRunner::new();
        runner.on(
            "adb version",
            0,
            "Android Debug Bridge version 1.0.41\nVersion 34.0.5-10900879\n",
            "",
        );
        let (ctx, _) = context(&runner);
        let info = check_adb(&ctx);
        assert!(info.available);
        assert_eq!(
            info.version.and_then(|version| version.protocol).as_deref(),
            Some("1.0.41")
        );

        let runner = ScriptedRunner::new();
        runner.on("adb version", -1, "", "No such file or directory (os error 2)");
        let (ctx, _) = context(&runner);
        let info = check_adb(&ctx);
        assert!(!info.available);
        assert!(info.error.is_some());
    }

    #[test]
    fn status_report_lists_devices_with_transport() {
        let runner = ScriptedRunner::new();
        runner.on(
            "adb devices -l",
            0,
            "List of devices attached\nR58M123ABC device model:SM_G991B\n1.2.3.4:5555 device\n",
            "",
        );
        let (ctx, _) = context(&runner);
        let report = status_report(&ctx).expect("report");
        assert!(report.contains("Devices: 2"));
        assert!(report.contains("type: USB"));
        assert!(report.contains("type: Network"));
        assert!(report.contains("model: SM_G991B"));
        assert!(report.contains("more than one device"));
    }
}
