//! Free-form adb command line and its output buffer.

use std::fs;
use std::path::Path;

use crate::app::adb::runner::CommandOutput;
use crate::app::context::ActionContext;
use crate::app::error::AppError;
use crate::app::models::{HostCommandResult, QuickCommand};

/// Quick command that clears the output instead of running anything.
pub const CLEAR_COMMAND: &str = "clear";

const QUICK_COMMANDS: &[(&str, &str)] = &[
    ("devices", "adb devices"),
    ("info", "adb shell getprop ro.build.version.release"),
    ("reboot", "adb reboot"),
    ("logcat", "adb logcat -d"),
    ("/sdcard", "adb shell ls -la /sdcard"),
    ("Download", "adb shell ls -la /sdcard/Download"),
    ("storage", "adb shell df -h"),
    ("battery", "adb shell \"dumpsys battery | grep level\""),
    ("packages", "adb shell pm list packages -3"),
    ("processes", "adb shell ps"),
    ("meminfo", "adb shell \"cat /proc/meminfo | head -10\""),
    ("volume", "adb shell media volume --show"),
    ("brightness", "adb shell settings get system screen_brightness"),
    ("wifi", "adb shell \"dumpsys wifi | head -20\""),
    ("uninstall", "adb uninstall "),
    ("recovery", "adb reboot recovery"),
    ("airplane", "adb shell settings get global airplane_mode_on"),
    ("data", "adb shell svc data enable"),
    ("clear", CLEAR_COMMAND),
];

pub fn quick_commands() -> Vec<QuickCommand> {
    QUICK_COMMANDS
        .iter()
        .map(|(label, command)| QuickCommand {
            label: label.to_string(),
            command: command.to_string(),
        })
        .collect()
}

/// Splits with shell quoting rules, prefixes `adb` when missing and scopes to
/// `target` unless the user already passed `-s`.
pub fn prepare_command(input: &str, target: Option<&str>) -> Result<Vec<String>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Empty command".to_string());
    }
    let mut tokens =
        shell_words::split(input).map_err(|err| format!("Cannot parse command: {err}"))?;
    if tokens.first().map(String::as_str) != Some("adb") {
        tokens.insert(0, "adb".to_string());
    }
    if let Some(target) = target {
        if !tokens.iter().any(|token| token == "-s") {
            tokens.insert(1, "-s".to_string());
            tokens.insert(2, target.to_string());
        }
    }
    Ok(tokens)
}

const HOST_PIPE_NOTE: &str = "Note: '|' is passed to adb as an argument and no host shell runs. \
Quote the device command to pipe on the device, e.g. adb shell \"logcat -d | grep foo\"\n";

/// Commands run without a host shell, so a bare `|` token reaches adb as-is.
fn has_host_pipe(tokens: &[String]) -> bool {
    tokens.iter().any(|token| token == "|")
}

pub fn format_output(output: &CommandOutput) -> String {
    let mut text = String::new();
    if !output.stdout.is_empty() {
        text.push_str(&output.stdout);
    }
    if !output.stderr.is_empty() {
        text.push_str(&format!("\nERROR:\n{}", output.stderr));
    }
    if output.is_success() {
        text.push_str("\nCommand completed successfully\n\n");
    } else {
        text.push_str(&format!("\nCommand failed (exit code: {})\n\n", output.exit_code));
    }
    text
}

pub fn run_console(ctx: &ActionContext, input: &str) -> Result<HostCommandResult, AppError> {
    let session = ctx.reporter.session();
    let state = ctx.reporter.connection()?;
    let tokens = match prepare_command(input, state.target()) {
        Ok(tokens) => tokens,
        Err(message) => {
            session.console_append(format!("Error: {message}\n"));
            return Err(AppError::validation(message, ctx.trace_id()));
        }
    };
    session.console_append(format!("$ {}\n", shell_words::join(&tokens)));
    if has_host_pipe(&tokens) {
        ctx.reporter.warn("Host-side pipes are not supported in the console");
        session.console_append(HOST_PIPE_NOTE);
    }

    let output = ctx.adb.run_owned(&tokens[1..], ctx.timeouts.console());
    session.console_append(format_output(&output));
    Ok(HostCommandResult {
        stdout: output.stdout,
        stderr: output.stderr,
        exit_code: output.exit_code,
    })
}

pub fn save_output(path: &Path, text: &str, trace_id: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::validation("No output to save", trace_id));
    }
    fs::write(path, text)
        .map_err(|err| AppError::system(format!("Failed to save output: {err}"), trace_id))
}

/// Kills host-side logcat readers left running by console commands.
pub fn kill_logcat(ctx: &ActionContext) {
    let output = if cfg!(windows) {
        ctx.adb
            .run_host("taskkill", &["/f", "/im", "adb.exe"], ctx.timeouts.kill())
    } else {
        ctx.adb.run_host("pkill", &["-f", "logcat"], ctx.timeouts.kill())
    };
    if output.exit_code < 0 {
        ctx.reporter
            .warn(format!("Could not kill logcat: {}", output.detail()));
    }
    ctx.reporter.warn("Logcat processes terminated");
    ctx.reporter
        .session()
        .console_append("Logcat processes terminated\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adb::testing::ScriptedRunner;
    use crate::app::context::testing::context;
    use crate::app::session::testing::log_messages;
    use crate::app::session::ConnectionEvent;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn prefixes_adb_and_injects_target() {
        assert_eq!(
            prepare_command("shell ls /sdcard", Some("1.2.3.4:5555")).expect("ok"),
            strings(&["adb", "-s", "1.2.3.4:5555", "shell", "ls", "/sdcard"])
        );
        assert_eq!(
            prepare_command("adb devices", None).expect("ok"),
            strings(&["adb", "devices"])
        );
    }

    #[test]
    fn explicit_serial_is_kept() {
        assert_eq!(
            prepare_command("adb -s R58M shell ps", Some("1.2.3.4:5555")).expect("ok"),
            strings(&["adb", "-s", "R58M", "shell", "ps"])
        );
    }

    #[test]
    fn quoted_pipes_stay_one_argument() {
        assert_eq!(
            prepare_command("adb shell \"dumpsys battery | grep level\"", None).expect("ok"),
            strings(&["adb", "shell", "dumpsys battery | grep level"])
        );
    }

    #[test]
    fn rejects_empty_and_unbalanced_input() {
        assert!(prepare_command("   ", None).is_err());
        assert!(prepare_command("adb shell \"echo", None).is_err());
    }

    #[test]
    fn formats_stdout_stderr_and_trailer() {
        let ok = format_output(&CommandOutput::new(0, "List of devices attached\n", ""));
        assert!(ok.starts_with("List of devices attached"));
        assert!(ok.contains("completed successfully"));

        let failed = format_output(&CommandOutput::new(1, "", "error: no devices"));
        assert!(failed.contains("ERROR:\nerror: no devices"));
        assert!(failed.contains("exit code: 1"));
    }

    #[test]
    fn quick_commands_include_clear() {
        let commands = quick_commands();
        assert_eq!(commands.len(), 19);
        assert!(commands.iter().any(|command| command.command == CLEAR_COMMAND));
    }

    #[test]
    fn console_run_appends_command_and_output() {
        let runner = ScriptedRunner::new();
        runner.on("adb -s R58M shell ps", 0, "PID NAME\n", "");
        let (ctx, session) = context(&runner);
        for event in [
            ConnectionEvent::Begin {
                target: "R58M".to_string(),
            },
            ConnectionEvent::Verified {
                target: "R58M".to_string(),
            },
        ] {
            session.transition(event, "t").expect("transition");
        }

        let result = run_console(&ctx, "shell ps").expect("run");
        assert_eq!(result.exit_code, 0);
        let console = session.snapshot("t").expect("snapshot").console_output;
        assert!(console.starts_with("$ adb -s R58M shell ps\n"));
        assert!(console.contains("PID NAME"));
    }

    #[test]
    fn unquoted_pipe_adds_a_console_note() {
        let runner = ScriptedRunner::new();
        runner.on("adb logcat -d | grep foo", 1, "", "adb: unknown argument |");
        let (ctx, session) = context(&runner);

        run_console(&ctx, "adb logcat -d | grep foo").expect("run");

        let console = session.snapshot("t").expect("snapshot").console_output;
        assert!(console.contains("no host shell runs"));
        assert!(log_messages(&session)
            .iter()
            .any(|line| line.contains("Host-side pipes are not supported")));
        assert!(has_host_pipe(&strings(&["adb", "logcat", "|", "grep"])));
        assert!(!has_host_pipe(&strings(&[
            "adb",
            "shell",
            "dumpsys battery | grep level"
        ])));
    }

    #[test]
    fn save_output_refuses_empty_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        assert_eq!(
            save_output(&path, "  \n", "t").expect_err("empty").code,
            "ERR_VALIDATION"
        );
        save_output(&path, "$ adb devices\n", "t").expect("save");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "$ adb devices\n");
    }
}
