use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Exit code reported when the process timed out or never started.
pub const FAILED_EXIT_CODE: i32 = -1;
pub const TIMEOUT_MESSAGE: &str = "Timeout";

/// The `(exit code, stdout, stderr)` triple every external call produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self::new(FAILED_EXIT_CODE, "", TIMEOUT_MESSAGE)
    }

    pub fn launch_failed(message: impl Into<String>) -> Self {
        Self::new(FAILED_EXIT_CODE, "", message)
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn is_timeout(&self) -> bool {
        self.exit_code == FAILED_EXIT_CODE && self.stdout.is_empty() && self.stderr == TIMEOUT_MESSAGE
    }

    /// stderr, else stdout, else a generic message. Used for user-facing errors.
    pub fn detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        "Unknown error".to_string()
    }

    pub fn combined_lowercase(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr).to_lowercase()
    }
}

/// Seam between the controllers and the operating system.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> CommandOutput;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> CommandOutput {
        run_command_with_timeout(program, args, timeout)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::<u8>::new();
        let mut temp = [0u8; 4096];
        loop {
            match reader.read(&mut temp) {
                Ok(0) => break,
                Ok(count) => buffer.extend_from_slice(&temp[..count]),
                Err(_) => break,
            }
        }
        buffer
    })
}

/// Runs `program args...` without a shell. Never fails: timeouts and launch
/// errors are folded into the returned triple.
pub fn run_command_with_timeout(program: &str, args: &[String], timeout: Duration) -> CommandOutput {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            warn!(program = %program, error = %err, "failed to spawn command");
            return CommandOutput::launch_failed(err.to_string());
        }
    };

    // Drain stdout/stderr in parallel; otherwise, a chatty child process can block once the pipe
    // buffer fills, and we will incorrectly hit the timeout.
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return CommandOutput::launch_failed("Failed to capture process output");
    };
    let stdout_handle = drain(stdout);
    let stderr_handle = drain(stderr);

    let start = Instant::now();
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code().unwrap_or(FAILED_EXIT_CODE),
            Ok(None) => {
                if start.elapsed() > timeout {
                    // Readers are left detached: a grandchild may still hold the pipes.
                    let _ = child.kill();
                    let _ = child.wait();
                    debug!(program = %program, timeout_ms = timeout.as_millis() as u64, "command timed out");
                    return CommandOutput::timed_out();
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                let _ = child.kill();
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return CommandOutput::launch_failed(format!("Failed to poll command: {err}"));
            }
        }
    };

    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();

    CommandOutput {
        exit_code,
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
    }
}

/// An adb executable bound to a runner and the trace id of the current action.
#[derive(Clone)]
pub struct Adb {
    program: String,
    runner: Arc<dyn CommandRunner>,
    trace_id: String,
}

impl Adb {
    pub fn new(
        program: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            runner,
            trace_id: trace_id.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn run(&self, args: &[&str], timeout: Duration) -> CommandOutput {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.run_owned(&args, timeout)
    }

    pub fn run_owned(&self, args: &[String], timeout: Duration) -> CommandOutput {
        debug!(trace_id = %self.trace_id, program = %self.program, args = ?args, "adb");
        let output = self.runner.run(&self.program, args, timeout);
        debug!(
            trace_id = %self.trace_id,
            exit_code = output.exit_code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "adb finished"
        );
        output
    }

    /// Prefixes `-s <serial>` when a serial is given.
    pub fn run_on(&self, serial: Option<&str>, args: &[&str], timeout: Duration) -> CommandOutput {
        let mut full: Vec<&str> = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = serial {
            full.push("-s");
            full.push(serial);
        }
        full.extend_from_slice(args);
        self.run(&full, timeout)
    }

    /// Runs a non-adb host program through the same runner (pkill, taskkill).
    pub fn run_host(&self, program: &str, args: &[&str], timeout: Duration) -> CommandOutput {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        debug!(trace_id = %self.trace_id, program = %program, args = ?args, "host command");
        self.runner.run(program, &args, timeout)
    }
}
