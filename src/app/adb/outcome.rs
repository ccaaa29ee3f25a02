//! The one place where adb's human-readable output is turned into outcomes.
//! If adb changes its phrasing, these matchers are what needs updating.

use crate::app::adb::runner::CommandOutput;
use crate::app::error::AppError;

const PAIRED_MARKER: &str = "Successfully paired";
const ALREADY_PAIRED_MARKER: &str = "already paired";
const CONNECTED_MARKER: &str = "connected";
const AMBIGUOUS_DEVICE_MARKER: &str = "more than one device";
const INSTALL_SUCCESS_MARKER: &str = "Success";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    Paired,
    AlreadyPaired,
    Failed { detail: String },
}

pub fn classify_pair(output: &CommandOutput) -> PairOutcome {
    if output.is_success() && output.stdout.contains(PAIRED_MARKER) {
        return PairOutcome::Paired;
    }
    if output.stdout.to_lowercase().contains(ALREADY_PAIRED_MARKER) {
        return PairOutcome::AlreadyPaired;
    }
    PairOutcome::Failed {
        detail: output.detail(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    Failed { detail: String },
}

pub fn classify_connect(output: &CommandOutput) -> ConnectOutcome {
    let stdout = output.stdout.to_lowercase();
    let refused = stdout.contains("failed") || stdout.contains("unable");
    if output.is_success() && stdout.contains(CONNECTED_MARKER) && !refused {
        ConnectOutcome::Connected
    } else {
        ConnectOutcome::Failed {
            detail: output.detail(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    AmbiguousDevice { detail: String },
    TimedOut,
    Failed { detail: String },
}

/// Push and pull succeed on exit code 0. Install additionally needs
/// "Success" on stdout, because `adb install` can exit 0 on some failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Push,
    Pull,
    Install,
}

impl TransferKind {
    pub fn verb(self) -> &'static str {
        match self {
            TransferKind::Push => "push",
            TransferKind::Pull => "pull",
            TransferKind::Install => "install",
        }
    }
}

pub fn classify_transfer(kind: TransferKind, output: &CommandOutput) -> TransferOutcome {
    if output.is_timeout() {
        return TransferOutcome::TimedOut;
    }
    let completed = match kind {
        TransferKind::Install => output.is_success() && output.stdout.contains(INSTALL_SUCCESS_MARKER),
        TransferKind::Push | TransferKind::Pull => output.is_success(),
    };
    if completed {
        return TransferOutcome::Completed;
    }
    if is_ambiguous_device(&output.combined_lowercase()) {
        return TransferOutcome::AmbiguousDevice {
            detail: output.detail(),
        };
    }
    TransferOutcome::Failed {
        detail: output.detail(),
    }
}

pub fn is_ambiguous_device(text: &str) -> bool {
    text.to_lowercase().contains(AMBIGUOUS_DEVICE_MARKER)
}

impl TransferOutcome {
    pub fn into_result(self, kind: TransferKind, trace_id: &str) -> Result<(), AppError> {
        match self {
            TransferOutcome::Completed => Ok(()),
            TransferOutcome::TimedOut => Err(AppError::timeout(
                format!("adb {} timed out", kind.verb()),
                trace_id,
            )),
            TransferOutcome::AmbiguousDevice { detail } => {
                Err(AppError::ambiguous_device(detail, trace_id))
            }
            TransferOutcome::Failed { detail } => Err(AppError::process(detail, trace_id)),
        }
    }
}

/// Maps a generic command result (no special markers) to an error.
pub fn require_success(output: &CommandOutput, what: &str, trace_id: &str) -> Result<(), AppError> {
    if output.is_timeout() {
        return Err(AppError::timeout(format!("{what}: Timeout"), trace_id));
    }
    if !output.is_success() {
        return Err(AppError::process(
            format!("{what}: {}", output.detail()),
            trace_id,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput::new(code, stdout, stderr)
    }

    #[test]
    fn pairing_success_needs_marker_and_zero_exit() {
        assert_eq!(
            classify_pair(&out(0, "Successfully paired to 192.168.1.80:37000 [guid=adb-XYZ]\n", "")),
            PairOutcome::Paired
        );
        assert!(matches!(
            classify_pair(&out(1, "Successfully paired to 192.168.1.80:37000", "")),
            PairOutcome::Failed { .. }
        ));
    }

    #[test]
    fn already_paired_is_case_insensitive() {
        assert_eq!(
            classify_pair(&out(1, "Device ALREADY Paired", "")),
            PairOutcome::AlreadyPaired
        );
        assert_eq!(
            classify_pair(&out(0, "already paired", "")),
            PairOutcome::AlreadyPaired
        );
    }

    #[test]
    fn other_pairing_output_fails_with_detail() {
        assert_eq!(
            classify_pair(&out(1, "", "Failed: Wrong password or connection was dropped.")),
            PairOutcome::Failed {
                detail: "Failed: Wrong password or connection was dropped.".to_string()
            }
        );
        assert_eq!(
            classify_pair(&out(0, "Enter pairing code:", "")),
            PairOutcome::Failed {
                detail: "Enter pairing code:".to_string()
            }
        );
        assert!(matches!(
            classify_pair(&CommandOutput::timed_out()),
            PairOutcome::Failed { detail } if detail == "Timeout"
        ));
    }

    #[test]
    fn connect_outcomes() {
        assert_eq!(
            classify_connect(&out(0, "connected to 192.168.1.80:5555\n", "")),
            ConnectOutcome::Connected
        );
        assert_eq!(
            classify_connect(&out(0, "already connected to 192.168.1.80:5555\n", "")),
            ConnectOutcome::Connected
        );
        assert!(matches!(
            classify_connect(&out(0, "failed to connect to '192.168.1.80:5555': Connection refused\n", "")),
            ConnectOutcome::Failed { .. }
        ));
        assert!(matches!(
            classify_connect(&out(1, "", "cannot connect")),
            ConnectOutcome::Failed { .. }
        ));
    }

    #[test]
    fn transfer_outcomes() {
        assert_eq!(
            classify_transfer(TransferKind::Push, &out(0, "1 file pushed", "")),
            TransferOutcome::Completed
        );
        assert_eq!(
            classify_transfer(TransferKind::Install, &out(0, "Performing Streamed Install\nSuccess\n", "")),
            TransferOutcome::Completed
        );
        assert!(matches!(
            classify_transfer(TransferKind::Install, &out(0, "Failure [INSTALL_FAILED_OLDER_SDK]", "")),
            TransferOutcome::Failed { .. }
        ));
        assert!(matches!(
            classify_transfer(TransferKind::Push, &out(1, "", "adb: error: more than one device/emulator")),
            TransferOutcome::AmbiguousDevice { .. }
        ));
        assert_eq!(
            classify_transfer(TransferKind::Pull, &CommandOutput::timed_out()),
            TransferOutcome::TimedOut
        );
    }

    #[test]
    fn transfer_outcome_maps_to_error_codes() {
        let err = TransferOutcome::TimedOut
            .into_result(TransferKind::Push, "t")
            .expect_err("timeout");
        assert_eq!(err.code, "ERR_TIMEOUT");
        let err = TransferOutcome::AmbiguousDevice {
            detail: "more than one device".to_string(),
        }
        .into_result(TransferKind::Install, "t")
        .expect_err("ambiguous");
        assert!(err.is_ambiguous_device());
        assert!(TransferOutcome::Completed
            .into_result(TransferKind::Pull, "t")
            .is_ok());
    }
}
