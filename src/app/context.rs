use crate::app::adb::parse::parse_adb_devices;
use crate::app::adb::runner::{Adb, CommandOutput};
use crate::app::config::TimeoutSettings;
use crate::app::error::AppError;
use crate::app::models::DeviceSummary;
use crate::app::retry::{Backoff, CancelToken};
use crate::app::session::Reporter;

/// Everything one worker needs to run a controller operation.
#[derive(Clone)]
pub struct ActionContext {
    pub adb: Adb,
    pub timeouts: TimeoutSettings,
    pub backoff: Backoff,
    pub token: CancelToken,
    pub reporter: Reporter,
}

impl ActionContext {
    pub fn trace_id(&self) -> &str {
        self.reporter.trace_id()
    }

    pub fn check_cancelled(&self) -> Result<(), AppError> {
        self.token.check(self.trace_id())
    }

    pub fn devices(&self) -> CommandOutput {
        self.adb.run(&["devices"], self.timeouts.default_timeout())
    }

    pub fn devices_long(&self) -> Result<Vec<DeviceSummary>, AppError> {
        let output = self.adb.run(&["devices", "-l"], self.timeouts.default_timeout());
        crate::app::adb::outcome::require_success(&output, "adb devices -l", self.trace_id())?;
        Ok(parse_adb_devices(&output.stdout))
    }

    /// The connected target, or `ERR_NOT_CONNECTED`.
    pub fn require_target(&self) -> Result<String, AppError> {
        self.reporter
            .connection()?
            .target()
            .map(str::to_string)
            .ok_or_else(|| AppError::not_connected(self.trace_id()))
    }
}
