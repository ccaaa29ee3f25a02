use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
}

impl AppError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
        }
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_VALIDATION", message, trace_id)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_SYSTEM", message, trace_id)
    }

    pub fn timeout(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_TIMEOUT", message, trace_id)
    }

    pub fn process(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_PROCESS", message, trace_id)
    }

    pub fn ambiguous_device(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_AMBIGUOUS_DEVICE", message, trace_id)
    }

    pub fn not_connected(trace_id: impl Into<String>) -> Self {
        Self::new("ERR_NOT_CONNECTED", "Device not connected", trace_id)
    }

    pub fn busy(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new("ERR_BUSY", message, trace_id)
    }

    pub fn cancelled(trace_id: impl Into<String>) -> Self {
        Self::new("ERR_CANCELLED", "Operation cancelled", trace_id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == "ERR_CANCELLED"
    }

    pub fn is_ambiguous_device(&self) -> bool {
        self.code == "ERR_AMBIGUOUS_DEVICE"
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for AppError {}
