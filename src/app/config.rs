use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::error::AppError;

pub const DEFAULT_IP: &str = "192.168.1.80";
pub const DEFAULT_SCAN_PORT: u16 = 5555;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdbSettings {
    /// Explicit path to the adb executable. Empty means "locate it".
    pub command_path: String,
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            command_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSettings {
    pub default_ip: String,
    pub default_port: String,
    pub default_push_dir: String,
    pub default_pull_path: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            default_ip: DEFAULT_IP.to_string(),
            default_port: String::new(),
            default_push_dir: "/sdcard/Download/".to_string(),
            default_pull_path: "/sdcard/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutSettings {
    pub default_secs: u64,
    pub transfer_secs: u64,
    pub install_secs: u64,
    pub console_secs: u64,
    pub kill_secs: u64,
    pub start_server_secs: u64,
    pub scan_connect_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            default_secs: 30,
            transfer_secs: 300,
            install_secs: 120,
            console_secs: 60,
            kill_secs: 10,
            start_server_secs: 15,
            scan_connect_ms: 1000,
        }
    }
}

impl TimeoutSettings {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_secs)
    }

    pub fn transfer(&self) -> Duration {
        Duration::from_secs(self.transfer_secs)
    }

    pub fn install(&self) -> Duration {
        Duration::from_secs(self.install_secs)
    }

    pub fn console(&self) -> Duration {
        Duration::from_secs(self.console_secs)
    }

    pub fn kill(&self) -> Duration {
        Duration::from_secs(self.kill_secs)
    }

    pub fn start_server(&self) -> Duration {
        Duration::from_secs(self.start_server_secs)
    }

    pub fn scan_connect(&self) -> Duration {
        Duration::from_millis(self.scan_connect_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay_ms: 250,
            max_delay_ms: 4000,
            multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerSettings {
    pub global_limit: usize,
    pub scan_workers: usize,
    pub scan_port: u16,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            global_limit: 4,
            scan_workers: 32,
            scan_port: DEFAULT_SCAN_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub log_level: String,
    /// `None` picks JSON for release builds and plain text for debug builds.
    pub json_output: Option<bool>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbSettings,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("ADB_MANAGER_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".adb_manager_config.json")
}

/// Read-only: the app never writes this file back.
pub fn load_config() -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path())
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), ""))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::system(format!("Failed to parse config: {err}"), ""))?;
    Ok(validate_config(config))
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    let defaults = AppConfig::default();
    if config.connection.default_ip.trim().is_empty() {
        config.connection.default_ip = defaults.connection.default_ip.clone();
    }
    if config.connection.default_push_dir.trim().is_empty() {
        config.connection.default_push_dir = defaults.connection.default_push_dir.clone();
    }
    if config.connection.default_pull_path.trim().is_empty() {
        config.connection.default_pull_path = defaults.connection.default_pull_path.clone();
    }

    let timeouts = &mut config.timeouts;
    if timeouts.default_secs == 0 {
        timeouts.default_secs = defaults.timeouts.default_secs;
    }
    if timeouts.transfer_secs == 0 {
        timeouts.transfer_secs = defaults.timeouts.transfer_secs;
    }
    if timeouts.install_secs == 0 {
        timeouts.install_secs = defaults.timeouts.install_secs;
    }
    if timeouts.console_secs == 0 {
        timeouts.console_secs = defaults.timeouts.console_secs;
    }
    if timeouts.kill_secs == 0 {
        timeouts.kill_secs = defaults.timeouts.kill_secs;
    }
    if timeouts.start_server_secs == 0 {
        timeouts.start_server_secs = defaults.timeouts.start_server_secs;
    }
    if !(50..=10_000).contains(&timeouts.scan_connect_ms) {
        timeouts.scan_connect_ms = defaults.timeouts.scan_connect_ms;
    }

    let retry = &mut config.retry;
    if retry.max_attempts == 0 || retry.max_attempts > 30 {
        retry.max_attempts = defaults.retry.max_attempts;
    }
    if retry.multiplier == 0 {
        retry.multiplier = defaults.retry.multiplier;
    }
    if retry.max_delay_ms < retry.initial_delay_ms {
        retry.max_delay_ms = retry.initial_delay_ms;
    }

    let scheduler = &mut config.scheduler;
    if scheduler.global_limit == 0 {
        scheduler.global_limit = defaults.scheduler.global_limit;
    }
    if scheduler.scan_workers == 0 || scheduler.scan_workers > 254 {
        scheduler.scan_workers = defaults.scheduler.scan_workers;
    }
    if scheduler.scan_port == 0 {
        scheduler.scan_port = defaults.scheduler.scan_port;
    }

    if config.logging.log_level.trim().is_empty() {
        config.logging.log_level = defaults.logging.log_level;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_from_path(&dir.path().join("absent.json")).expect("load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.connection.default_ip, "192.168.1.80");
        assert_eq!(config.timeouts.transfer_secs, 300);
        assert_eq!(config.timeouts.install_secs, 120);
    }

    #[test]
    fn partial_file_keeps_defaults_for_other_sections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "connection": { "default_ip": "10.0.0.7", "default_port": "5555",
                 "default_push_dir": "/sdcard/", "default_pull_path": "/sdcard/DCIM/" } }"#,
        )
        .expect("write");
        let config = load_config_from_path(&path).expect("load");
        assert_eq!(config.connection.default_ip, "10.0.0.7");
        assert_eq!(config.connection.default_port, "5555");
        assert_eq!(config.timeouts, TimeoutSettings::default());
    }

    #[test]
    fn unparseable_file_is_a_system_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").expect("write");
        let err = load_config_from_path(&path).expect_err("should fail");
        assert_eq!(err.code, "ERR_SYSTEM");
    }

    #[test]
    fn clamps_invalid_values() {
        let mut config = AppConfig::default();
        config.timeouts.default_secs = 0;
        config.timeouts.scan_connect_ms = 5;
        config.retry.max_attempts = 0;
        config.retry.initial_delay_ms = 500;
        config.retry.max_delay_ms = 100;
        config.scheduler.global_limit = 0;
        config.scheduler.scan_workers = 1000;
        config.connection.default_ip = "  ".to_string();
        let validated = validate_config(config);
        assert_eq!(validated.timeouts.default_secs, 30);
        assert_eq!(validated.timeouts.scan_connect_ms, 1000);
        assert_eq!(validated.retry.max_attempts, 6);
        assert_eq!(validated.retry.max_delay_ms, 500);
        assert_eq!(validated.scheduler.global_limit, 4);
        assert_eq!(validated.scheduler.scan_workers, 32);
        assert_eq!(validated.connection.default_ip, DEFAULT_IP);
    }
}
