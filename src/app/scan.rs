//! /24 sweep for hosts with the adb TCP port open.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::app::adb::endpoint::scan_base;
use crate::app::error::AppError;
use crate::app::models::{EndpointAutofill, ScanReport};
use crate::app::retry::CancelToken;
use crate::app::session::Reporter;

const FIRST_HOST: u8 = 1;
const LAST_HOST: u8 = 254;
const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub port: u16,
    pub workers: usize,
    pub connect_timeout: Duration,
}

/// What a single connect attempt learned about a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostReach {
    AdbOpen,
    /// Answered, but refused the adb port.
    Reachable,
    Silent,
}

impl HostReach {
    fn is_active(self) -> bool {
        self != HostReach::Silent
    }
}

pub fn check_host(addr: SocketAddr, timeout: Duration) -> HostReach {
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_) => HostReach::AdbOpen,
        Err(err) if err.kind() == ErrorKind::ConnectionRefused => HostReach::Reachable,
        Err(_) => HostReach::Silent,
    }
}

pub fn scan_subnet(
    reporter: &Reporter,
    token: &CancelToken,
    ip: &str,
    settings: &ScanSettings,
    check: impl Fn(SocketAddr, Duration) -> HostReach + Sync,
) -> Result<ScanReport, AppError> {
    let base = scan_base(ip).map_err(|message| AppError::validation(message, reporter.trace_id()))?;
    let [a, b, c, _] = ip
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|err| AppError::validation(err.to_string(), reporter.trace_id()))?
        .octets();
    reporter.info(format!("Scanning {base}0/24 for port {}...", settings.port));

    let total = usize::from(LAST_HOST - FIRST_HOST + 1);
    let next = AtomicUsize::new(usize::from(FIRST_HOST));
    let done = AtomicUsize::new(0);
    let active = AtomicUsize::new(0);
    let found = Mutex::new(Vec::<Ipv4Addr>::new());

    std::thread::scope(|scope| {
        for _ in 0..settings.workers.clamp(1, total) {
            scope.spawn(|| loop {
                if token.is_cancelled() {
                    break;
                }
                let host = next.fetch_add(1, Ordering::SeqCst);
                if host > usize::from(LAST_HOST) {
                    break;
                }
                let addr = Ipv4Addr::new(a, b, c, host as u8);
                let reach = check(SocketAddr::from((addr, settings.port)), settings.connect_timeout);
                if reach.is_active() {
                    active.fetch_add(1, Ordering::SeqCst);
                }
                if reach == HostReach::AdbOpen {
                    reporter.info(format!("ADB available: {addr}:{}", settings.port));
                    found
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push(addr);
                }
                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                if finished % PROGRESS_EVERY == 0 {
                    reporter.info(format!("Progress: {finished}/{total}..."));
                }
            });
        }
    });

    if token.is_cancelled() {
        reporter.warn("Network scan cancelled");
        return Err(AppError::cancelled(reporter.trace_id()));
    }

    let mut found = found
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    found.sort();
    let found: Vec<String> = found
        .into_iter()
        .map(|addr| format!("{addr}:{}", settings.port))
        .collect();

    let active = active.into_inner();
    reporter.success(format!(
        "Scan complete: {active} active host(s), {} with ADB available",
        found.len()
    ));
    if let Some(first) = found.first() {
        for endpoint in &found {
            reporter.info(format!("   {endpoint}"));
        }
        if let Some((ip, port)) = first.rsplit_once(':') {
            reporter.session().autofill(EndpointAutofill {
                ip: ip.to_string(),
                port: port.to_string(),
            });
        }
    }

    Ok(ScanReport {
        base,
        port: settings.port,
        hosts_checked: done.into_inner(),
        active_hosts: active,
        found,
    })
}
