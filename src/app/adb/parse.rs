use regex::Regex;

use crate::app::adb::endpoint::is_network_endpoint;
use crate::app::models::{AdbVersion, DeviceSummary};

/// Parses `adb devices` / `adb devices -l`. Fields may be separated by tabs or
/// spaces depending on the adb version.
pub fn parse_adb_devices(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                return None;
            }
            let serial = tokens[0].to_string();
            let state = tokens[1].to_string();
            let mut model = None;
            let mut product = None;
            let mut transport_id = None;
            for token in tokens.iter().skip(2) {
                if let Some(value) = token.strip_prefix("model:") {
                    model = Some(value.to_string());
                } else if let Some(value) = token.strip_prefix("product:") {
                    product = Some(value.to_string());
                } else if let Some(value) = token.strip_prefix("transport_id:") {
                    transport_id = Some(value.to_string());
                }
            }
            Some(DeviceSummary {
                serial,
                state,
                model,
                product,
                transport_id,
            })
        })
        .collect()
}

/// Serials in the `device` (attached and authorized) state.
pub fn attached_endpoints(output: &str) -> Vec<String> {
    parse_adb_devices(output)
        .into_iter()
        .filter(|summary| summary.state == "device")
        .map(|summary| summary.serial)
        .collect()
}

/// Attached `ip:port` endpoints.
pub fn network_endpoints(output: &str) -> Vec<String> {
    attached_endpoints(output)
        .into_iter()
        .filter(|serial| is_network_endpoint(serial))
        .collect()
}

/// Attached USB serials.
pub fn usb_endpoints(output: &str) -> Vec<String> {
    attached_endpoints(output)
        .into_iter()
        .filter(|serial| !is_network_endpoint(serial))
        .collect()
}

/// `adb shell getprop <key>` prints the bare value or an empty line.
pub fn parse_getprop_value(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Package names from `pm list packages`, sorted.
pub fn parse_pm_list_packages(output: &str) -> Vec<String> {
    let mut packages: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("package:"))
        .map(|payload| match payload.rsplit_once('=') {
            Some((_, name)) => name.trim(),
            None => payload.trim(),
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    packages.sort();
    packages
}

pub fn parse_adb_version(output: &str) -> AdbVersion {
    let first_line = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("Unknown version")
        .to_string();

    let protocol = Regex::new(r"(?i)android debug bridge version\s+([0-9][0-9.]*)")
        .ok()
        .and_then(|re| re.captures(output).map(|caps| caps[1].to_string()));
    let platform_tools = Regex::new(r"(?m)^Version\s+(\S+)")
        .ok()
        .and_then(|re| re.captures(output).map(|caps| caps[1].to_string()));
    let installed_as = Regex::new(r"(?m)^Installed as\s+(.+)$")
        .ok()
        .and_then(|re| re.captures(output).map(|caps| caps[1].trim().to_string()));

    AdbVersion {
        first_line,
        protocol,
        platform_tools,
        installed_as,
    }
}
