use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Sentinel texts the connection form shows while a field is still empty.
pub const PORT_PLACEHOLDER: &str = "Puerto";
pub const CODE_PLACEHOLDER: &str = "Código";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Network,
    Usb,
}

impl Transport {
    pub fn of(endpoint: &str) -> Self {
        if is_network_endpoint(endpoint) {
            Transport::Network
        } else {
            Transport::Usb
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Transport::Network => "Network",
            Transport::Usb => "USB",
        }
    }
}

pub fn is_network_endpoint(endpoint: &str) -> bool {
    endpoint.contains(':')
}

pub fn is_placeholder(value: &str, placeholder: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == placeholder
}

fn validate_port(port: &str, field: &str) -> Result<String, String> {
    let port = port.trim();
    match port.parse::<u16>() {
        Ok(value) if value > 0 => Ok(value.to_string()),
        _ => Err(format!("{field} must be a number between 1 and 65535")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub ip: String,
    pub port: String,
}

impl ConnectRequest {
    pub fn parse(ip: &str, port: &str) -> Result<Self, String> {
        let ip = ip.trim();
        if ip.is_empty() || is_placeholder(port, PORT_PLACEHOLDER) {
            return Err("Enter a valid IP and port".to_string());
        }
        let port = validate_port(port, "Port")?;
        Ok(Self {
            ip: ip.to_string(),
            port,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairRequest {
    pub ip: String,
    pub port: String,
    pub code: String,
}

impl PairRequest {
    pub fn parse(ip: &str, port: &str, code: &str) -> Result<Self, String> {
        let ip = ip.trim();
        if ip.is_empty() {
            return Err("Enter the device IP".to_string());
        }
        if is_placeholder(port, PORT_PLACEHOLDER) {
            return Err("Enter the pairing port".to_string());
        }
        if is_placeholder(code, CODE_PLACEHOLDER) {
            return Err("Enter the pairing code".to_string());
        }
        let port = validate_port(port, "Pairing port")?;
        Ok(Self {
            ip: ip.to_string(),
            port,
            code: code.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// `192.168.1.80` -> `192.168.1.` for a /24 sweep.
pub fn scan_base(ip: &str) -> Result<String, String> {
    let ip = ip.trim();
    if ip.is_empty() {
        return Err("Enter a base IP to scan".to_string());
    }
    let addr: Ipv4Addr = ip
        .parse()
        .map_err(|_| format!("'{ip}' is not an IPv4 address"))?;
    let [a, b, c, _] = addr.octets();
    Ok(format!("{a}.{b}.{c}."))
}
