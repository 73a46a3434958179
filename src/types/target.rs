//! Probe targets and the policy that generates them.
//!
//! A [`ProbeTarget`] names one `(address, protocol, port)` combination.
//! Which protocols are tried on which port is decided by a
//! [`ProtocolPolicy`]; the default mirrors port 443 onto both schemes.

use super::port::{Port, PortList};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// URL scheme used for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// One address/protocol/port combination to probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub address: Ipv4Addr,
    pub protocol: Protocol,
    pub port: Port,
}

impl ProbeTarget {
    pub fn new(address: Ipv4Addr, protocol: Protocol, port: Port) -> Self {
        Self {
            address,
            protocol,
            port,
        }
    }

    /// The probe URL, `{protocol}://{address}:{port}`.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.address, self.port)
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.address, self.port)
    }
}

/// Rule deciding which protocols are probed on each port.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolPolicy {
    /// Port 443 gets both http and https, every other port http only.
    #[default]
    #[value(name = "mirror-443")]
    #[serde(rename = "mirror-443")]
    Mirror443,
    /// Port 443 gets https only, every other port http only.
    Conventional,
    /// Every port gets both http and https.
    Both,
}

impl ProtocolPolicy {
    /// Protocols to probe on `port`, http first.
    pub fn protocols(self, port: Port) -> &'static [Protocol] {
        const HTTP: &[Protocol] = &[Protocol::Http];
        const HTTPS: &[Protocol] = &[Protocol::Https];
        const BOTH: &[Protocol] = &[Protocol::Http, Protocol::Https];

        match self {
            Self::Mirror443 if port == Port::HTTPS => BOTH,
            Self::Mirror443 => HTTP,
            Self::Conventional if port == Port::HTTPS => HTTPS,
            Self::Conventional => HTTP,
            Self::Both => BOTH,
        }
    }

    /// Expand one address into its probe targets.
    pub fn targets(self, address: Ipv4Addr, ports: &PortList) -> Vec<ProbeTarget> {
        ports
            .as_slice()
            .iter()
            .flat_map(|&port| {
                self.protocols(port)
                    .iter()
                    .map(move |&protocol| ProbeTarget::new(address, protocol, port))
            })
            .collect()
    }

    /// Number of targets generated per address for `ports`.
    pub fn targets_per_address(self, ports: &PortList) -> u64 {
        ports
            .as_slice()
            .iter()
            .map(|&port| self.protocols(port).len() as u64)
            .sum()
    }
}

impl fmt::Display for ProtocolPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mirror443 => write!(f, "mirror-443"),
            Self::Conventional => write!(f, "conventional"),
            Self::Both => write!(f, "both"),
        }
    }
}
