//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortList` keeps the order ports were requested in.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;

    /// Standard HTTP port.
    pub const HTTP: Port = Port(80);
    /// Standard HTTPS port.
    pub const HTTPS: Port = Port(443);

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| ValidationError::InvalidPort(value.to_string()))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl FromStr for Port {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u16 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidPort(s.to_string()))?;
        Self::try_from(raw)
    }
}

/// An ordered, duplicate-free list of ports.
///
/// Accepts entries like:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "8000-8010"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Port>", into = "Vec<Port>")]
pub struct PortList {
    ports: Vec<Port>,
    seen: HashSet<Port>,
}

impl PortList {
    /// Create an empty port list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default web ports, 80 and 443.
    pub fn web_defaults() -> Self {
        Self::from(vec![Port::HTTP, Port::HTTPS])
    }

    /// Append a port unless it is already present.
    pub fn push(&mut self, port: Port) {
        if self.seen.insert(port) {
            self.ports.push(port);
        }
    }

    /// Append every port of another list, keeping first occurrences.
    pub fn extend(&mut self, other: &PortList) {
        for &port in &other.ports {
            self.push(port);
        }
    }

    /// Build a list from raw numbers, rejecting port 0.
    pub fn from_raw(raw: &[u16]) -> Result<Self, ValidationError> {
        let mut list = Self::new();
        for &p in raw {
            list.push(Port::try_from(p)?);
        }
        Ok(list)
    }

    /// Parse and merge several port lists (one per `--ports` value).
    pub fn parse_all<S: AsRef<str>>(items: &[S]) -> Result<Self, ValidationError> {
        let mut list = Self::new();
        for item in items {
            list.extend(&item.as_ref().parse()?);
        }
        if list.is_empty() {
            return Err(ValidationError::NoPorts);
        }
        Ok(list)
    }

    /// Ports in request order.
    pub fn as_slice(&self) -> &[Port] {
        &self.ports
    }

    /// Raw port numbers in request order.
    pub fn to_raw(&self) -> Vec<u16> {
        self.ports.iter().map(|p| p.as_u16()).collect()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl From<Vec<Port>> for PortList {
    fn from(ports: Vec<Port>) -> Self {
        let mut list = Self::new();
        for port in ports {
            list.push(port);
        }
        list
    }
}

impl From<PortList> for Vec<Port> {
    fn from(list: PortList) -> Self {
        list.ports
    }
}

impl FromStr for PortList {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::NoPorts);
        }

        let mut list = Self::new();

        for part in s.split(',') {
            let part = part.trim();
            if let Some((lo, hi)) = part.split_once('-') {
                let start: Port = lo.parse()?;
                let end: Port = hi.parse()?;
                if start > end {
                    return Err(ValidationError::InvalidPort(part.to_string()));
                }
                for raw in start.as_u16()..=end.as_u16() {
                    list.push(Port(raw));
                }
            } else {
                list.push(part.parse()?);
            }
        }

        Ok(list)
    }
}

impl fmt::Display for PortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}
