//! Core type definitions using newtype patterns for type safety.
//!
//! Addresses, ports and probe targets are validated once at the edge and
//! carried as strongly typed values afterwards.

mod port;
mod range;
mod scan_id;
mod target;

pub use port::{Port, PortList};
pub use range::{parse_address, Addresses, IpRange};
pub use scan_id::ScanId;
pub use target::{ProbeTarget, Protocol, ProtocolPolicy};
