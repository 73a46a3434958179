//! # titlescan - Web Title Scanner for IPv4 Ranges
//!
//! titlescan walks an inclusive IPv4 address range, issues an HTTP(S) GET to
//! every address and port combination, and records the `<title>` of each page
//! that answers successfully.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: A fixed number of probes in flight, set by `--workers`
//! - **Protocol Policies**: Mirror port 443 over http and https, or pick per port
//! - **Failure Isolation**: Timeouts, refused connections and HTTP errors are counted, never fatal
//! - **Graceful Interrupt**: Ctrl+C stops submission and still writes the partial results
//! - **Run-scoped Logging**: A timestamped log file plus console output for each scan
//! - **CSV Output**: `IP,URL,Title` rows for every page with a title
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use titlescan::scanner::{run_scan, HttpProber, HttpSettings, ScanJobConfig, ScanPlan, Shutdown};
//! use titlescan::types::{IpRange, PortList, ProtocolPolicy};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let plan = ScanPlan::new(
//!         IpRange::parse("192.168.1.1", "192.168.1.20")?,
//!         PortList::web_defaults(),
//!         ProtocolPolicy::default(),
//!     );
//!     let prober = Arc::new(HttpProber::from_settings(&HttpSettings::default())?);
//!     let report = run_scan(prober, &plan, &ScanJobConfig::new(10), &Shutdown::new()).await?;
//!
//!     for entry in report.results.iter() {
//!         println!("{} {} {}", entry.ip, entry.url, entry.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Address ranges, ports, probe targets and protocol policies
//! - [`scanner`] - Worker pool, HTTP prober and result aggregation
//! - [`title`] - HTML title extraction
//! - [`config`] - Persistent application settings
//! - [`logging`] - Per-scan log file and console output
//! - [`output`] - CSV results and console reports
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod title;
pub mod types;

// Re-export commonly used types
pub use error::{ScanError, ValidationError};
pub use scanner::{ProbeOutcome, ProbeStatus, Prober, ResultEntry, ResultSet, ScanReport};
pub use types::{IpRange, Port, PortList, ProbeTarget, ProtocolPolicy, ScanId};
