//! Output formatting module.
//!
//! Provides the CSV result file and the plain text console report.

mod csv_format;
mod plain;

pub use csv_format::{load_results, read_csv, save_results, write_csv, HEADER};
pub use plain::{
    format_stats, print_error, print_info, print_report, print_scan_header, print_success,
    print_warning, write_report,
};

use chrono::Local;
use std::path::PathBuf;

/// Default result file name, `scan_results_YYYYmmdd_HHMMSS.csv`.
pub fn default_output_name() -> PathBuf {
    PathBuf::from(format!(
        "scan_results_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
