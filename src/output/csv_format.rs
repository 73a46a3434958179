//! CSV persistence of a result set.
//!
//! The file has a header row `IP,URL,Title` followed by one row per
//! successful probe, in the order the aggregator received them.

use crate::error::{OutputError, OutputResult};
use crate::scanner::{ResultEntry, ResultSet};
use std::io;
use std::path::Path;

pub const HEADER: [&str; 3] = ["IP", "URL", "Title"];

/// Write `results` as CSV to any writer.
pub fn write_csv<W: io::Write>(writer: W, results: &ResultSet) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    // Written explicitly so an empty result set still gets a header.
    wtr.write_record(HEADER)?;

    for entry in results {
        wtr.write_record([
            entry.ip.to_string().as_str(),
            entry.url.as_str(),
            entry.title.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Read a result set back from any reader, skipping the header.
pub fn read_csv<R: io::Read>(reader: R) -> csv::Result<ResultSet> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize::<ResultEntry>().collect()
}

/// Save results to `path`, replacing any existing file.
pub fn save_results(path: &Path, results: &ResultSet) -> OutputResult<()> {
    let file = std::fs::File::create(path).map_err(|e| OutputError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    write_csv(file, results).map_err(|e| OutputError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load results previously written by [`save_results`].
pub fn load_results(path: &Path) -> OutputResult<ResultSet> {
    let file = std::fs::File::open(path).map_err(|e| OutputError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    read_csv(file).map_err(|e| OutputError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
