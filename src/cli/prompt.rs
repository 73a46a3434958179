//! Interactive prompting for values missing from the command line.

use crate::scanner::Shutdown;
use console::style;
use std::io::{self, BufRead, Write};

/// Write `label`, then read one line from `input`, trimmed.
pub fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<String> {
    write!(out, "{label}")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompt on the terminal.
pub fn ask_terminal(label: &str) -> io::Result<String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    ask(&mut input, &mut out, &format!("{} ", style(label).bold()))
}

/// Run a blocking `read` off the async workers, giving up on shutdown.
///
/// Returns `None` when shutdown wins. The abandoned read keeps its
/// blocking thread until input arrives or the runtime is torn down.
pub async fn ask_until<F>(read: F, shutdown: &Shutdown) -> io::Result<Option<String>>
where
    F: FnOnce() -> io::Result<String> + Send + 'static,
{
    let answer = tokio::task::spawn_blocking(read);
    tokio::select! {
        biased;
        _ = shutdown.triggered() => Ok(None),
        joined = answer => joined.map_err(io::Error::other)?.map(Some),
    }
}
