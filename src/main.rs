use clap::Parser;
use std::process::ExitCode;
use titlescan::cli::{Cli, FAILURE_EXIT_CODE};
use titlescan::output;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            output::print_error(&format!("cannot start async runtime: {e}"));
            return ExitCode::from(FAILURE_EXIT_CODE);
        }
    };

    let result = runtime.block_on(cli.run());
    // A prompt abandoned on Ctrl+C may still be blocked reading stdin.
    runtime.shutdown_background();

    match result {
        Ok(exit) => exit.into(),
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            ExitCode::from(FAILURE_EXIT_CODE)
        }
    }
}
