use std::process::ExitCode;

use clap::Parser;
use dts_screen::{Args, init_logging, normalize_args, run};

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let args = Args::parse_from(normalize_args(std::env::args_os()));
    // flushes the log file on drop
    let _guard = init_logging(&args.log_level, args.log_file.as_deref())?;

    let code = run(args)?;
    tracing::debug!(code, "exiting");

    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
