#![forbid(unsafe_code)]

use std::process::ExitCode;

use viewmodule_demo::cli::Opts;
use viewmodule_demo::{DemoError, logging, session};

fn run() -> Result<bool, DemoError> {
    let opts = Opts::parse();
    logging::init(opts.log_json, &opts.log_level)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let report = local.block_on(&runtime, session::run(&opts))?;
    print!("{report}");
    Ok(report.valid)
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("viewmodule-demo: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
