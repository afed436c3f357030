mod args;
mod report;

use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

use crate::args::Args;
use crate::report::{run_report, RunOptions};

fn main() {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }
    info!("args: {:?}", args);

    let options = RunOptions {
        config_path: args.config.clone(),
        reference_path: args.reference.clone(),
        out_dir: args.out.clone(),
        build_time: args.build_time.clone(),
        deterministic: args.deterministic,
    };
    if let Err(e) = run_report(&options) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
