mod args;
mod rcv;

use clap::Parser;
use log::{info, LevelFilter};

fn main() {
    let args = args::Args::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    info!("args: {:?}", args);

    if let Err(e) = rcv::run_election(&args) {
        eprintln!("An error occured: {}", e);
        if let Some(source) = std::error::Error::source(e.as_ref()) {
            eprintln!("Caused by: {}", source);
        }
        std::process::exit(1);
    }
}
