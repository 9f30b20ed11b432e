use std::env;
use std::io;
use std::process::ExitCode;

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use smartbank::Store;
use smartbank::report;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .expect("usage: smartbank <store.json> [report|stats]");
    let command = args.next().unwrap_or_else(|| "report".to_string());

    if !path.ends_with(".json") {
        warn!(path, "store file seems to not be a json file");
    }

    let directory = Store::new(&path).load_or_default();

    match command.as_str() {
        "report" => {
            if let Err(e) = report::write_accounts(&directory, io::stdout().lock()) {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        }
        "stats" => {
            let stats = directory.stats();
            println!("accounts: {}", stats.accounts);
            println!("savings: {}", stats.savings);
            println!("current: {}", stats.current);
            println!("total balance: {}", stats.total_balance);
        }
        other => {
            error!(command = other, "unknown command");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
