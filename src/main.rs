use clap::Parser;

use hsa_ledger::cli::{Cli, run};

#[tokio::main]
async fn main() {
    hsa_ledger::logging::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
