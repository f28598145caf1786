// src/main.rs

use tofail::engine::RunSummary;
use tofail::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(summary) if summary.found_problem() => std::process::exit(1),
        Ok(_) => {}
        Err(err) => {
            eprintln!("tofail error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<RunSummary> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}
