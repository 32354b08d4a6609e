use clap::Parser;

use touchpilot_lib::cli::Cli;

#[tokio::main]
async fn main() {
    // Load .env before parsing so env-backed flags see it (ignore error if not found)
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let code = touchpilot_lib::run(cli).await;
    std::process::exit(code);
}
