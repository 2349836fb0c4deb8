pub mod mock_source;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration testing tool for the netmeter accumulator")]
struct Cli {
    /// Only run scenarios whose name contains this substring
    #[arg(long)]
    filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let results = integration_tests::run_all_tests(cli.filter.as_deref()).await?;

    if results.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
