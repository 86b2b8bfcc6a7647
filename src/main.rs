use anyhow::Result;
use clap::Parser;

use plateshare::bootstrap::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    plateshare::bootstrap::init_logging(&cli_args.log_level);
    plateshare::bootstrap::setup_panic_handler();

    let bootstrap_result = plateshare::bootstrap::bootstrap(cli_args).await?;
    plateshare::bootstrap::start_server(bootstrap_result).await?;

    Ok(())
}
