use clap::Parser;

use cfb_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cfb_cli::init_tracing(cli.verbose);
    cfb_cli::run(cli).await
}
