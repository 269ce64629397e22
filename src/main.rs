use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser, Debug)]
#[command(name = "challonge", about = "Manage Challonge tournaments")]
struct Args {
    #[command(subcommand)]
    cmd: cmd::Cmd,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    Args::parse().cmd.run().await
}
