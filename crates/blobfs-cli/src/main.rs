use anyhow::Result;
use blobfs_cli::{Cli, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let fs = cli.open_fs().await?;
    debug!(block_size = fs.settings().block_size, "opened blob filesystem");

    let mut stdout = std::io::stdout().lock();
    cli.command.run(&fs, &mut stdout).await
}
