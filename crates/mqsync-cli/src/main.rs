use anyhow::Result;
use clap::Parser;
use mqsync_cli::{init_tracing, run_sync, Cli};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling sync run");
            let _ = cancel_tx.send(true);
        }
    });

    let report = run_sync(&cli, cancel_rx).await?;
    if report.aggregate.failed > 0 {
        tracing::warn!(
            failed = report.aggregate.failed,
            "some records were rejected; see alerts for details"
        );
    }
    Ok(())
}
