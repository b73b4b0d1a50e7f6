use anyhow::Result;
use clap::Parser;
use tracing::error;

use spamscan_server::{app, args::Args, logging};

#[rocket::main]
async fn main() -> Result<()> {
    logging::init();
    tracing::info!("spamscan v{}", env!("CARGO_PKG_VERSION"));
    let args = Args::parse();
    match app::run(args).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!(error = %err, "server failed");
            Err(err)
        }
    }
}
