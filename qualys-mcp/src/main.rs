use std::process::ExitCode;

use anyhow::Context;
use qualys_config::QualysConfig;
use qualys_kernel::Dispatcher;
use qualys_mcp::McpServer;
use tokio::io::{BufReader, stdin, stdout};
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    qualys_telemetry::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "qualys-mcp terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = QualysConfig::from_env().context("invalid Qualys configuration")?;
    if !config.has_credentials() {
        warn!("Qualys credentials are not set; every tool call will fail until they are");
    }

    let dispatcher = Dispatcher::from_config(config).context("failed to build operation catalog")?;
    let server = McpServer::new(dispatcher);
    info!(
        base_url = server.dispatcher().config().base_url(),
        tools = server.dispatcher().definitions().len(),
        "qualys-mcp serving on stdio"
    );

    tokio::select! {
        result = server.serve(BufReader::new(stdin()), stdout()) => {
            result.context("stdio transport failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received; shutting down");
        }
    }
    Ok(())
}
