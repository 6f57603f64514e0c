use anyhow::Result;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tinyplugin_assist::cli::run_cli().await
}
