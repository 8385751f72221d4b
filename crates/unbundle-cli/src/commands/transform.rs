//! `unbundle transform` command: one request, body to stdout.

use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::path::Path;
use tracing::debug;
use unbundle_core::{DevConfig, ModuleRequest, ModuleServer};

pub async fn run(cwd: &Path, config: Option<&Path>, url: &str) -> Result<()> {
    let config = DevConfig::load(cwd, config)
        .into_diagnostic()
        .wrap_err("failed to load dev server configuration")?;
    let server = ModuleServer::new(config);

    let request = ModuleRequest::parse(url);
    let response = server
        .handle(&request)
        .await
        .map_err(|e| miette!("{}: {}", e.code(), e))?;

    debug!(kind = %response.kind, bytes = response.body.len(), "transformed");
    print!("{}", response.body);
    Ok(())
}
