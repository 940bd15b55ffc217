pub mod augmentations;
pub mod projects;
pub mod session;
pub mod transfer;
pub mod users;

use std::{path::PathBuf, time::Duration};

use scholar_sync::{ClientConfig, Workspace, remote::RetryPolicy};

use crate::cli::ConfigArgs;

/// Directory name of the mirror under the platform data directory.
const DEFAULT_HOME_DIR: &str = "Schol-AR";

/// Resolve the mirror root and remote settings, then open the workspace.
pub async fn open_workspace(args: &ConfigArgs) -> Result<Workspace, Box<dyn std::error::Error>> {
    let home = match &args.home {
        Some(home) => home.clone(),
        None => default_home()?,
    };
    let config = ClientConfig::new(&args.api_url)
        .and_then(|c| c.with_timeout(Duration::from_secs(args.timeout)))
        .map_err(scholar_sync::Error::from)?
        .with_retry(RetryPolicy::default().with_attempts(args.retries));
    tracing::debug!(home = %home.display(), api_url = %config.api_url, "Opening workspace");
    Ok(Workspace::open(home, &config).await?)
}

fn default_home() -> Result<PathBuf, Box<dyn std::error::Error>> {
    dirs::data_dir()
        .map(|dir| dir.join(DEFAULT_HOME_DIR))
        .ok_or_else(|| "could not determine the data directory; pass --home or set SCHOLAR_HOME".into())
}
