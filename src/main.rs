//! Load generator for a form/survey submission REST API.
//!
//! Reads a YAML configuration describing the target service, the virtual-user
//! count, the weighted action table and the think-time bounds, loads the
//! credential file, runs the test and prints a metrics report.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use formload::api::ApiRemote;
use formload::config::Config;
use formload::credentials::load_credentials;
use formload::loadtest;

/// Weighted-behavior load generator for a form/survey API
#[derive(Debug, FromArgs)]
pub struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    pub config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_file = std::fs::File::open(&args.config).context("failed to open config file")?;
    let config: Config =
        serde_yaml::from_reader(config_file).context("failed to parse config YAML")?;

    let credentials = load_credentials(&config.users_file).with_context(|| {
        format!("failed to read users file {}", config.users_file.display())
    })?;

    let remote = ApiRemote::new(&config.remote, &config.root_path);
    loadtest::run(remote, credentials, &config).await
}
