mod provider;

use clap::Parser;
use cloudstack_plugin::{PluginError, ServeOpts};
use provider::{CloudStackProvider, PROVIDER_ADDRESS};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "terraform-provider-cloudstack")]
#[command(version, about = "Terraform provider for Apache CloudStack", long_about = None)]
struct Cli {
    /// Run without the host and print TF_REATTACH_PROVIDERS for attaching Terraform
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout is reserved for the handshake line, so logs go to stderr where
    // the host collects them
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .init();

    let opts = ServeOpts {
        debug: cli.debug,
        provider_address: PROVIDER_ADDRESS.to_string(),
    };

    match cloudstack_plugin::serve(Arc::new(CloudStackProvider::new()), opts).await {
        Ok(()) => Ok(()),
        Err(e @ PluginError::NotLaunchedByHost) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
