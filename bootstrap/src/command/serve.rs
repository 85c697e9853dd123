use crate::args::CommonArgs;
use crate::command::connect;
use clap::Args;
use presentation::api::run_api;
use std::net::SocketAddr;
use tracing::instrument;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address the admin API listens on
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8080")]
    pub bind_address: SocketAddr,
}

#[instrument(level = "trace", skip(common_args, args))]
pub async fn run(
    common_args: CommonArgs,
    args: ServeArgs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ServeArgs { bind_address } = args;

    let locator = connect(&common_args).await?;

    run_api(locator, bind_address).await
}
