use crate::args::{CommonArgs, SchoolArgs};
use crate::command::{connect, print_json};
use clap::Args;
use presentation::application_ports::Locator;
use tracing::instrument;

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub school: SchoolArgs,
}

#[instrument(level = "info", skip(common_args))]
pub async fn run(common_args: CommonArgs, args: StatsArgs) -> anyhow::Result<()> {
    let locator = connect(&common_args).await?;
    let statistics = locator
        .get_login_code_port()
        .code_statistics(&args.school.context())
        .await?;

    print_json(&statistics)
}
