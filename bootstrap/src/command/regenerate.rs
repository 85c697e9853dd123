use crate::args::{CommonArgs, SchoolArgs};
use crate::command::{connect, print_json};
use clap::Args;
use domain_shared::school::UserId;
use presentation::application_ports::Locator;
use tracing::instrument;

#[derive(Args, Debug)]
pub struct RegenerateArgs {
    #[command(flatten)]
    pub school: SchoolArgs,
    #[arg(long)]
    pub user_id: i64,
}

#[instrument(level = "info", skip(common_args))]
pub async fn run(common_args: CommonArgs, args: RegenerateArgs) -> anyhow::Result<()> {
    let RegenerateArgs { school, user_id } = args;

    let locator = connect(&common_args).await?;
    let issued = locator
        .get_login_code_port()
        .issue_code(&school.context(), UserId(user_id))
        .await?;

    print_json(&issued)
}
