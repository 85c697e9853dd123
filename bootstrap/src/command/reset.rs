use crate::args::{CommonArgs, SchoolArgs};
use crate::command::{connect, print_json};
use anyhow::bail;
use clap::Args;
use presentation::application_ports::Locator;
use tracing::instrument;

#[derive(Args, Debug)]
pub struct ResetArgs {
    #[command(flatten)]
    pub school: SchoolArgs,
    /// Confirm that every non-admin account of the school is deactivated
    #[arg(long)]
    pub yes: bool,
}

#[instrument(level = "info", skip(common_args))]
pub async fn run(common_args: CommonArgs, args: ResetArgs) -> anyhow::Result<()> {
    let ResetArgs { school, yes } = args;

    if !yes {
        bail!("Refusing to reset school {} without --yes", school.school_id);
    }

    let locator = connect(&common_args).await?;
    let report = locator
        .get_login_code_port()
        .reset_all_codes(&school.context())
        .await?;

    print_json(&report)
}
