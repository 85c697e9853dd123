use crate::args::{CommonArgs, SchoolArgs};
use crate::command::{connect, print_json};
use anyhow::bail;
use clap::Args;
use domain_shared::login_code::CodeHolder;
use domain_shared::school::UserId;
use presentation::application_ports::Locator;
use tracing::{info, instrument};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub school: SchoolArgs,
    /// teacher, student or parent
    #[arg(long)]
    pub holder: CodeHolder,
    /// Users to issue codes to; everyone of the holder's role without a code when omitted
    #[arg(long = "user-id")]
    pub user_ids: Vec<i64>,
}

#[instrument(level = "info", skip(common_args))]
pub async fn run(common_args: CommonArgs, args: GenerateArgs) -> anyhow::Result<()> {
    let GenerateArgs {
        school,
        holder,
        user_ids,
    } = args;
    let context = school.context();

    let locator = connect(&common_args).await?;
    let port = locator.get_login_code_port();

    let report = if user_ids.is_empty() {
        port.generate_missing_codes(&context, holder).await?
    } else {
        let user_ids = user_ids.into_iter().map(UserId).collect();
        port.bulk_generate(&context, user_ids, holder).await?
    };

    print_json(&report.issued)?;

    if let Some(failure) = report.failure {
        bail!(
            "Stopped at user {} after issuing {} codes: {}",
            failure.user_id,
            report.issued.len(),
            failure.error
        );
    }

    info!(issued = report.issued.len(), "Codes generated");
    Ok(())
}
