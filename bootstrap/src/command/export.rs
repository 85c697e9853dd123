use crate::args::{CommonArgs, SchoolArgs};
use crate::command::connect;
use crate::csv_codes::write_export_rows;
use anyhow::Context;
use clap::Args;
use presentation::application_ports::Locator;
use std::fs::File;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub school: SchoolArgs,
    /// Written to stdout when omitted
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[instrument(level = "info", skip(common_args))]
pub async fn run(common_args: CommonArgs, args: ExportArgs) -> anyhow::Result<()> {
    let ExportArgs { school, output } = args;

    let locator = connect(&common_args).await?;
    let rows = locator
        .get_login_code_port()
        .export_codes(&school.context())
        .await?;

    match output {
        Some(path) => {
            let target =
                File::create(&path).with_context(|| format!("Cannot create {}", path.display()))?;
            write_export_rows(target, &rows)?;
        }
        None => write_export_rows(std::io::stdout().lock(), &rows)?,
    }

    info!(exported = rows.len(), "Export finished");
    Ok(())
}
