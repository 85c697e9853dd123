use crate::args::{CommonArgs, SchoolArgs};
use crate::command::{connect, print_json};
use crate::csv_codes::read_import_rows;
use anyhow::Context;
use clap::Args;
use presentation::application_ports::Locator;
use std::fs::File;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub school: SchoolArgs,
    /// CSV file with a `full_name,login_code` header
    #[arg(long)]
    pub file: PathBuf,
}

#[instrument(level = "info", skip(common_args))]
pub async fn run(common_args: CommonArgs, args: ImportArgs) -> anyhow::Result<()> {
    let ImportArgs { school, file } = args;

    let source =
        File::open(&file).with_context(|| format!("Cannot open {}", file.display()))?;
    let rows = read_import_rows(source)?;

    let locator = connect(&common_args).await?;
    let report = locator
        .get_login_code_port()
        .import_codes(&school.context(), rows)
        .await?;

    for row_error in &report.errors {
        warn!(
            row_number = row_error.row_number,
            reason = %row_error.reason,
            "Row skipped"
        );
    }
    info!(
        imported = report.imported.len(),
        skipped = report.errors.len(),
        "Import finished"
    );

    print_json(&report)
}
