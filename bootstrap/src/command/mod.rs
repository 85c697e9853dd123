pub mod export;
pub mod generate;
pub mod import;
pub mod migrate;
pub mod regenerate;
pub mod reset;
pub mod serve;
pub mod stats;

use crate::args::CommonArgs;
use crate::command::export::ExportArgs;
use crate::command::generate::GenerateArgs;
use crate::command::import::ImportArgs;
use crate::command::migrate::MigrateArgs;
use crate::command::regenerate::RegenerateArgs;
use crate::command::reset::ResetArgs;
use crate::command::serve::ServeArgs;
use crate::command::stats::StatsArgs;
use crate::locator::ApplicationPortLocator;
use anyhow::anyhow;
use clap::Subcommand;
use serde::Serialize;
use tracing::instrument;

#[derive(Subcommand)]
pub enum Command {
    /// Run the admin HTTP API
    #[command(name = "serve")]
    Serve(#[arg(flatten)] ServeArgs),
    /// Apply pending database migrations
    #[command(name = "migrate")]
    Migrate(#[arg(flatten)] MigrateArgs),
    /// Issue codes to selected users or to everyone still missing one
    #[command(name = "generate")]
    Generate(#[arg(flatten)] GenerateArgs),
    /// Replace the code of a single user
    #[command(name = "regenerate")]
    Regenerate(#[arg(flatten)] RegenerateArgs),
    /// Deactivate all non-admin users and clear their codes
    #[command(name = "reset")]
    Reset(#[arg(flatten)] ResetArgs),
    /// Count users without a code
    #[command(name = "stats")]
    Stats(#[arg(flatten)] StatsArgs),
    /// Assign codes from a `full_name,login_code` CSV file
    #[command(name = "import")]
    Import(#[arg(flatten)] ImportArgs),
    /// Write every assigned code as CSV
    #[command(name = "export")]
    Export(#[arg(flatten)] ExportArgs),
}

impl Command {
    #[instrument(level = "trace", skip(self, common_args))]
    pub async fn run(self, common_args: CommonArgs) -> anyhow::Result<()> {
        match self {
            Command::Serve(args) => serve::run(common_args, args).await.map_err(|e| anyhow!(e)),
            Command::Migrate(args) => migrate::run(common_args, args).await,
            Command::Generate(args) => generate::run(common_args, args).await,
            Command::Regenerate(args) => regenerate::run(common_args, args).await,
            Command::Reset(args) => reset::run(common_args, args).await,
            Command::Stats(args) => stats::run(common_args, args).await,
            Command::Import(args) => import::run(common_args, args).await,
            Command::Export(args) => export::run(common_args, args).await,
        }
    }
}

#[instrument(level = "debug", skip(common_args))]
pub(crate) async fn connect(common_args: &CommonArgs) -> anyhow::Result<ApplicationPortLocator> {
    let database_connection = sqlx::PgPool::connect(&common_args.database_url).await?;
    Ok(ApplicationPortLocator::new(
        database_connection,
        common_args.code_length,
    ))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
