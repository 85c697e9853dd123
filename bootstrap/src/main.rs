mod args;
mod command;
mod csv_codes;
mod locator;

use crate::args::CommonArgs;
use crate::command::Command;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Issues and manages login codes for the users of a school.
#[derive(Parser)]
#[command(name = "school-codes", version)]
struct Cli {
    #[command(flatten)]
    common_args: CommonArgs,
    #[command(subcommand)]
    command: Command,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let Cli {
        common_args,
        command,
    } = Cli::parse();

    let _sentry = init_sentry(&common_args)?;
    init_tracing();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(command.run(common_args))
}

fn init_sentry(common_args: &CommonArgs) -> anyhow::Result<sentry::ClientInitGuard> {
    let dsn = common_args
        .sentry_dsn
        .as_deref()
        .map(str::parse::<sentry::types::Dsn>)
        .transpose()?;

    Ok(sentry::init(sentry::ClientOptions {
        dsn,
        release: sentry::release_name!(),
        environment: common_args.sentry_environment.clone().map(Into::into),
        sample_rate: common_args.sentry_sample_rate.unwrap_or(1.0),
        traces_sample_rate: common_args.sentry_traces_sample_rate.unwrap_or(0.0),
        ..Default::default()
    }))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();
}
