use clap::builder::RangedU64ValueParser;
use clap::Args;
use domain::login_code::DEFAULT_CODE_LENGTH;
use domain_shared::school::{AcademicYearId, SchoolContext, SchoolId};

#[derive(Args)]
pub struct CommonArgs {
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
    /// Number of random characters after the code prefix
    #[arg(
        long,
        env = "CODE_LENGTH",
        default_value_t = DEFAULT_CODE_LENGTH,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub code_length: usize,
    #[arg(long, env = "SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
    #[arg(long, env = "SENTRY_ENVIRONMENT")]
    pub sentry_environment: Option<String>,
    #[arg(long, env = "SENTRY_SAMPLE_RATE")]
    pub sentry_sample_rate: Option<f32>,
    #[arg(long, env = "SENTRY_TRACES_SAMPLE_RATE")]
    pub sentry_traces_sample_rate: Option<f32>,
}

#[derive(Args, Debug)]
pub struct SchoolArgs {
    /// The school whose users are affected
    #[arg(long, env = "SCHOOL_ID")]
    pub school_id: i64,
    #[arg(long, env = "ACADEMIC_YEAR_ID")]
    pub academic_year_id: Option<i64>,
}

impl SchoolArgs {
    pub fn context(&self) -> SchoolContext {
        SchoolContext::new(
            SchoolId(self.school_id),
            self.academic_year_id.map(AcademicYearId),
        )
    }
}
