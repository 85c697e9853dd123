use application::login_code::LoginCodeService;
use application_ports::login_code::LoginCodePort;
use infrastructure::user::PostgresUserRepository;
use presentation::application_ports::Locator;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

#[derive(Clone)]
pub struct ApplicationPortLocator {
    pub(crate) login_code_adapter: Arc<LoginCodeService>,
}

impl ApplicationPortLocator {
    #[instrument(level = "trace", skip(database_connection))]
    pub fn new(database_connection: PgPool, code_length: usize) -> Self {
        let user_repository = Arc::new(PostgresUserRepository::new(database_connection));

        Self {
            login_code_adapter: Arc::new(LoginCodeService::new(user_repository, code_length)),
        }
    }
}

impl Locator for ApplicationPortLocator {
    #[instrument(level = "trace", skip(self))]
    fn get_login_code_port(&self) -> &(dyn LoginCodePort + Send + Sync) {
        &*self.login_code_adapter
    }
}
