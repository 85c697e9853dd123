use crate::application_ports::Locator;
use axum::routing::{get, post};
use axum::Router;
use domain_shared::school::{AcademicYearId, SchoolContext, SchoolId};
use serde::Deserialize;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

pub mod codes;
pub mod error;
pub mod users;

/// Optional query string accepted by every school route.
#[derive(Debug, Default, Deserialize)]
pub struct AcademicYearQuery {
    pub academic_year_id: Option<i64>,
}

impl AcademicYearQuery {
    pub fn context(&self, school_id: i64) -> SchoolContext {
        SchoolContext::new(
            SchoolId(school_id),
            self.academic_year_id.map(AcademicYearId),
        )
    }
}

pub fn create_router<L: Locator + Send + Sync + Clone + 'static>() -> Router<L> {
    Router::new()
        .route(
            "/schools/{school_id}/codes/statistics",
            get(codes::statistics_handler::<L>),
        )
        .route(
            "/schools/{school_id}/codes/generate",
            post(codes::generate_missing_handler::<L>),
        )
        .route(
            "/schools/{school_id}/codes/bulk",
            post(codes::bulk_generate_handler::<L>),
        )
        .route(
            "/schools/{school_id}/codes/reset",
            post(codes::reset_handler::<L>),
        )
        .route(
            "/schools/{school_id}/codes/export",
            get(codes::export_handler::<L>),
        )
        .route(
            "/schools/{school_id}/codes/{code}",
            get(codes::find_by_code_handler::<L>),
        )
        .route(
            "/schools/{school_id}/users",
            post(users::create_user_handler::<L>),
        )
        .route(
            "/schools/{school_id}/users/{user_id}/code",
            post(users::issue_code_handler::<L>).put(users::assign_code_handler::<L>),
        )
}

#[instrument(level = "info", skip(locator))]
pub async fn run_api<L: Locator + Send + Sync + Clone + 'static>(
    locator: L,
    address: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let router: Router<()> = create_router::<L>()
        .layer(TraceLayer::new_for_http())
        .with_state(locator);

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(%address, "Admin API listening");

    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
