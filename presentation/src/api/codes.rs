use crate::api::error::ApiError;
use crate::api::AcademicYearQuery;
use crate::application_ports::Locator;
use application_ports::login_code::{
    BulkGenerateReport, CodeExportRowDto, CodeStatisticsDto, IssuedCodeDto, LoginCodeError,
    ResetReportDto, UserDto,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use domain_shared::login_code::{CodeHolder, LoginCode};
use domain_shared::school::UserId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct GenerateMissingRequest {
    holder: CodeHolder,
}

#[derive(Debug, Deserialize)]
pub struct BulkGenerateRequest {
    user_ids: Vec<UserId>,
    holder: CodeHolder,
}

#[derive(Debug, Serialize)]
pub struct BulkFailureResponse {
    user_id: UserId,
    error: String,
}

/// A failed entry stops the batch; `issued` still lists what was written.
#[derive(Debug, Serialize)]
pub struct BulkGenerateResponse {
    issued: Vec<IssuedCodeDto>,
    failure: Option<BulkFailureResponse>,
}

impl From<BulkGenerateReport> for BulkGenerateResponse {
    fn from(report: BulkGenerateReport) -> Self {
        Self {
            issued: report.issued,
            failure: report.failure.map(|failure| BulkFailureResponse {
                user_id: failure.user_id,
                error: failure.error.to_string(),
            }),
        }
    }
}

#[instrument(level = "info", skip(service_locator, query))]
pub async fn statistics_handler<L: Locator>(
    State(service_locator): State<L>,
    Path(school_id): Path<i64>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<CodeStatisticsDto>, ApiError> {
    let statistics = service_locator
        .get_login_code_port()
        .code_statistics(&query.context(school_id))
        .await?;

    Ok(Json(statistics))
}

#[instrument(level = "info", skip(service_locator, query))]
pub async fn generate_missing_handler<L: Locator>(
    State(service_locator): State<L>,
    Path(school_id): Path<i64>,
    Query(query): Query<AcademicYearQuery>,
    Json(request): Json<GenerateMissingRequest>,
) -> Result<Json<BulkGenerateResponse>, ApiError> {
    let report = service_locator
        .get_login_code_port()
        .generate_missing_codes(&query.context(school_id), request.holder)
        .await?;

    Ok(Json(report.into()))
}

#[instrument(level = "info", skip(service_locator, query, request))]
pub async fn bulk_generate_handler<L: Locator>(
    State(service_locator): State<L>,
    Path(school_id): Path<i64>,
    Query(query): Query<AcademicYearQuery>,
    Json(request): Json<BulkGenerateRequest>,
) -> Result<Json<BulkGenerateResponse>, ApiError> {
    let report = service_locator
        .get_login_code_port()
        .bulk_generate(&query.context(school_id), request.user_ids, request.holder)
        .await?;

    Ok(Json(report.into()))
}

#[instrument(level = "info", skip(service_locator, query))]
pub async fn reset_handler<L: Locator>(
    State(service_locator): State<L>,
    Path(school_id): Path<i64>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<ResetReportDto>, ApiError> {
    let report = service_locator
        .get_login_code_port()
        .reset_all_codes(&query.context(school_id))
        .await?;

    Ok(Json(report))
}

#[instrument(level = "info", skip(service_locator, query))]
pub async fn export_handler<L: Locator>(
    State(service_locator): State<L>,
    Path(school_id): Path<i64>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<Vec<CodeExportRowDto>>, ApiError> {
    let rows = service_locator
        .get_login_code_port()
        .export_codes(&query.context(school_id))
        .await?;

    Ok(Json(rows))
}

#[instrument(level = "info", skip(service_locator, query, code))]
pub async fn find_by_code_handler<L: Locator>(
    State(service_locator): State<L>,
    Path((school_id, code)): Path<(i64, String)>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<UserDto>, ApiError> {
    let login_code =
        LoginCode::parse(&code).map_err(|err| LoginCodeError::Validation(err.to_string()))?;

    let user = service_locator
        .get_login_code_port()
        .find_user_by_code(&query.context(school_id), login_code.clone())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No user holds login code {}", login_code)))?;

    Ok(Json(user))
}
