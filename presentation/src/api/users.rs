use crate::api::error::ApiError;
use crate::api::AcademicYearQuery;
use crate::application_ports::Locator;
use application_ports::login_code::{IssuedCodeDto, LoginCodeError, NewUserDto, UserDto};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domain_shared::login_code::{CodeHolder, LoginCode};
use domain_shared::school::{ClassId, UserId};
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    full_name: String,
    holder: CodeHolder,
    class_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AssignCodeRequest {
    code: String,
}

#[instrument(level = "info", skip(service_locator, query, request))]
pub async fn create_user_handler<L: Locator>(
    State(service_locator): State<L>,
    Path(school_id): Path<i64>,
    Query(query): Query<AcademicYearQuery>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let CreateUserRequest {
        full_name,
        holder,
        class_id,
    } = request;

    let user = service_locator
        .get_login_code_port()
        .create_user(
            &query.context(school_id),
            NewUserDto {
                full_name,
                holder,
                current_class_id: class_id.map(ClassId),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(level = "info", skip(service_locator, query))]
pub async fn issue_code_handler<L: Locator>(
    State(service_locator): State<L>,
    Path((school_id, user_id)): Path<(i64, i64)>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<IssuedCodeDto>, ApiError> {
    let issued = service_locator
        .get_login_code_port()
        .issue_code(&query.context(school_id), UserId(user_id))
        .await?;

    Ok(Json(issued))
}

#[instrument(level = "info", skip(service_locator, query, request))]
pub async fn assign_code_handler<L: Locator>(
    State(service_locator): State<L>,
    Path((school_id, user_id)): Path<(i64, i64)>,
    Query(query): Query<AcademicYearQuery>,
    Json(request): Json<AssignCodeRequest>,
) -> Result<StatusCode, ApiError> {
    let login_code = LoginCode::parse(&request.code)
        .map_err(|err| LoginCodeError::Validation(err.to_string()))?;

    service_locator
        .get_login_code_port()
        .assign_code(&query.context(school_id), UserId(user_id), login_code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
