use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain_shared::login_code::{CodeHolder, LoginCode};
use domain_shared::school::{ClassId, Role, SchoolContext, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Issuing, assigning and revoking login codes for the users of a school.
#[async_trait]
pub trait LoginCodePort {
    /// Writes `login_code` to a user of the school. The prefix must match the
    /// user's role. No uniqueness check is made here; the store rejects
    /// duplicates.
    async fn assign_code(
        &self,
        context: &SchoolContext,
        user_id: UserId,
        login_code: LoginCode,
    ) -> Result<(), LoginCodeError>;

    /// Replaces the user's code with a freshly generated unique one.
    async fn issue_code(
        &self,
        context: &SchoolContext,
        user_id: UserId,
    ) -> Result<IssuedCodeDto, LoginCodeError>;

    /// Issues `holder` codes to each user in order, stopping at the first
    /// failure. Codes written before the failure are kept.
    async fn bulk_generate(
        &self,
        context: &SchoolContext,
        user_ids: Vec<UserId>,
        holder: CodeHolder,
    ) -> Result<BulkGenerateReport, LoginCodeError>;

    /// Runs [`LoginCodePort::bulk_generate`] over every user of the holder's
    /// role that has no code yet.
    async fn generate_missing_codes(
        &self,
        context: &SchoolContext,
        holder: CodeHolder,
    ) -> Result<BulkGenerateReport, LoginCodeError>;

    async fn code_statistics(
        &self,
        context: &SchoolContext,
    ) -> Result<CodeStatisticsDto, LoginCodeError>;

    /// Deactivates every non-admin account of the school, then clears their
    /// codes. The two writes are not atomic.
    async fn reset_all_codes(&self, context: &SchoolContext)
        -> Result<ResetReportDto, LoginCodeError>;

    async fn create_user(
        &self,
        context: &SchoolContext,
        new_user: NewUserDto,
    ) -> Result<UserDto, LoginCodeError>;

    /// Best effort: a bad row is reported and the remaining rows are still
    /// written.
    async fn import_codes(
        &self,
        context: &SchoolContext,
        rows: Vec<CodeImportRow>,
    ) -> Result<ImportReport, LoginCodeError>;

    async fn find_user_by_code(
        &self,
        context: &SchoolContext,
        login_code: LoginCode,
    ) -> Result<Option<UserDto>, LoginCodeError>;

    async fn export_codes(
        &self,
        context: &SchoolContext,
    ) -> Result<Vec<CodeExportRowDto>, LoginCodeError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginCodeError {
    #[error("No unused login code found after {0} attempts")]
    ExhaustedAttempts(usize),
    #[error("{0}")]
    Store(String),
    #[error("Invalid input: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IssuedCodeDto {
    pub user_id: UserId,
    pub name: String,
    pub login_code: LoginCode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkFailure {
    pub user_id: UserId,
    pub error: LoginCodeError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkGenerateReport {
    pub issued: Vec<IssuedCodeDto>,
    pub failure: Option<BulkFailure>,
}

impl BulkGenerateReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CodeStatisticsDto {
    pub teachers_without_code: usize,
    pub students_without_code: usize,
    /// Includes admins, who never receive a code.
    pub total_without_code: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResetReportDto {
    pub deactivated: u64,
    pub cleared: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewUserDto {
    pub full_name: String,
    pub holder: CodeHolder,
    pub current_class_id: Option<ClassId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserDto {
    pub user_id: UserId,
    pub full_name: String,
    pub role: Role,
    pub login_code: Option<LoginCode>,
    pub current_class_id: Option<ClassId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One imported line. `row_number` is the 1-based line in the source file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CodeImportRow {
    pub row_number: usize,
    pub full_name: String,
    pub login_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportRowError {
    pub row_number: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<IssuedCodeDto>,
    pub errors: Vec<ImportRowError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CodeExportRowDto {
    pub full_name: String,
    pub role: Role,
    pub login_code: LoginCode,
    pub current_class_id: Option<ClassId>,
}
