use application_ports::login_code::{
    BulkFailure, BulkGenerateReport, CodeExportRowDto, CodeImportRow, CodeStatisticsDto,
    ImportReport, ImportRowError, IssuedCodeDto, LoginCodeError, LoginCodePort, NewUserDto,
    ResetReportDto, UserDto,
};
use async_trait::async_trait;
use domain::login_code::{generate_unique_code, UniqueCodeError};
use domain::user::{create_new_user, User, UserRepository, UserRepositoryError};
use domain_shared::login_code::{CodeHolder, LoginCode};
use domain_shared::school::{Role, SchoolContext, UserId};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Generate-and-write cycles tried when the store rejects a freshly checked
/// code because someone else wrote it in between.
pub const MAX_WRITE_CONFLICT_RETRIES: usize = 3;

pub struct LoginCodeService {
    user_repository: Arc<dyn UserRepository + Send + Sync>,
    code_length: usize,
}

impl LoginCodeService {
    #[instrument(level = "trace", skip(user_repository))]
    pub fn new(user_repository: Arc<dyn UserRepository + Send + Sync>, code_length: usize) -> Self {
        Self {
            user_repository,
            code_length,
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn generate_unique(&self, holder: CodeHolder) -> Result<LoginCode, LoginCodeError> {
        generate_unique_code(holder, self.code_length, |candidate| async move {
            self.user_repository.exists_by_login_code(&candidate).await
        })
        .await
        .map_err(map_unique_code_err)
    }

    #[instrument(level = "debug", skip(self))]
    async fn write_fresh_code(
        &self,
        user_id: UserId,
        holder: CodeHolder,
    ) -> Result<LoginCode, LoginCodeError> {
        for attempt in 1..=MAX_WRITE_CONFLICT_RETRIES {
            let login_code = self.generate_unique(holder).await?;

            match self
                .user_repository
                .update_login_code(user_id, &login_code)
                .await
            {
                Ok(()) => return Ok(login_code),
                Err(UserRepositoryError::LoginCodeTaken) => {
                    warn!(
                        user_id = user_id.0,
                        attempt, "Login code was claimed concurrently, drawing another one",
                    );
                }
                Err(err) => return Err(map_user_repo_err(err)),
            }
        }

        Err(LoginCodeError::ExhaustedAttempts(MAX_WRITE_CONFLICT_RETRIES))
    }

    #[instrument(level = "debug", skip(self))]
    async fn load_user(
        &self,
        context: &SchoolContext,
        user_id: UserId,
    ) -> Result<User, LoginCodeError> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await
            .map_err(map_user_repo_err)?
            .ok_or_else(|| LoginCodeError::Store(format!("No user with id {}", user_id)))?;

        if user.school_id != context.school_id {
            warn!(
                user_id = user_id.0,
                school_id = context.school_id.0,
                "Tried to touch a user of another school",
            );
            return Err(LoginCodeError::Validation(format!(
                "User {} does not belong to school {}",
                user_id, context.school_id.0,
            )));
        }

        Ok(user)
    }

    #[instrument(level = "debug", skip(self))]
    async fn issue_bulk_entry(
        &self,
        context: &SchoolContext,
        user_id: UserId,
        holder: CodeHolder,
    ) -> Result<IssuedCodeDto, LoginCodeError> {
        let user = self.load_user(context, user_id).await?;
        if user.role == Role::Admin {
            return Err(admin_holds_no_code());
        }
        if holder.role() != user.role {
            return Err(holder_role_mismatch(holder.prefix(), user.role));
        }

        let login_code = self.write_fresh_code(user_id, holder).await?;

        Ok(IssuedCodeDto {
            user_id,
            name: user.full_name,
            login_code,
        })
    }

    #[instrument(level = "debug", skip(self, row), fields(row_number = row.row_number))]
    async fn import_row(
        &self,
        context: &SchoolContext,
        row: &CodeImportRow,
    ) -> Result<IssuedCodeDto, String> {
        let full_name = row.full_name.trim();
        if full_name.is_empty() || row.login_code.trim().is_empty() {
            return Err("Missing full name or login code".to_string());
        }

        let login_code = LoginCode::parse(&row.login_code).map_err(|err| err.to_string())?;

        let mut matches = self
            .user_repository
            .find_by_full_name(context.school_id, full_name)
            .await
            .map_err(|err| err.to_string())?;
        let user = match matches.len() {
            0 => return Err(format!("No user named {:?}", full_name)),
            1 => matches.remove(0),
            n => return Err(format!("{} users are named {:?}", n, full_name)),
        };
        if user.role == Role::Admin {
            return Err(admin_holds_no_code().to_string());
        }
        check_code_fits_role(&login_code, user.role).map_err(|err| err.to_string())?;

        self.user_repository
            .update_login_code(user.user_id(), &login_code)
            .await
            .map_err(|err| err.to_string())?;

        Ok(IssuedCodeDto {
            user_id: user.user_id(),
            name: user.full_name,
            login_code,
        })
    }
}

#[async_trait]
impl LoginCodePort for LoginCodeService {
    #[instrument(level = "info", skip(self, login_code))]
    async fn assign_code(
        &self,
        context: &SchoolContext,
        user_id: UserId,
        login_code: LoginCode,
    ) -> Result<(), LoginCodeError> {
        let user = self.load_user(context, user_id).await?;
        if user.role == Role::Admin {
            return Err(admin_holds_no_code());
        }
        check_code_fits_role(&login_code, user.role)?;

        self.user_repository
            .update_login_code(user_id, &login_code)
            .await
            .map_err(map_user_repo_err)?;

        info!(user_id = user_id.0, "Login code assigned");

        Ok(())
    }

    #[instrument(level = "info", skip(self))]
    async fn issue_code(
        &self,
        context: &SchoolContext,
        user_id: UserId,
    ) -> Result<IssuedCodeDto, LoginCodeError> {
        let user = self.load_user(context, user_id).await?;
        let holder = user.code_holder().ok_or_else(admin_holds_no_code)?;

        let login_code = self.write_fresh_code(user_id, holder).await?;

        info!(user_id = user_id.0, holder = %holder, "Login code issued");

        Ok(IssuedCodeDto {
            user_id,
            name: user.full_name,
            login_code,
        })
    }

    #[instrument(level = "info", skip(self, user_ids), fields(users = user_ids.len()))]
    async fn bulk_generate(
        &self,
        context: &SchoolContext,
        user_ids: Vec<UserId>,
        holder: CodeHolder,
    ) -> Result<BulkGenerateReport, LoginCodeError> {
        if user_ids.is_empty() {
            return Err(LoginCodeError::Validation("No users selected".to_string()));
        }

        let mut report = BulkGenerateReport::default();

        for user_id in user_ids {
            match self.issue_bulk_entry(context, user_id, holder).await {
                Ok(issued) => report.issued.push(issued),
                Err(error) => {
                    warn!(
                        user_id = user_id.0,
                        error = %error,
                        issued = report.issued.len(),
                        "Bulk code generation aborted",
                    );
                    report.failure = Some(BulkFailure { user_id, error });
                    break;
                }
            }
        }

        info!(issued = report.issued.len(), "Bulk code generation finished");

        Ok(report)
    }

    #[instrument(level = "info", skip(self))]
    async fn generate_missing_codes(
        &self,
        context: &SchoolContext,
        holder: CodeHolder,
    ) -> Result<BulkGenerateReport, LoginCodeError> {
        if holder == CodeHolder::ParentProxy {
            return Err(LoginCodeError::Validation(
                "Parent codes are issued when the parent account is created".to_string(),
            ));
        }

        let users = self
            .user_repository
            .find_without_login_code(context.school_id, Some(holder.role()))
            .await
            .map_err(map_user_repo_err)?;

        let mut report = BulkGenerateReport::default();
        if users.is_empty() {
            info!(holder = %holder, "Every user already has a login code");
            return Ok(report);
        }

        for user in users {
            let user_id = user.user_id();
            match self.write_fresh_code(user_id, holder).await {
                Ok(login_code) => report.issued.push(IssuedCodeDto {
                    user_id,
                    name: user.full_name,
                    login_code,
                }),
                Err(error) => {
                    warn!(
                        user_id = user_id.0,
                        error = %error,
                        issued = report.issued.len(),
                        "Generating missing codes aborted",
                    );
                    report.failure = Some(BulkFailure { user_id, error });
                    break;
                }
            }
        }

        info!(
            holder = %holder,
            issued = report.issued.len(),
            "Missing login codes generated",
        );

        Ok(report)
    }

    #[instrument(level = "info", skip(self))]
    async fn code_statistics(
        &self,
        context: &SchoolContext,
    ) -> Result<CodeStatisticsDto, LoginCodeError> {
        let users = self
            .user_repository
            .find_without_login_code(context.school_id, None)
            .await
            .map_err(map_user_repo_err)?;

        let count_role = |role: Role| users.iter().filter(|u| u.role == role).count();

        Ok(CodeStatisticsDto {
            teachers_without_code: count_role(Role::Teacher),
            students_without_code: count_role(Role::Student),
            total_without_code: users.len(),
        })
    }

    #[instrument(level = "info", skip(self))]
    async fn reset_all_codes(
        &self,
        context: &SchoolContext,
    ) -> Result<ResetReportDto, LoginCodeError> {
        let deactivated = self
            .user_repository
            .deactivate_non_admins(context.school_id)
            .await
            .map_err(map_user_repo_err)?;

        let cleared = self
            .user_repository
            .clear_non_admin_login_codes(context.school_id)
            .await
            .map_err(|err| {
                error!(
                    school_id = context.school_id.0,
                    deactivated, "Accounts were deactivated but their codes were not cleared",
                );
                map_user_repo_err(err)
            })?;

        warn!(
            school_id = context.school_id.0,
            deactivated, cleared, "All login codes of the school were reset",
        );

        Ok(ResetReportDto {
            deactivated,
            cleared,
        })
    }

    #[instrument(level = "info", skip(self))]
    async fn create_user(
        &self,
        context: &SchoolContext,
        new_user: NewUserDto,
    ) -> Result<UserDto, LoginCodeError> {
        let NewUserDto {
            full_name,
            holder,
            current_class_id,
        } = new_user;

        let full_name = full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(LoginCodeError::Validation(
                "Full name is required".to_string(),
            ));
        }

        for attempt in 1..=MAX_WRITE_CONFLICT_RETRIES {
            let login_code = self.generate_unique(holder).await?;
            let user = create_new_user(
                context,
                full_name.clone(),
                holder,
                login_code,
                current_class_id,
            );

            match self.user_repository.insert(&user).await {
                Ok(user) => {
                    info!(user_id = user.user_id().0, holder = %holder, "User created");
                    return Ok(to_user_dto(user));
                }
                Err(UserRepositoryError::LoginCodeTaken) => {
                    warn!(
                        attempt,
                        "Login code was claimed concurrently, drawing another one"
                    );
                }
                Err(err) => return Err(map_user_repo_err(err)),
            }
        }

        Err(LoginCodeError::ExhaustedAttempts(MAX_WRITE_CONFLICT_RETRIES))
    }

    #[instrument(level = "info", skip(self, rows), fields(rows = rows.len()))]
    async fn import_codes(
        &self,
        context: &SchoolContext,
        rows: Vec<CodeImportRow>,
    ) -> Result<ImportReport, LoginCodeError> {
        if rows.is_empty() {
            return Err(LoginCodeError::Validation(
                "No rows to import".to_string(),
            ));
        }

        let mut report = ImportReport::default();

        for row in &rows {
            match self.import_row(context, row).await {
                Ok(imported) => report.imported.push(imported),
                Err(reason) => {
                    warn!(row_number = row.row_number, reason = %reason, "Skipped import row");
                    report.errors.push(ImportRowError {
                        row_number: row.row_number,
                        reason,
                    });
                }
            }
        }

        info!(
            imported = report.imported.len(),
            errors = report.errors.len(),
            "Login codes imported",
        );

        Ok(report)
    }

    #[instrument(level = "info", skip(self, login_code))]
    async fn find_user_by_code(
        &self,
        context: &SchoolContext,
        login_code: LoginCode,
    ) -> Result<Option<UserDto>, LoginCodeError> {
        let user = self
            .user_repository
            .find_by_login_code(context.school_id, &login_code)
            .await
            .map_err(map_user_repo_err)?;

        Ok(user.map(to_user_dto))
    }

    #[instrument(level = "info", skip(self))]
    async fn export_codes(
        &self,
        context: &SchoolContext,
    ) -> Result<Vec<CodeExportRowDto>, LoginCodeError> {
        let users = self
            .user_repository
            .find_with_login_code(context.school_id)
            .await
            .map_err(map_user_repo_err)?;

        let mut rows: Vec<CodeExportRowDto> = users
            .into_iter()
            .filter_map(|user| {
                let login_code = user.login_code?;
                Some(CodeExportRowDto {
                    full_name: user.full_name,
                    role: user.role,
                    login_code,
                    current_class_id: user.current_class_id,
                })
            })
            .collect();
        rows.sort_by(|a, b| (a.role, &a.full_name).cmp(&(b.role, &b.full_name)));

        Ok(rows)
    }
}

fn admin_holds_no_code() -> LoginCodeError {
    LoginCodeError::Validation("Administrators do not hold login codes".to_string())
}

fn holder_role_mismatch(prefix: &str, role: Role) -> LoginCodeError {
    LoginCodeError::Validation(format!("A {} code cannot be given to a {}", prefix, role))
}

fn check_code_fits_role(login_code: &LoginCode, role: Role) -> Result<(), LoginCodeError> {
    match login_code.holder() {
        Some(holder) if holder.role() == role => Ok(()),
        Some(holder) => Err(holder_role_mismatch(holder.prefix(), role)),
        None => Err(LoginCodeError::Validation(format!(
            "Login code {} has no known prefix",
            login_code
        ))),
    }
}

fn to_user_dto(user: User) -> UserDto {
    UserDto {
        user_id: user.user_id,
        full_name: user.full_name,
        role: user.role,
        login_code: user.login_code,
        current_class_id: user.current_class_id,
        is_active: user.is_active,
        created_at: user.created_at,
    }
}

#[instrument(level = "trace", skip_all)]
fn map_user_repo_err(err: UserRepositoryError) -> LoginCodeError {
    match err {
        UserRepositoryError::Store(message) => {
            error!(error = %message, "UserRepositoryError::Store");
            LoginCodeError::Store(message)
        }
        UserRepositoryError::LoginCodeTaken => {
            warn!("UserRepositoryError::LoginCodeTaken");
            LoginCodeError::Validation(UserRepositoryError::LoginCodeTaken.to_string())
        }
    }
}

#[instrument(level = "trace", skip_all)]
fn map_unique_code_err(err: UniqueCodeError) -> LoginCodeError {
    match err {
        UniqueCodeError::ExhaustedAttempts(attempts) => LoginCodeError::ExhaustedAttempts(attempts),
        UniqueCodeError::Store(message) => {
            error!(error = %message, "UniqueCodeError::Store");
            LoginCodeError::Store(message)
        }
    }
}
