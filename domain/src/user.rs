use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain_shared::login_code::{CodeHolder, LoginCode};
use domain_shared::school::{ClassId, Role, SchoolContext, SchoolId, UserId};
use thiserror::Error;
use tracing::instrument;

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub user_id: UserId,
    pub school_id: SchoolId,
    pub full_name: String,
    pub role: Role,
    pub login_code: Option<LoginCode>,
    pub current_class_id: Option<ClassId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.full_name
    }

    pub fn login_code(&self) -> Option<&LoginCode> {
        self.login_code.as_ref()
    }

    /// Students already signing in with a `PRT` code are parent proxies and
    /// keep that prefix when their code is reissued.
    pub fn code_holder(&self) -> Option<CodeHolder> {
        let holder = self.role.code_holder()?;
        match self.login_code().and_then(LoginCode::holder) {
            Some(CodeHolder::ParentProxy) if holder == CodeHolder::Student => {
                Some(CodeHolder::ParentProxy)
            }
            _ => Some(holder),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub school_id: SchoolId,
    pub full_name: String,
    pub role: Role,
    pub login_code: LoginCode,
    pub current_class_id: Option<ClassId>,
    pub created_at: DateTime<Utc>,
}

#[instrument(level = "trace", skip(login_code))]
pub fn create_new_user(
    context: &SchoolContext,
    full_name: String,
    holder: CodeHolder,
    login_code: LoginCode,
    current_class_id: Option<ClassId>,
) -> NewUser {
    NewUser {
        school_id: context.school_id,
        full_name,
        role: holder.role(),
        login_code,
        current_class_id,
        created_at: Utc::now(),
    }
}

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError>;
    async fn find_by_login_code(
        &self,
        school_id: SchoolId,
        login_code: &LoginCode,
    ) -> Result<Option<User>, UserRepositoryError>;
    /// Names are not unique, so every match is returned.
    async fn find_by_full_name(
        &self,
        school_id: SchoolId,
        full_name: &str,
    ) -> Result<Vec<User>, UserRepositoryError>;
    /// Looks across every school; codes are global credentials.
    async fn exists_by_login_code(&self, login_code: &LoginCode)
        -> Result<bool, UserRepositoryError>;
    async fn find_without_login_code(
        &self,
        school_id: SchoolId,
        role: Option<Role>,
    ) -> Result<Vec<User>, UserRepositoryError>;
    async fn find_with_login_code(&self, school_id: SchoolId)
        -> Result<Vec<User>, UserRepositoryError>;
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;
    /// Fails with a store error when no user has `user_id`.
    async fn update_login_code(
        &self,
        user_id: UserId,
        login_code: &LoginCode,
    ) -> Result<(), UserRepositoryError>;
    async fn deactivate_non_admins(&self, school_id: SchoolId) -> Result<u64, UserRepositoryError>;
    async fn clear_non_admin_login_codes(
        &self,
        school_id: SchoolId,
    ) -> Result<u64, UserRepositoryError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserRepositoryError {
    #[error("{0}")]
    Store(String),
    #[error("Login code is already held by another user")]
    LoginCodeTaken,
}
