use async_trait::async_trait;
use chrono::NaiveDateTime;
use domain::user::{NewUser, User, UserRepository, UserRepositoryError};
use domain_shared::login_code::LoginCode;
use domain_shared::school::{ClassId, Role, SchoolId, UserId};
use sqlx::{query, query_as, query_scalar, FromRow, PgPool};
use tracing::{instrument, warn};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    #[instrument(level = "trace", skip_all)]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    school_id: i64,
    full_name: String,
    role: String,
    login_code: Option<String>,
    current_class_id: Option<i64>,
    is_active: bool,
    created_at: NaiveDateTime,
}

impl UserRow {
    fn into_user(self) -> Result<User, UserRepositoryError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|err| UserRepositoryError::Store(err.to_string()))?;

        Ok(User {
            user_id: UserId(self.id),
            school_id: SchoolId(self.school_id),
            full_name: self.full_name,
            role,
            login_code: self.login_code.map(LoginCode),
            current_class_id: self.current_class_id.map(ClassId),
            is_active: self.is_active,
            created_at: self.created_at.and_utc(),
        })
    }
}

fn into_users(rows: Vec<UserRow>) -> Result<Vec<User>, UserRepositoryError> {
    rows.into_iter().map(UserRow::into_user).collect()
}

fn map_sqlx_err(err: sqlx::Error, action: &str) -> UserRepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            warn!(error = ?err, "{}: login code already taken", action);
            return UserRepositoryError::LoginCodeTaken;
        }
    }

    warn!(error = ?err, "{}", action);
    UserRepositoryError::Store(err.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(level = "debug", err, skip(self))]
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let row = query_as::<_, UserRow>(
            "SELECT id, school_id, full_name, role, login_code, current_class_id, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_err(err, "Failed to fetch user"))?;

        row.map(UserRow::into_user).transpose()
    }

    #[instrument(level = "debug", err, skip(self, login_code))]
    async fn find_by_login_code(
        &self,
        school_id: SchoolId,
        login_code: &LoginCode,
    ) -> Result<Option<User>, UserRepositoryError> {
        let row = query_as::<_, UserRow>(
            "SELECT id, school_id, full_name, role, login_code, current_class_id, is_active, created_at FROM users WHERE school_id = $1 AND login_code = $2",
        )
        .bind(school_id.0)
        .bind(login_code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| map_sqlx_err(err, "Failed to fetch user by login code"))?;

        row.map(UserRow::into_user).transpose()
    }

    #[instrument(level = "debug", err, skip(self))]
    async fn find_by_full_name(
        &self,
        school_id: SchoolId,
        full_name: &str,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let rows = query_as::<_, UserRow>(
            "SELECT id, school_id, full_name, role, login_code, current_class_id, is_active, created_at FROM users WHERE school_id = $1 AND full_name = $2 ORDER BY id",
        )
        .bind(school_id.0)
        .bind(full_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_err(err, "Failed to fetch users by name"))?;

        into_users(rows)
    }

    #[instrument(level = "debug", err, skip(self, login_code))]
    async fn exists_by_login_code(
        &self,
        login_code: &LoginCode,
    ) -> Result<bool, UserRepositoryError> {
        query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE login_code = $1)")
            .bind(login_code.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_sqlx_err(err, "Failed to check login code"))
    }

    #[instrument(level = "debug", err, skip(self))]
    async fn find_without_login_code(
        &self,
        school_id: SchoolId,
        role: Option<Role>,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let rows = query_as::<_, UserRow>(
            "SELECT id, school_id, full_name, role, login_code, current_class_id, is_active, created_at FROM users WHERE school_id = $1 AND login_code IS NULL AND ($2::TEXT IS NULL OR role = $2) ORDER BY full_name",
        )
        .bind(school_id.0)
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_err(err, "Failed to fetch users without login code"))?;

        into_users(rows)
    }

    #[instrument(level = "debug", err, skip(self))]
    async fn find_with_login_code(
        &self,
        school_id: SchoolId,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let rows = query_as::<_, UserRow>(
            "SELECT id, school_id, full_name, role, login_code, current_class_id, is_active, created_at FROM users WHERE school_id = $1 AND login_code IS NOT NULL ORDER BY role, full_name",
        )
        .bind(school_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| map_sqlx_err(err, "Failed to fetch users with login code"))?;

        into_users(rows)
    }

    #[instrument(level = "debug", err, skip(self, user))]
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let NewUser {
            school_id,
            full_name,
            role,
            login_code,
            current_class_id,
            created_at,
        } = user;

        let row = query_as::<_, UserRow>(
            "INSERT INTO users (school_id, full_name, role, login_code, current_class_id, is_active, created_at) VALUES ($1, $2, $3, $4, $5, TRUE, $6) RETURNING id, school_id, full_name, role, login_code, current_class_id, is_active, created_at",
        )
        .bind(school_id.0)
        .bind(full_name.as_str())
        .bind(role.as_str())
        .bind(login_code.as_str())
        .bind(current_class_id.map(|c| c.0))
        .bind(created_at.naive_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_sqlx_err(err, "Failed to insert user"))?;

        row.into_user()
    }

    #[instrument(level = "debug", err, skip(self, login_code))]
    async fn update_login_code(
        &self,
        user_id: UserId,
        login_code: &LoginCode,
    ) -> Result<(), UserRepositoryError> {
        let result = query("UPDATE users SET login_code = $1 WHERE id = $2")
            .bind(login_code.as_str())
            .bind(user_id.0)
            .execute(&self.pool)
            .await
            .map_err(|err| map_sqlx_err(err, "Failed to update login code"))?;

        if result.rows_affected() == 0 {
            return Err(UserRepositoryError::Store(format!(
                "No user with id {}",
                user_id
            )));
        }

        Ok(())
    }

    #[instrument(level = "debug", err, skip(self))]
    async fn deactivate_non_admins(&self, school_id: SchoolId) -> Result<u64, UserRepositoryError> {
        let result =
            query("UPDATE users SET is_active = FALSE WHERE school_id = $1 AND role <> 'admin'")
                .bind(school_id.0)
                .execute(&self.pool)
                .await
                .map_err(|err| map_sqlx_err(err, "Failed to deactivate users"))?;

        Ok(result.rows_affected())
    }

    #[instrument(level = "debug", err, skip(self))]
    async fn clear_non_admin_login_codes(
        &self,
        school_id: SchoolId,
    ) -> Result<u64, UserRepositoryError> {
        let result =
            query("UPDATE users SET login_code = NULL WHERE school_id = $1 AND role <> 'admin'")
                .bind(school_id.0)
                .execute(&self.pool)
                .await
                .map_err(|err| map_sqlx_err(err, "Failed to clear login codes"))?;

        Ok(result.rows_affected())
    }
}
