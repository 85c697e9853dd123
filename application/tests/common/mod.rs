use async_trait::async_trait;
use chrono::Utc;
use domain::user::{NewUser, User, UserRepository, UserRepositoryError};
use domain_shared::login_code::LoginCode;
use domain_shared::school::{ClassId, Role, SchoolContext, SchoolId, UserId};
use std::sync::Mutex;

pub const SCHOOL: SchoolId = SchoolId(1);
pub const OTHER_SCHOOL: SchoolId = SchoolId(2);

pub fn context() -> SchoolContext {
    SchoolContext::new(SCHOOL, None)
}

/// Keeps users in memory and rejects duplicate login codes the same way the
/// unique index of the real table does.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn seed(
        &self,
        school_id: SchoolId,
        full_name: &str,
        role: Role,
        login_code: Option<&str>,
    ) -> UserId {
        let mut users = self.users.lock().unwrap();
        let user_id = UserId(users.len() as i64 + 1);
        users.push(User {
            user_id,
            school_id,
            full_name: full_name.to_string(),
            role,
            login_code: login_code.map(|c| LoginCode(c.to_string())),
            current_class_id: Some(ClassId(10)),
            is_active: true,
            created_at: Utc::now(),
        });
        user_id
    }

    pub fn get(&self, user_id: UserId) -> User {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned()
            .unwrap()
    }

    fn code_taken(users: &[User], login_code: &LoginCode, except: Option<UserId>) -> bool {
        users
            .iter()
            .any(|u| u.login_code.as_ref() == Some(login_code) && Some(u.user_id) != except)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_by_login_code(
        &self,
        school_id: SchoolId,
        login_code: &LoginCode,
    ) -> Result<Option<User>, UserRepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.school_id == school_id && u.login_code.as_ref() == Some(login_code))
            .cloned())
    }

    async fn find_by_full_name(
        &self,
        school_id: SchoolId,
        full_name: &str,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.school_id == school_id && u.full_name == full_name)
            .cloned()
            .collect())
    }

    async fn exists_by_login_code(
        &self,
        login_code: &LoginCode,
    ) -> Result<bool, UserRepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(Self::code_taken(&users, login_code, None))
    }

    async fn find_without_login_code(
        &self,
        school_id: SchoolId,
        role: Option<Role>,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.school_id == school_id && u.login_code.is_none())
            .filter(|u| role.map_or(true, |role| u.role == role))
            .cloned()
            .collect())
    }

    async fn find_with_login_code(
        &self,
        school_id: SchoolId,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.school_id == school_id && u.login_code.is_some())
            .cloned()
            .collect())
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut users = self.users.lock().unwrap();
        if Self::code_taken(&users, &user.login_code, None) {
            return Err(UserRepositoryError::LoginCodeTaken);
        }
        let created = User {
            user_id: UserId(users.len() as i64 + 1),
            school_id: user.school_id,
            full_name: user.full_name.clone(),
            role: user.role,
            login_code: Some(user.login_code.clone()),
            current_class_id: user.current_class_id,
            is_active: true,
            created_at: user.created_at,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_login_code(
        &self,
        user_id: UserId,
        login_code: &LoginCode,
    ) -> Result<(), UserRepositoryError> {
        let mut users = self.users.lock().unwrap();
        if Self::code_taken(&users, login_code, Some(user_id)) {
            return Err(UserRepositoryError::LoginCodeTaken);
        }
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| UserRepositoryError::Store(format!("No user with id {}", user_id)))?;
        user.login_code = Some(login_code.clone());
        Ok(())
    }

    async fn deactivate_non_admins(&self, school_id: SchoolId) -> Result<u64, UserRepositoryError> {
        let mut users = self.users.lock().unwrap();
        let mut touched = 0;
        for user in users
            .iter_mut()
            .filter(|u| u.school_id == school_id && u.role != Role::Admin)
        {
            user.is_active = false;
            touched += 1;
        }
        Ok(touched)
    }

    async fn clear_non_admin_login_codes(
        &self,
        school_id: SchoolId,
    ) -> Result<u64, UserRepositoryError> {
        let mut users = self.users.lock().unwrap();
        let mut touched = 0;
        for user in users
            .iter_mut()
            .filter(|u| u.school_id == school_id && u.role != Role::Admin)
        {
            user.login_code = None;
            touched += 1;
        }
        Ok(touched)
    }
}
