use crate::login_code::CodeHolder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchoolId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AcademicYearId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The school (and optionally the academic year) an admin is currently
/// working in. Every school-scoped operation receives one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchoolContext {
    pub school_id: SchoolId,
    pub academic_year_id: Option<AcademicYearId>,
}

impl SchoolContext {
    pub fn new(school_id: SchoolId, academic_year_id: Option<AcademicYearId>) -> Self {
        Self {
            school_id,
            academic_year_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Which kind of login code a user of this role holds. Admins sign in
    /// through a separate channel and never hold one.
    pub fn code_holder(&self) -> Option<CodeHolder> {
        match self {
            Role::Admin => None,
            Role::Teacher => Some(CodeHolder::Teacher),
            Role::Student => Some(CodeHolder::Student),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role {0:?}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_hold_no_code() {
        assert_eq!(Role::Admin.code_holder(), None);
        assert_eq!(Role::Teacher.code_holder(), Some(CodeHolder::Teacher));
        assert_eq!(Role::Student.code_holder(), Some(CodeHolder::Student));
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" student ".parse::<Role>(), Ok(Role::Student));
        assert!("super".parse::<Role>().is_err());
    }
}
