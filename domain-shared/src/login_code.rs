use crate::school::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters a login code body is drawn from.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The kind of account a login code belongs to, encoded as the code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeHolder {
    Teacher,
    Student,
    /// A student-role account used by a parent.
    ParentProxy,
}

impl CodeHolder {
    pub const ALL: [CodeHolder; 3] = [
        CodeHolder::Teacher,
        CodeHolder::Student,
        CodeHolder::ParentProxy,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            CodeHolder::Teacher => "TCH",
            CodeHolder::Student => "STD",
            CodeHolder::ParentProxy => "PRT",
        }
    }

    /// Role of the user record that holds a code of this kind.
    pub fn role(&self) -> Role {
        match self {
            CodeHolder::Teacher => Role::Teacher,
            CodeHolder::Student | CodeHolder::ParentProxy => Role::Student,
        }
    }

    pub fn from_prefix(code: &str) -> Option<CodeHolder> {
        Self::ALL
            .into_iter()
            .find(|holder| code.starts_with(holder.prefix()))
    }
}

impl fmt::Display for CodeHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeHolder::Teacher => f.write_str("teacher"),
            CodeHolder::Student => f.write_str("student"),
            CodeHolder::ParentProxy => f.write_str("parent"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown code holder {0:?}, expected teacher, student or parent")]
pub struct UnknownCodeHolder(pub String);

impl FromStr for CodeHolder {
    type Err = UnknownCodeHolder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(CodeHolder::Teacher),
            "student" => Ok(CodeHolder::Student),
            "parent" | "parent_proxy" => Ok(CodeHolder::ParentProxy),
            _ => Err(UnknownCodeHolder(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoginCode(pub String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidLoginCode {
    #[error("Login code is empty")]
    Empty,
    #[error("Login code {0:?} does not start with TCH, STD or PRT")]
    UnknownPrefix(String),
    #[error("Login code {0:?} has no characters after its prefix")]
    MissingBody(String),
    #[error("Login code {0:?} may only contain A-Z and 0-9")]
    InvalidCharacter(String),
}

impl LoginCode {
    /// Parses a code typed or imported by a human. Surrounding whitespace is
    /// dropped and letters are upper-cased.
    pub fn parse(raw: &str) -> Result<Self, InvalidLoginCode> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(InvalidLoginCode::Empty);
        }

        let holder =
            CodeHolder::from_prefix(&code).ok_or(InvalidLoginCode::UnknownPrefix(code.clone()))?;
        let body = &code[holder.prefix().len()..];
        if body.is_empty() {
            return Err(InvalidLoginCode::MissingBody(code));
        }
        if !body.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            return Err(InvalidLoginCode::InvalidCharacter(code));
        }

        Ok(LoginCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn holder(&self) -> Option<CodeHolder> {
        CodeHolder::from_prefix(&self.0)
    }
}

impl fmt::Display for LoginCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
