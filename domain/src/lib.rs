pub mod login_code;
pub mod user;
