pub mod login_code;
pub mod school;
