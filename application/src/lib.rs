pub mod login_code;
