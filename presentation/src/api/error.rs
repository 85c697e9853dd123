use application_ports::login_code::LoginCodeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    LoginCode(LoginCodeError),
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::LoginCode(LoginCodeError::ExhaustedAttempts(_)) => StatusCode::CONFLICT,
            ApiError::LoginCode(LoginCodeError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::LoginCode(LoginCodeError::Store(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::LoginCode(err) => err.to_string(),
            ApiError::NotFound(message) => message,
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<LoginCodeError> for ApiError {
    fn from(value: LoginCodeError) -> Self {
        Self::LoginCode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_attempts_maps_to_409() {
        let res = ApiError::from(LoginCodeError::ExhaustedAttempts(10)).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_maps_to_400() {
        let res = ApiError::from(LoginCodeError::Validation("no users".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_maps_to_503() {
        let res = ApiError::from(LoginCodeError::Store("connection reset".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn missing_code_maps_to_404() {
        let res = ApiError::NotFound("STD12345".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
