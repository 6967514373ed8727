use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::MissingHeader;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        return Ok(reply_error(ApiErrorCode::InvalidRequest, e.to_string()));
    } else if err.find::<MissingHeader>().is_some() {
        ApiErrorCode::InvalidToken
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::NotFound
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let message = code.to_string();
    Ok(reply_error(code, message))
}

fn reply_error(code: ApiErrorCode, message: String) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    warp::reply::with_status(json, status)
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Request is missing or has invalid fields")]
    InvalidRequest,
    #[error("Invalid login id or password")]
    InvalidCredentials,
    #[error("Login id already taken")]
    UserExists,
    #[error("Secret not found")]
    SecretNotFound,
    #[error("Only admin users may manage secrets")]
    NotAdmin,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("No active session, authenticate again")]
    SessionNotFound,
    #[error("Refresh token expired, authenticate again")]
    RefreshDenied,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest
            | ApiErrorCode::InvalidCredentials
            | ApiErrorCode::UserExists
            | ApiErrorCode::SecretNotFound
            | ApiErrorCode::NotAdmin => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidToken | ApiErrorCode::SessionNotFound => StatusCode::UNAUTHORIZED,
            ApiErrorCode::RefreshDenied => StatusCode::EXPECTATION_FAILED,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A failed refresh is reported as `RefreshDenied` unless the session is
    /// gone or the server failed.
    pub fn refresh(error: SessionError) -> ApiErrorCode {
        match error {
            SessionError::Signing(e) => ApiErrorCode::internal(e),
            SessionError::UnknownSession => ApiErrorCode::SessionNotFound,
            _ => ApiErrorCode::RefreshDenied,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<SessionError> for ApiErrorCode {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Signing(e) => ApiErrorCode::internal(e),
            SessionError::UnknownSession => ApiErrorCode::SessionNotFound,
            SessionError::RotationCeilingExceeded => ApiErrorCode::RefreshDenied,
            SessionError::MalformedToken(_)
            | SessionError::InvalidSignature
            | SessionError::InvalidRefreshToken
            | SessionError::ExpiredToken
            | SessionError::InvalidIssuer => ApiErrorCode::InvalidToken,
        }
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials | AuthError::UserNotFound => {
                ApiErrorCode::InvalidCredentials
            }
            AuthError::UserExists => ApiErrorCode::UserExists,
            AuthError::SecretNotFound => ApiErrorCode::SecretNotFound,
            AuthError::NotAdmin => ApiErrorCode::NotAdmin,
            AuthError::Validation(_) => ApiErrorCode::InvalidRequest,
            AuthError::Session(e) => ApiErrorCode::from(e),
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
