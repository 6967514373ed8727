use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::infra_memory::SecretCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserAuthBody {
    pub login_id: String,
    pub password: String,
    pub scope: UserScope,
}

impl From<UserAuthBody> for LoginInput {
    fn from(body: UserAuthBody) -> Self {
        LoginInput {
            login_id: body.login_id,
            password: body.password,
            scope: body.scope,
        }
    }
}

/// Shared body of every account route; each route reads the parts it needs.
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub user_auth: UserAuthBody,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub third_party_secrets: Vec<ThirdPartySecret>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
}

pub async fn signup(
    body: UserRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let UserRequest {
        user_auth, profile, ..
    } = body;
    let signup_input = SignupInput {
        login_id: user_auth.login_id,
        password: user_auth.password,
        scope: user_auth.scope,
        profile,
    };
    let user_id = account_service
        .signup(signup_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(SignupResponse { user_id })))
}

pub async fn login(
    body: UserRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = account_service
        .login(body.user_auth.into())
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

pub async fn authenticate_jwt(
    body: UserRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let key_name = body
        .third_party_secrets
        .first()
        .map(|secret| secret.key_name.clone())
        .unwrap_or_default();
    let input = JwtAuthInput {
        credentials: body.user_auth.into(),
        key_name,
    };
    let pair = account_service
        .authenticate_jwt(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(pair)))
}

pub async fn register_secret(
    operation: SecretOperation,
    body: UserRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = RegisterSecretInput {
        credentials: body.user_auth.into(),
        secrets: body.third_party_secrets,
    };
    account_service
        .register_secret(input, operation)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok("secret stored")))
}

pub async fn test_jwt(claims: Authorized) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(claims.claims)))
}

pub async fn refresh_jwt(
    bearer: RefreshBearer,
    session_service: Arc<dyn SessionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = session_service
        .refresh_session(&bearer.user_id, &bearer.token)
        .map_err(ApiErrorCode::refresh)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(pair)))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    sessions: usize,
}

pub async fn health(cache: Arc<SecretCache>) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(Health {
        status: "ok",
        sessions: cache.len(),
    })))
}

/// A bearer token that passed `SessionService::authorize`.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub token: String,
    pub claims: TokenClaims,
}

/// A bearer presented for refresh, not yet verified.
#[derive(Debug, Clone)]
pub struct RefreshBearer {
    pub user_id: UserId,
    pub token: String,
}
