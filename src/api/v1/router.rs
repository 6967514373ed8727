use super::error::*;
use super::handler::{self, Authorized, RefreshBearer};
use crate::application_port::{SecretOperation, SessionService};
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let signin = warp::post()
        .and(warp::path("signin"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::signup);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::login);

    let jwtauth = warp::post()
        .and(warp::path("jwtauth"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::authenticate_jwt);

    let register_jwt = warp::post()
        .and(warp::path("registerJwt"))
        .and(warp::path::end())
        .map(|| SecretOperation::Create)
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::register_secret);

    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(with(server.cache.clone()))
        .and_then(handler::health);

    let test_jwt = warp::get()
        .and(warp::path!("admin" / "testJwt"))
        .and(with_verification(server.session_service.clone()))
        .and_then(handler::test_jwt);

    let refresh_jwt = warp::get()
        .and(warp::path!("admin" / "refreshJwtauth"))
        .and(with_refresh_subject(server.session_service.clone()))
        .and(with(server.session_service.clone()))
        .and_then(handler::refresh_jwt);

    let update_jwt_register = warp::post()
        .and(warp::path!("admin" / "updateJwtRegister"))
        .and(with_verification(server.session_service.clone()))
        .map(|_: Authorized| SecretOperation::Update)
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::register_secret);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec![http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_methods(vec![http::Method::GET, http::Method::POST, http::Method::OPTIONS]);

    signin
        .or(login)
        .or(jwtauth)
        .or(register_jwt)
        .or(health)
        .or(test_jwt)
        .or(refresh_jwt)
        .or(update_jwt_register)
        .with(cors)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (Authorized,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |header: String| {
        let session_service = session_service.clone();
        async move {
            if let Some(token) = header.strip_prefix("Bearer ") {
                let claims = session_service
                    .authorize(token)
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                Ok(Authorized {
                    token: token.to_owned(),
                    claims,
                })
            } else {
                Err(reject::custom(ApiErrorCode::InvalidToken))
            }
        }
    })
}

/// Bearer guard for refresh. Only reads the subject; the rotation itself
/// checks the ceiling first and then the token.
fn with_refresh_subject(
    session_service: Arc<dyn SessionService>,
) -> impl Filter<Extract = (RefreshBearer,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |header: String| {
        let session_service = session_service.clone();
        async move {
            let Some(token) = header.strip_prefix("Bearer ") else {
                return Err(reject::custom(ApiErrorCode::InvalidToken));
            };
            let user_id = session_service
                .claimed_subject(token)
                .map_err(ApiErrorCode::refresh)
                .map_err(reject::custom)?;
            Ok(RefreshBearer {
                user_id,
                token: token.to_owned(),
            })
        }
    })
}
