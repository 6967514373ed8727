use serde_json::{Value, json};
use std::sync::Arc;
use tokenmint::api;
use tokenmint::application_impl::{REFRESH_TOKEN_TTL, TokenCodec};
use tokenmint::domain_model::{SigningSecret, TokenClaims};
use tokenmint::server::Server;
use tokenmint::settings::*;
use warp::Filter;
use warp::http::StatusCode;

fn settings(max_refresh_count: u32) -> Settings {
    Settings {
        http: Http {
            address: "127.0.0.1:0".into(),
            cert_path: None,
            key_path: None,
        },
        log: Log {
            filter: "info".into(),
        },
        jwt: Jwt {
            domain: "acme".into(),
            app_id: "app".into(),
            max_refresh_count,
            token_ttl_secs: 900,
            refresh_ttl_secs: 86400,
            cache_flush_interval_secs: 86400,
        },
        store: Store {
            backend: "memory".into(),
            mysql_dsn: None,
        },
        cipher: Cipher {
            backend: "real".into(),
            master_key: Some("integration-master-key".into()),
        },
    }
}

fn user_auth(login_id: &str, role: &str) -> Value {
    json!({
        "login_id": login_id,
        "password": "pass1234",
        "scope": {
            "user_domain": "acme",
            "user_app_id": "app",
            "user_role": { "role_name": role }
        }
    })
}

fn api_v1(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(server))
        .recover(api::v1::recover_error)
}

struct Api {
    server: Arc<Server>,
}

impl Api {
    async fn new(max_refresh_count: u32) -> Self {
        let server = Server::try_new(&settings(max_refresh_count)).await.unwrap();
        Api {
            server: Arc::new(server),
        }
    }


    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = warp::test::request()
            .method("POST")
            .path(path)
            .json(&body)
            .reply(&api_v1(self.server.clone()))
            .await;
        (res.status(), serde_json::from_slice(res.body()).unwrap())
    }

    async fn get(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        let mut req = warp::test::request().method("GET").path(path);
        if let Some(token) = bearer {
            req = req.header("authorization", format!("Bearer {token}"));
        }
        let res = req.reply(&api_v1(self.server.clone())).await;
        (res.status(), serde_json::from_slice(res.body()).unwrap())
    }

    /// Signs up an admin, registers `main` and returns `(access, refresh)`.
    async fn admin_session(&self) -> (String, String) {
        let (status, _) = self
            .post(
                "/api/v1/signin",
                json!({ "user_auth": user_auth("ada", "admin_user"), "profile": { "first_name": "Ada" } }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = self
            .post(
                "/api/v1/registerJwt",
                json!({
                    "user_auth": user_auth("ada", "admin_user"),
                    "third_party_secrets": [{ "key_name": "main", "key_value": "s3cr3t" }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .post(
                "/api/v1/jwtauth",
                json!({
                    "user_auth": user_auth("ada", "admin_user"),
                    "third_party_secrets": [{ "key_name": "main" }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let access = body["data"]["token"]["access_token"].as_str().unwrap().to_owned();
        let refresh = body["data"]["refresh_token"]["access_token"]
            .as_str()
            .unwrap()
            .to_owned();
        assert_eq!(body["data"]["token"]["expiry_time"], 900);
        (access, refresh)
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let api = Api::new(3).await;
    let (status, body) = api.get("/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["sessions"], 0);
    api.server.shutdown().await;
}

#[tokio::test]
async fn bearer_routes_follow_the_session() {
    let api = Api::new(1).await;
    let (access, refresh) = api.admin_session().await;

    let (status, body) = api.get("/api/v1/admin/testJwt", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["iss"], "acme_app");
    assert_eq!(body["data"]["aud"], "acme_app");

    let (status, body) = api.get("/api/v1/admin/refreshJwtauth", Some(&refresh)).await;
    assert_eq!(status, StatusCode::OK);
    let renewed = body["data"]["token"]["access_token"].as_str().unwrap().to_owned();
    let (status, _) = api.get("/api/v1/admin/testJwt", Some(&renewed)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = api.get("/api/v1/admin/refreshJwtauth", Some(&refresh)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = api.get("/api/v1/admin/refreshJwtauth", Some(&refresh)).await;
    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "RefreshDenied");

    // the session is gone now
    let (status, body) = api.get("/api/v1/admin/testJwt", Some(&access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "SessionNotFound");

    api.server.shutdown().await;
}

#[tokio::test]
async fn missing_or_garbage_bearer_is_unauthorized() {
    let api = Api::new(3).await;

    let (status, _) = api.get("/api/v1/admin/testJwt", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = api.get("/api/v1/admin/testJwt", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "InvalidToken");

    api.server.shutdown().await;
}

#[tokio::test]
async fn account_errors_are_bad_requests() {
    let api = Api::new(3).await;
    let signup = json!({ "user_auth": user_auth("bob", "viewer") });

    let (status, _) = api.post("/api/v1/signin", signup.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = api.post("/api/v1/signin", signup).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UserExists");

    let (status, body) = api
        .post(
            "/api/v1/registerJwt",
            json!({
                "user_auth": user_auth("bob", "viewer"),
                "third_party_secrets": [{ "key_name": "main", "key_value": "s3cr3t" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NotAdmin");

    let mut wrong = user_auth("bob", "viewer");
    wrong["password"] = json!("nope1234");
    let (status, body) = api.post("/api/v1/login", json!({ "user_auth": wrong })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidCredentials");

    let (status, body) = api.post("/api/v1/login", json!({ "nope": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidRequest");

    api.server.shutdown().await;
}

#[tokio::test]
async fn update_rotates_the_stored_secret() {
    let api = Api::new(3).await;
    let (access, _) = api.admin_session().await;

    let (status, _) = api
        .post(
            "/api/v1/admin/updateJwtRegister",
            json!({
                "user_auth": user_auth("ada", "admin_user"),
                "third_party_secrets": [{ "key_name": "missing", "key_value": "x" }]
            }),
        )
        .await;
    // no bearer header on a guarded route
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/admin/updateJwtRegister")
        .header("authorization", format!("Bearer {access}"))
        .json(&json!({
            "user_auth": user_auth("ada", "admin_user"),
            "third_party_secrets": [{ "key_name": "main", "key_value": "n3w" }]
        }))
        .reply(&api_v1(api.server.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    api.server.shutdown().await;
}

#[tokio::test]
async fn forged_refresh_past_the_ceiling_evicts_the_session() {
    let api = Api::new(0).await;
    let (_, refresh) = api.admin_session().await;

    let (status, _) = api.get("/api/v1/admin/refreshJwtauth", Some(&refresh)).await;
    assert_eq!(status, StatusCode::OK);

    let codec = TokenCodec::new();
    let subject = codec.parse_unverified(&refresh).unwrap().sub;
    let claims = TokenClaims::refresh(
        subject,
        "acme_app",
        chrono::Utc::now().timestamp(),
        REFRESH_TOKEN_TTL,
    );
    let forged = codec
        .sign_refresh_token(&claims, &SigningSecret::from("guess"))
        .unwrap();

    let (status, body) = api.get("/api/v1/admin/refreshJwtauth", Some(&forged)).await;
    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    assert_eq!(body["error"]["code"], "RefreshDenied");
    assert!(api.server.cache.is_empty());

    api.server.shutdown().await;
}

#[tokio::test]
async fn garbage_refresh_bearer_is_denied() {
    let api = Api::new(3).await;
    let (status, body) = api
        .get("/api/v1/admin/refreshJwtauth", Some("not.a.jwt"))
        .await;
    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    assert_eq!(body["error"]["code"], "RefreshDenied");
    api.server.shutdown().await;
}

#[tokio::test]
async fn zero_durations_are_rejected_at_startup() {
    let mut zero_flush = settings(3);
    zero_flush.jwt.cache_flush_interval_secs = 0;
    assert!(Server::try_new(&zero_flush).await.is_err());

    let mut zero_ttl = settings(3);
    zero_ttl.jwt.token_ttl_secs = 0;
    assert!(Server::try_new(&zero_ttl).await.is_err());
}
