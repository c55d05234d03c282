//! OmadaClient against a local mock controller
//!
//! Each test stands up a plain-HTTP axum server that plays the controller
//! role and points the client at it.

use axum::extract::Query;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;

use radgate::config::OmadaConfig;
use radgate::controller::{OmadaClient, WirelessController};
use radgate::error::PortalError;
use radgate::models::{AccessGrant, ControllerSession};

fn operator_config() -> OmadaConfig {
    OmadaConfig {
        operator_username: "operator".to_string(),
        operator_password: "hotspot-secret".to_string(),
        ..OmadaConfig::default()
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn grant() -> AccessGrant {
    AccessGrant {
        client_mac: "AA:BB:CC:DD:EE:FF".to_string(),
        ap_mac: "11:22:33:44:55:66".to_string(),
        ssid_name: "GuestWifi".to_string(),
        radio_id: 1,
        site: "Default".to_string(),
        duration_secs: 3600,
    }
}

fn session(session_id: Option<&str>) -> ControllerSession {
    ControllerSession {
        csrf_token: "tok123".to_string(),
        session_id: session_id.map(str::to_string),
        obtained_at: Instant::now(),
    }
}

async fn login_ok() -> Response {
    let mut response = Json(json!({
        "errorCode": 0,
        "msg": "Success.",
        "result": { "token": "tok123" },
    }))
    .into_response();
    let headers = response.headers_mut();
    headers.append(
        SET_COOKIE,
        HeaderValue::from_static("JSESSIONID=unrelated; Path=/"),
    );
    headers.append(
        SET_COOKIE,
        HeaderValue::from_static("TPOMADA_SESSIONID=sess456; Path=/; Secure; HttpOnly"),
    );
    response
}

#[tokio::test]
async fn login_extracts_token_and_session_cookie() {
    let base = serve(Router::new().route("/api/v2/hotspot/login", post(login_ok))).await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    let session = client.login().await.unwrap();
    assert_eq!(session.csrf_token, "tok123");
    assert_eq!(session.session_id.as_deref(), Some("sess456"));
}

#[tokio::test]
async fn login_without_session_cookie_still_succeeds() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/login",
        post(|| async {
            Json(json!({ "errorCode": 0, "result": { "token": "tok123" } }))
        }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    let session = client.login().await.unwrap();
    assert_eq!(session.csrf_token, "tok123");
    assert!(session.session_id.is_none());
}

#[tokio::test]
async fn login_nonzero_error_code_is_an_api_error() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/login",
        post(|| async {
            Json(json!({ "errorCode": -30109, "msg": "The operator does not exist." }))
        }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    match client.login().await {
        Err(PortalError::ControllerApi { code, message }) => {
            assert_eq!(code, -30109);
            assert_eq!(message, "The operator does not exist.");
        }
        other => panic!("expected ControllerApi, got {other:?}"),
    }
}

#[tokio::test]
async fn login_missing_token_is_an_api_error() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/login",
        post(|| async { Json(json!({ "errorCode": 0, "result": {} })) }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    assert!(matches!(
        client.login().await,
        Err(PortalError::ControllerApi { code: 0, .. })
    ));
}

#[tokio::test]
async fn login_html_body_is_a_protocol_error() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/login",
        post(|| async { "<html><body>Controller UI</body></html>" }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    match client.login().await {
        Err(PortalError::ControllerProtocol { raw, .. }) => {
            assert!(raw.contains("Controller UI"), "raw body kept for diagnostics");
        }
        other => panic!("expected ControllerProtocol, got {other:?}"),
    }
}

#[tokio::test]
async fn login_http_error_with_json_body_is_a_network_error() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/login",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "errorCode": -1, "msg": "internal" })),
            )
        }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    match client.login().await {
        Err(PortalError::ControllerNetwork { status, body, .. }) => {
            assert_eq!(status, Some(500));
            assert!(body.unwrap().contains("-1"));
        }
        other => panic!("expected ControllerNetwork, got {other:?}"),
    }
}

#[tokio::test]
async fn authorize_without_session_id_fails_before_any_http_call() {
    // Unroutable base URL: if the client attempted a request the error
    // would be ControllerNetwork, not the code-1 API error.
    let client =
        OmadaClient::with_base_url(operator_config(), "http://127.0.0.1:1").unwrap();

    match client.authorize(&grant(), &session(None)).await {
        Err(PortalError::ControllerApi { code: 1, message }) => {
            assert!(message.contains("TPOMADA_SESSIONID"));
        }
        other => panic!("expected ControllerApi code 1, got {other:?}"),
    }

    // An empty string counts as missing too.
    assert!(matches!(
        client.authorize(&grant(), &session(Some(""))).await,
        Err(PortalError::ControllerApi { code: 1, .. })
    ));
}

#[tokio::test]
async fn authorize_sends_token_cookie_and_payload() {
    // The mock validates everything the controller contract requires and
    // only then reports success.
    async fn auth_handler(
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        Json(payload): Json<Value>,
    ) -> Json<Value> {
        let cookie_ok = headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("TPOMADA_SESSIONID=sess456"))
            .unwrap_or(false);
        let csrf_ok = headers
            .get("Csrf-Token")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "tok123")
            .unwrap_or(false);
        let ok = query.get("token").map(String::as_str) == Some("tok123")
            && cookie_ok
            && csrf_ok
            && payload["clientMac"] == "AA:BB:CC:DD:EE:FF"
            && payload["apMac"] == "11:22:33:44:55:66"
            && payload["ssidName"] == "GuestWifi"
            && payload["radioId"] == 1
            && payload["site"] == "Default"
            && payload["authType"] == 4
            && payload["time"] == 3600;
        if ok {
            Json(json!({ "errorCode": 0, "msg": "Success." }))
        } else {
            Json(json!({ "errorCode": 1, "msg": "bad request shape" }))
        }
    }

    let base = serve(Router::new().route("/api/v2/hotspot/extPortal/auth", post(auth_handler)))
        .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    let result = client
        .authorize(&grant(), &session(Some("sess456")))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.error_code, 0);
}

#[tokio::test]
async fn authorize_nonzero_error_code_is_an_api_error() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/extPortal/auth",
        post(|| async {
            Json(json!({ "errorCode": -41501, "msg": "The AP does not exist." }))
        }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    match client.authorize(&grant(), &session(Some("sess456"))).await {
        Err(PortalError::ControllerApi { code, message }) => {
            assert_eq!(code, -41501);
            assert_eq!(message, "The AP does not exist.");
        }
        other => panic!("expected ControllerApi, got {other:?}"),
    }
}

#[tokio::test]
async fn authorize_http_error_is_a_network_error() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/extPortal/auth",
        post(|| async {
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "errorCode": -1, "msg": "proxy error" })),
            )
        }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    assert!(matches!(
        client.authorize(&grant(), &session(Some("sess456"))).await,
        Err(PortalError::ControllerNetwork { status: Some(502), .. })
    ));
}

#[tokio::test]
async fn authorize_non_json_body_is_a_protocol_error() {
    let base = serve(Router::new().route(
        "/api/v2/hotspot/extPortal/auth",
        post(|| async { "gateway timeout" }),
    ))
    .await;
    let client = OmadaClient::with_base_url(operator_config(), base).unwrap();

    match client.authorize(&grant(), &session(Some("sess456"))).await {
        Err(PortalError::ControllerProtocol { raw, .. }) => {
            assert_eq!(raw, "gateway timeout");
        }
        other => panic!("expected ControllerProtocol, got {other:?}"),
    }
}
