use autoapi::ServiceConfig;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    let mut config = ServiceConfig::from_toml_str(include_str!("../config.toml")).unwrap();
    config.swagger.enabled = false;
    user_service::build_rest_router(&config).unwrap().0
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn create(body: &str) -> Request<Body> {
    Request::post("/api/v1/user")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn create_then_fetch() {
    let app = app();
    let (status, body) = call(&app, create(r#"{"name":"alice","email":"alice@example.com"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "member");
    let id = body["data"]["id"].as_u64().unwrap();

    let req = Request::get(format!("/api/v1/user/{id}")).body(Body::empty()).unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "alice@example.com");

    let req = Request::get("/api/v1/user/999").body(Body::empty()).unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4005);
}

#[tokio::test]
async fn invalid_email_is_rejected_in_chinese_by_default() {
    let app = app();
    let req = Request::post("/api/v1/user")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"bob","email":"nope"}"#))
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "参数验证失败");
    assert_eq!(body["data"].as_object().unwrap().len(), 1);
    assert!(body["data"].get("email").is_some());
}

#[tokio::test]
async fn delete_requires_the_token_header() {
    let app = app();
    let req = Request::delete("/api/v1/user/1").body(Body::empty()).unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"].get("token").is_some());

    let req = Request::delete("/api/v1/user/1")
        .header("X-Token", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);
}

#[tokio::test]
async fn test_endpoint_reports_language() {
    let app = app();
    let req = Request::get("/api/v1/test")
        .header(header::ACCEPT_LANGUAGE, "en-GB,en;q=0.9")
        .body(Body::empty())
        .unwrap();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["data"]["lang"], "en");
    assert_eq!(body["data"]["status"], "0 users");
}

#[test]
fn document_lists_every_endpoint() {
    let dir = std::env::temp_dir().join("user-service-doc-test");
    let mut config = ServiceConfig::from_toml_str(include_str!("../config.toml")).unwrap();
    config.swagger.json_path = dir.join("swagger.json");
    let (_, doc) = user_service::build_rest_router(&config).unwrap();
    let doc = serde_json::to_value(doc.unwrap()).unwrap();
    let paths = doc["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 5);
    assert!(paths["/api/v1/user/{id}"]["delete"]["security"].is_array());
    assert_eq!(
        paths["/api/v1/user/{id}/avatar"]["post"]["requestBody"]["content"]
            .as_object()
            .unwrap()
            .keys()
            .collect::<Vec<_>>(),
        vec!["multipart/form-data"]
    );
    assert!(doc["components"]["securitySchemes"]["token"].is_object());
}

fn avatar_upload(id: u64, file_part: &str) -> Request<Body> {
    let boundary = "user-service-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"avatar\"{file_part}\r\n\r\n\
         PNGDATA\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
         me\r\n\
         --{boundary}--\r\n"
    );
    Request::post(format!("/api/v1/user/{id}/avatar"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn avatar_upload_binds_file_and_caption() {
    let app = app();
    let (_, body) = call(&app, create(r#"{"name":"carol","email":"carol@example.com"}"#)).await;
    let id = body["data"]["id"].as_u64().unwrap();

    let (status, body) = call(&app, avatar_upload(id, "; filename=\"me.png\"")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], id);
    assert_eq!(body["data"]["fileName"], "me.png");
    assert_eq!(body["data"]["size"], 7);
    assert_eq!(body["data"]["caption"], "me");

    let (status, body) = call(&app, avatar_upload(id, "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["avatar"], "avatar is a required field");
}
