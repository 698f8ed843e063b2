use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use db::{
    DBService,
    models::user::{NewUser, RegisterType, User},
};
use deployment::Deployment;
use serde_json::{Value, json};
use server::{DeploymentImpl, routes};
use services::services::{config::Config, password::hash_password};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

async fn setup() -> (Router, DeploymentImpl) {
    let config = Config::from_lookup(|name| (name == "TOKENIZE").then(|| SECRET.to_string()))
        .unwrap();
    let db = DBService::new_in_memory().await.unwrap();
    let deployment = DeploymentImpl::from_parts(config, db);
    (routes::router(deployment.clone()), deployment)
}

async fn add_user(deployment: &DeploymentImpl, user_id: &str, register_type: RegisterType) {
    User::create(
        &deployment.db().pool,
        &NewUser {
            user_id: user_id.to_string(),
            employee_id: None,
            register_type,
            role_id: None,
            password_hash: hash_password("password123").unwrap(),
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_raw(app, method, uri, token, body.map(|body| body.to_string())).await
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn login(app: &Router, user_id: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "user_id": user_id, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_needs_no_session() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["ok"], true);
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_invalid_session() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, "GET", "/api/farmer-profiles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid Session");

    let (status, _) = send(&app, "GET", "/api/farmer-profiles", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_then_reuse_token() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    let (status, body) = send(&app, "GET", "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], "admin");
    assert_eq!(body["data"]["register_type"], "super_admin");

    let (status, _) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User already logged out");
}

#[tokio::test]
async fn test_tokenized_create_then_plain_list_and_count() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    for (number, district) in [("FR-1", "Baucau"), ("FR-2", "Baucau"), ("FR-3", "Ermera")] {
        let envelope = deployment
            .tokenizer()
            .sign(&json!({
                "registration_number": number,
                "name": "Maria Soares",
                "district": district,
            }))
            .unwrap();
        let (status, body) = send(
            &app,
            "POST",
            "/api/farmer-profiles/tokenized/create",
            Some(&token),
            Some(json!({ "tokenized": envelope })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, body) = send(
        &app,
        "GET",
        "/api/farmer-profiles?district=Baucau&limit=1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        "GET",
        "/api/farmer-profiles/count?district=Baucau",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["data"]["count"], 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/farmer-profiles",
        Some(&token),
        Some(json!({ "registration_number": "FR-1", "name": "Other", "district": "Dili" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Farmer with registration number FR-1 already exists"
    );
}

#[tokio::test]
async fn test_tampered_or_foreign_envelope_rejected() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    let foreign = utils::tokenize::encode(&json!({ "ids": [] }), b"secret-B").unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/farmer-profiles/tokenized/delete",
        Some(&token),
        Some(json!({ "tokenized": foreign })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid signature");

    let (status, _) = send(
        &app,
        "POST",
        "/api/farmer-profiles/tokenized/delete",
        Some(&token),
        Some(json!({ "tokenized": "not-an-envelope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_viewer_without_role_is_forbidden() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "viewer", RegisterType::Viewer).await;
    let token = login(&app, "viewer").await;

    let (status, body) = send(&app, "GET", "/api/crop-productions", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Forbidden: missing privilege crop_production:read"
    );
}

#[tokio::test]
async fn test_livestock_import_and_export() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    let empty = deployment
        .tokenizer()
        .sign(&json!({ "details": [] }))
        .unwrap();
    let (status, _) = send(
        &app,
        "POST",
        "/api/livestock-retail-prices/tokenized/import",
        Some(&token),
        Some(json!({ "tokenized": empty })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let details = deployment
        .tokenizer()
        .sign(&json!({
            "details": [
                { "livestock": "Cattle", "unit": "kg", "price": 4.5, "district": "Dili", "price_date": "2024-07-01" },
                { "livestock": "Goat", "unit": "head", "price": 85.0, "district": "Dili", "price_date": "2024-07-02" }
            ]
        }))
        .unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/livestock-retail-prices/tokenized/import",
        Some(&token),
        Some(json!({ "tokenized": details })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["imported"], 2);

    let (status, body) = send(
        &app,
        "GET",
        "/api/livestock-retail-prices/export?district=Dili",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["data"]["filename"]
            .as_str()
            .unwrap()
            .ends_with(".xlsx")
    );
    assert!(!body["data"]["content_base64"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_filter_fields_match_everything() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/farmer-profiles",
        Some(&token),
        Some(json!({ "registration_number": "FR-9", "name": "Ana Belo", "district": "Aileu" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = send(
        &app,
        "GET",
        "/api/farmer-profiles/count?search=&district=",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["count"], 1);

    let (status, body) = send(
        &app,
        "GET",
        "/api/farmer-profiles?search=&district=&limit=&offset=",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "GET",
        "/api/crop-productions/count?farmer_profile_id=&year=&month=",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_malformed_input_gets_api_response_body() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/crop-productions/count?year=abc",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to deserialize query string")
    );

    let (status, body) = send_raw(
        &app,
        "POST",
        "/api/farmer-profiles",
        Some(&token),
        Some("{not json".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to parse the request body as JSON")
    );

    let (status, body) = send(
        &app,
        "PUT",
        "/api/farmer-profiles/not-a-uuid",
        Some(&token),
        Some(json!({ "name": "Maria" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_user_roles_round_trip() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    let (status, body) = send(&app, "GET", "/api/user-roles/privileges", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p == "farmer_profile:read")
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/user-roles",
        Some(&token),
        Some(json!({ "name": "Enumerators", "privileges": ["farmer_profile:read"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let update = deployment
        .tokenizer()
        .sign(&json!({
            "id": id,
            "privileges": ["farmer_profile:read", "farmer_profile:write"],
        }))
        .unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/user-roles/tokenized/update",
        Some(&token),
        Some(json!({ "tokenized": update })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["privileges"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/user-roles/{id}"),
        Some(&token),
        Some(json!({ "privileges": ["farmer_profile:erase"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown privilege farmer_profile:erase");

    let (status, body) = send(&app, "GET", "/api/user-roles", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Enumerators");
}

#[tokio::test]
async fn test_activity_logs_record_logins() {
    let (app, deployment) = setup().await;
    add_user(&deployment, "admin", RegisterType::SuperAdmin).await;
    let token = login(&app, "admin").await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/activity-logs/count?search=Logged%20in",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["count"], 1);

    let filter = deployment
        .tokenizer()
        .sign(&json!({ "search": "Logged in", "limit": 10 }))
        .unwrap();
    let (status, body) = send(
        &app,
        "POST",
        "/api/activity-logs/tokenized/all",
        Some(&token),
        Some(json!({ "tokenized": filter })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"][0]["activity"], "Logged in");
}
