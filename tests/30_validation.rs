mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use assetdesk_api::store::Role;
use assetdesk_api::types::RecordId;
use assetdesk_api::validation::exists::ModelToken;
use common::{json_request, TestApp};

#[tokio::test]
async fn malformed_reference_never_hits_the_store() {
    let app = TestApp::new();
    let manager = app.seed_user(Role::Manager);
    let token = app.access_token(&manager);

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/assets",
            Some(&token),
            Some(json!({
                "name": "Rack server",
                "serial_number": "SN-7",
                "department_id": "not-a-24-hex-identifier"
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("department_id must be a valid record id"));
    // Fast fail on the id pattern: the existence checker was never consulted.
    assert_eq!(app.existence.lookup_count(), 0);
    assert_eq!(app.assets.count(), 0);
}

#[tokio::test]
async fn missing_department_names_collection_and_field() {
    let app = TestApp::new();
    let manager = app.seed_user(Role::Manager);
    let token = app.access_token(&manager);
    let unseeded = RecordId::generate();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/assets",
            Some(&token),
            Some(json!({
                "name": "Rack server",
                "serial_number": "SN-7",
                "department_id": unseeded.to_string()
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("department_id"));
    assert!(message.contains("departments"));
    assert_eq!(app.existence.lookup_count(), 1);
    assert_eq!(app.assets.count(), 0);
}

#[tokio::test]
async fn unknown_body_fields_are_stripped() {
    let app = TestApp::new();
    let manager = app.seed_user(Role::Manager);
    let token = app.access_token(&manager);
    let dept = RecordId::generate();
    app.existence.seed(ModelToken::Department, dept.clone());

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/assets",
            Some(&token),
            Some(json!({
                "name": "Rack server",
                "serial_number": "SN-7",
                "department_id": dept.to_string(),
                "is_admin_owned": true
            })),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"].get("is_admin_owned").is_none());
}

#[tokio::test]
async fn update_checks_the_new_department_reference() {
    let app = TestApp::new();
    let manager = app.seed_user(Role::Manager);
    let token = app.access_token(&manager);
    let dept = RecordId::generate();
    app.existence.seed(ModelToken::Department, dept.clone());

    let (_, body) = app
        .send(json_request(
            Method::POST,
            "/api/assets",
            Some(&token),
            Some(json!({
                "name": "Rack server",
                "serial_number": "SN-7",
                "department_id": dept.to_string()
            })),
        ))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Moving to a department that does not exist fails the async pass.
    let (status, _) = app
        .send(json_request(
            Method::PUT,
            &format!("/api/assets/{}", id),
            Some(&token),
            Some(json!({ "department_id": RecordId::generate().to_string() })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A plain rename passes with no reference collected.
    let lookups_before = app.existence.lookup_count();
    let (status, body) = app
        .send(json_request(
            Method::PUT,
            &format!("/api/assets/{}", id),
            Some(&token),
            Some(json!({ "name": "Rack server (row 2)" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Rack server (row 2)");
    assert_eq!(app.existence.lookup_count(), lookups_before);
}

#[tokio::test]
async fn invalid_path_id_is_a_validation_error() {
    let app = TestApp::new();
    let viewer = app.seed_user(Role::Viewer);
    let token = app.access_token(&viewer);

    let (status, body) = app
        .send(json_request(
            Method::GET,
            "/api/assets/banana",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("record id"));
}

#[tokio::test]
async fn unknown_asset_id_is_not_found() {
    let app = TestApp::new();
    let viewer = app.seed_user(Role::Viewer);
    let token = app.access_token(&viewer);

    let (status, body) = app
        .send(json_request(
            Method::GET,
            &format!("/api/assets/{}", RecordId::generate()),
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn list_query_bounds_are_enforced() {
    let app = TestApp::new();
    let viewer = app.seed_user(Role::Viewer);
    let token = app.access_token(&viewer);

    let (status, body) = app
        .send(json_request(
            Method::GET,
            "/api/assets?limit=9999",
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("limit must be between 1 and 500"));
}
