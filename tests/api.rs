//! HTTP tests driving the router directly

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::{create_test_pdf, page_rects, LETTER};
use pdf_margins::auth::UserStore;
use pdf_margins::config::ServerConfig;
use pdf_margins::server::{router, AppState};
use pdf_margins::PageRect;

const BOUNDARY: &str = "pdf-margins-test-boundary";

async fn app() -> Router {
    let users = UserStore::connect("sqlite::memory:", None).await.unwrap();
    users.create_user("alice", "secret").await.unwrap();
    router(Arc::new(AppState::new(users)), &ServerConfig::default())
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    Request::post("/upload/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_home() {
    let response = app()
        .await
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("/upload/"));
}

#[tokio::test]
async fn test_upload_selected_page() {
    let pdf = create_test_pdf(3);
    let request = upload_request(
        &[("mode", "selected"), ("selected_pages", "2"), ("margins", "5,5,5,5")],
        Some(("notes.pdf", &pdf)),
    );

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=modified_notes.pdf"
    );

    let rects = page_rects(&body_bytes(response).await);
    assert_eq!(rects, vec![LETTER, PageRect::new(-5.0, -5.0, 617.0, 797.0), LETTER]);
}

#[tokio::test]
async fn test_upload_default_margins() {
    let pdf = create_test_pdf(2);
    let request = upload_request(&[("mode", "all")], Some(("a.pdf", &pdf)));

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rects = page_rects(&body_bytes(response).await);
    assert_eq!(rects, vec![PageRect::new(-20.0, -20.0, 632.0, 812.0); 2]);
}

#[tokio::test]
async fn test_upload_odd_even() {
    let pdf = create_test_pdf(3);
    let request = upload_request(
        &[
            ("mode", "odd_even"),
            ("margins_odd", "10,0,0,0"),
            ("margins_even", "0,0,10,0"),
        ],
        Some(("a.pdf", &pdf)),
    );

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let odd = PageRect::new(-10.0, 0.0, 612.0, 792.0);
    let even = PageRect::new(0.0, 0.0, 622.0, 792.0);
    let rects = page_rects(&body_bytes(response).await);
    assert_eq!(rects, vec![odd, even, odd]);
}

#[tokio::test]
async fn test_upload_overlapping_groups() {
    let pdf = create_test_pdf(4);
    let request = upload_request(
        &[("mode", "groups"), ("group_margins", "1-3:10,10,10,10;2-2:5,5,5,5")],
        Some(("a.pdf", &pdf)),
    );

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rects = page_rects(&body_bytes(response).await);
    assert_eq!(
        rects,
        vec![
            PageRect::new(-10.0, -10.0, 622.0, 802.0),
            PageRect::new(-15.0, -15.0, 627.0, 807.0),
            PageRect::new(-10.0, -10.0, 622.0, 802.0),
            LETTER,
        ]
    );
}

#[tokio::test]
async fn test_upload_selected_without_pages_changes_nothing() {
    let pdf = create_test_pdf(2);
    let request = upload_request(
        &[("mode", "selected"), ("selected_pages", ""), ("margins", "5,5,5,5")],
        Some(("a.pdf", &pdf)),
    );

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(page_rects(&body_bytes(response).await), page_rects(&pdf));
}

#[tokio::test]
async fn test_upload_selected_ignores_non_page_numbers() {
    let pdf = create_test_pdf(2);
    let request = upload_request(
        &[("mode", "selected"), ("selected_pages", "-1,2"), ("margins", "5,5,5,5")],
        Some(("a.pdf", &pdf)),
    );

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rects = page_rects(&body_bytes(response).await);
    assert_eq!(rects, vec![LETTER, PageRect::new(-5.0, -5.0, 617.0, 797.0)]);
}

#[tokio::test]
async fn test_upload_malformed_group_is_bad_request() {
    let pdf = create_test_pdf(3);
    let request = upload_request(
        &[("mode", "groups"), ("group_margins", "1-3 10,10,10,10")],
        Some(("a.pdf", &pdf)),
    );

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_ne!(response.headers()[header::CONTENT_TYPE], "application/pdf");

    let json = body_json(response).await;
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("Invalid group"));
}

#[tokio::test]
async fn test_upload_unknown_mode() {
    let pdf = create_test_pdf(1);
    let request = upload_request(&[("mode", "sideways")], Some(("a.pdf", &pdf)));

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_missing_file() {
    let request = upload_request(&[("mode", "all")], None);

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_corrupt_pdf() {
    let request = upload_request(&[("mode", "all")], Some(("a.pdf", b"%PDF-1.7 garbage")));

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_flow() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(form_request("/login", "username=alice&password=secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");
    let token = json["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(form_request("/login", "username=alice&password=secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(form_request("/logout", &format!("token={token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(form_request("/logout", &format!("token={token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(form_request("/login", "username=alice&password=secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_bad_credentials() {
    let app = app().await;

    let wrong_password = app
        .clone()
        .oneshot(form_request("/login", "username=alice&password=guess"))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(form_request("/login", "username=mallory&password=secret"))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn test_login_accepts_multipart_form() {
    let request = Request::post("/login")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            &[("username", "alice"), ("password", "secret")],
            None,
        )))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_missing_field() {
    let response = app()
        .await
        .oneshot(form_request("/login", "username=alice"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
