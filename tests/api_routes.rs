mod common;

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use common::{lifecycle, png_bytes, FakeClassifier};
use serde_json::{json, Value};

const BOUNDARY: &str = "----dogcare-test-boundary";

fn multipart_body(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

macro_rules! app {
    ($dir:expr, $classifier:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(lifecycle($dir, Arc::new($classifier))))
                .configure(dogcare::api::routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_full_session_flow() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir.path(), FakeClassifier::dog());

    // Start
    let req = test::TestRequest::post().uri("/session/start").to_request();
    let started: Value = test::call_and_read_body_json(&app, req).await;
    let id = started["session_id"].as_str().unwrap().to_string();

    // Resume
    let req = test::TestRequest::post()
        .uri(&format!("/session/start?existing_session_id={}", id))
        .to_request();
    let resumed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resumed["session_id"], json!(id));

    // Chat
    let req = test::TestRequest::post()
        .uri(&format!("/session/{}/chat", id))
        .set_json(json!({"question": "How often should I feed my puppy?"}))
        .to_request();
    let answer: Value = test::call_and_read_body_json(&app, req).await;
    assert!(!answer["answer"].as_str().unwrap().is_empty());
    assert_eq!(answer["matched_question"], json!("How often should I feed my puppy?"));
    assert!(answer["score"].as_f64().unwrap() > 0.99);

    // History
    let req = test::TestRequest::get()
        .uri(&format!("/session/{}/history", id))
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    let turns = history.as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], json!("user"));
    assert_eq!(turns[1]["role"], json!("bot"));

    // Upload
    let req = test::TestRequest::post()
        .uri(&format!("/session/{}/upload/analyze", id))
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("rex.png", &png_bytes()))
        .to_request();
    let analysis: Value = test::call_and_read_body_json(&app, req).await;
    for key in [
        "image_id",
        "breed",
        "breed_confidence",
        "brightness",
        "clarity",
        "color_balance",
        "summary",
        "nutrition_tips",
    ] {
        assert!(analysis.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(analysis["breed"], json!("golden retriever"));

    // End
    let req = test::TestRequest::post()
        .uri(&format!("/session/{}/end", id))
        .to_request();
    let ended: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ended["chat_summary"].as_array().unwrap().len(), 2);
    assert_eq!(ended["image_analyses"].as_array().unwrap().len(), 1);
    assert_eq!(ended["image_analyses"][0]["filename"], json!("rex.png"));
    assert_eq!(ended["report_url"], json!(format!("/reports/{}.pdf", id)));
    assert!(ended["created_at"].is_string());
    assert!(ended["message"].is_string());

    // End again
    let req = test::TestRequest::post()
        .uri(&format!("/session/{}/end", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], json!("Invalid or already ended session"));

    // Report
    let req = test::TestRequest::get()
        .uri(&format!("/session/{}/report", id))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        report,
        json!({
            "session_id": id,
            "report_url": format!("/reports/{}.pdf", id),
            "chat_count": 2,
            "image_count": 1
        })
    );
}

#[actix_web::test]
async fn test_unknown_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir.path(), FakeClassifier::dog());

    let req = test::TestRequest::get().uri("/session/ghost/history").to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history, json!([]));

    let req = test::TestRequest::get().uri("/session/ghost/report").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post().uri("/session/ghost/end").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_upload_errors_are_client_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir.path(), FakeClassifier::cat());

    let req = test::TestRequest::post()
        .uri("/session/cat-owner/upload/analyze")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("kitty.png", &png_bytes()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("'cat'"));
    assert!(detail.contains("0.82"));

    let req = test::TestRequest::post()
        .uri("/session/cat-owner/upload/analyze")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("notes.txt", b"plain text"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], json!("Invalid image file"));
}

#[actix_web::test]
async fn test_service_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir.path(), FakeClassifier::dog());

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("healthy"));

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], json!("ok"));
}

#[actix_web::test]
async fn test_oversized_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Arc::new(FakeClassifier::dog());
    let lc = lifecycle(dir.path(), classifier.clone()).with_max_upload_bytes(16);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(lc))
            .configure(dogcare::api::routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/session/big-upload/upload/analyze")
        .insert_header((
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body("rex.png", &png_bytes()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], json!("File too large (limit 16 bytes)"));
    assert_eq!(classifier.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(!dir.path().join("uploads").join("rex.png").exists());
}
