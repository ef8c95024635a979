mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{lifecycle, png_bytes, FakeClassifier};
use dogcare::api::lifecycle::END_MESSAGE;
use dogcare::api::models::ChatRequest;
use dogcare::api::ApiError;
use dogcare::session::ChatTurn;
use serde_json::json;

fn ask(question: &str) -> ChatRequest {
    ChatRequest {
        question: question.to_string(),
        location: None,
    }
}

#[tokio::test]
async fn test_start_resumes_only_live_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));

    let first = lc.start(None).unwrap().session_id;
    assert_eq!(lc.start(Some(&first)).unwrap().session_id, first);

    let fresh = lc.start(Some("not-live")).unwrap().session_id;
    assert_ne!(fresh, "not-live");
    assert_ne!(fresh, first);
}

#[tokio::test]
async fn test_chat_appends_user_then_bot() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));
    let id = lc.start(None).unwrap().session_id;

    let answer = lc.chat(&id, ask("How often should I feed my puppy?")).await.unwrap();
    assert!(!answer.answer.is_empty());
    assert_eq!(answer.matched_question, "How often should I feed my puppy?");
    assert!(answer.score > 0.99);
    // "feed" triggers the nutrient block
    assert!(answer.answer.contains("Nutrient analysis (puppy dog):"));

    let history = lc.history(&id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], ChatTurn::new("user", "How often should I feed my puppy?"));
    assert_eq!(history[1], ChatTurn::new("bot", answer.answer.as_str()));
}

#[tokio::test]
async fn test_chat_auto_creates_unknown_session() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));

    let answer = lc
        .chat(
            "phone-session-1",
            ChatRequest {
                question: "Is there an emergency vet nearby?".to_string(),
                location: Some(json!({"latitude": 52.52, "longitude": 13.405})),
            },
        )
        .await
        .unwrap();

    assert!(lc.store().exists("phone-session-1"));
    assert!(answer.answer.contains("Advice for your area (52.5200, 13.4050):"));
    assert_eq!(answer.matched_question, "");
    assert_eq!(lc.history("phone-session-1").unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_rejects_path_like_ids() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));
    let err = lc.chat("../escape", ask("hi")).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
}

#[tokio::test]
async fn test_history_two_tier_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));
    let id = lc.start(None).unwrap().session_id;
    lc.chat(&id, ask("Can dogs eat chocolate?")).await.unwrap();
    lc.end(&id).unwrap();

    // Ended: served from the snapshot.
    assert_eq!(lc.history(&id).unwrap().len(), 2);
    // Never existed: empty.
    assert!(lc.history("never-existed").unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_non_dog() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::cat()));
    let id = lc.start(None).unwrap().session_id;

    let err = lc.upload_and_analyze(&id, "kitty.png", png_bytes()).await.unwrap_err();
    match err {
        ApiError::BadRequest(msg) => {
            assert!(msg.contains("cat"), "{}", msg);
            assert!(msg.contains("0.82"), "{}", msg);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(lc.store().get_history(&id).unwrap().image_history.is_empty());
    assert!(!dir.path().join("uploads").join("kitty.png").exists());
}

#[tokio::test]
async fn test_upload_rejects_undecodable_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Arc::new(FakeClassifier::dog());
    let lc = lifecycle(dir.path(), classifier.clone());
    let id = lc.start(None).unwrap().session_id;

    let err = lc
        .upload_and_analyze(&id, "notes.txt", b"definitely not an image".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Invalid image file"));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upload_analyzes_and_records_image() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));

    let analysis = lc
        .upload_and_analyze("new-upload-session", "../rex.png", png_bytes())
        .await
        .unwrap();

    assert!(!analysis.image_id.is_empty());
    assert_eq!(analysis.breed, "golden retriever");
    assert_eq!(analysis.breed_confidence, 0.871);
    for metric in [analysis.brightness, analysis.clarity, analysis.color_balance] {
        assert!((0.0..=1.0).contains(&metric));
        assert_eq!((metric * 1000.0).round() / 1000.0, metric);
    }
    assert!(analysis.nutrition_tips.contains("Large breeds"));

    assert!(dir.path().join("uploads").join("rex.png").exists());
    let session = lc.store().get_history("new-upload-session").unwrap();
    assert_eq!(session.image_history.len(), 1);
    assert_eq!(session.image_history[0].filename, "rex.png");
    assert_eq!(session.image_history[0].analysis.breed_confidence, 0.871);
}

#[tokio::test]
async fn test_end_session_renders_report() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));
    let id = lc.start(None).unwrap().session_id;

    lc.chat(&id, ask("Can dogs eat chocolate?")).await.unwrap();
    lc.upload_and_analyze(&id, "rex.png", png_bytes()).await.unwrap();

    let ended = lc.end(&id).unwrap();
    assert_eq!(ended.session_id, id);
    assert_eq!(ended.chat_summary.len(), 2);
    assert_eq!(ended.image_analyses.len(), 1);
    assert_eq!(ended.report_url, format!("/reports/{}.pdf", id));
    assert_eq!(ended.message, END_MESSAGE);
    assert!(lc.renderer().report_path(&id).exists());
    assert!(!lc.store().exists(&id));

    // The report stays fetchable after the session ended.
    let report = lc.report(&id).unwrap();
    assert_eq!(report.report_url, ended.report_url);
    assert_eq!(report.chat_count, 2);
    assert_eq!(report.image_count, 1);

    assert!(matches!(lc.end(&id), Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_report_is_rendered_once() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));
    let id = lc.start(None).unwrap().session_id;
    lc.chat(&id, ask("Can dogs eat chocolate?")).await.unwrap();

    let first = lc.report(&id).unwrap();
    let path = lc.renderer().report_path(&id);
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));

    // Mark the file; a second call must not touch it even though the
    // session has grown in between.
    std::fs::write(&path, b"cached").unwrap();
    lc.chat(&id, ask("How often should I feed my puppy?")).await.unwrap();

    let second = lc.report(&id).unwrap();
    assert_eq!(second.report_url, first.report_url);
    assert_eq!(second.chat_count, 4);
    assert_eq!(std::fs::read(&path).unwrap(), b"cached");
}

#[tokio::test]
async fn test_report_for_unknown_session_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let lc = lifecycle(dir.path(), Arc::new(FakeClassifier::dog()));
    assert!(matches!(lc.report("ghost"), Err(ApiError::NotFound(_))));
    assert!(matches!(lc.report("../../etc"), Err(ApiError::NotFound(_))));
    assert!(matches!(lc.end("ghost"), Err(ApiError::NotFound(_))));
}
