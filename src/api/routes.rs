use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Result as WebResult};
use futures_util::StreamExt as _;

use crate::api::error::ApiError;
use crate::api::lifecycle::SessionLifecycle;
use crate::api::models::{ChatRequest, StartSessionQuery};

// --- Sessions ---

#[post("/start")]
pub async fn start_session(
    lifecycle: web::Data<SessionLifecycle>,
    query: web::Query<StartSessionQuery>,
) -> Result<HttpResponse, ApiError> {
    let started = lifecycle.start(query.existing_session_id.as_deref())?;
    Ok(HttpResponse::Ok().json(started))
}

#[get("/{id}/history")]
pub async fn get_history(
    lifecycle: web::Data<SessionLifecycle>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let history = lifecycle.history(&id)?;
    Ok(HttpResponse::Ok().json(history))
}

#[post("/{id}/end")]
pub async fn end_session(
    lifecycle: web::Data<SessionLifecycle>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let ended = lifecycle.end(&id)?;
    Ok(HttpResponse::Ok().json(ended))
}

#[get("/{id}/report")]
pub async fn get_report(
    lifecycle: web::Data<SessionLifecycle>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let report = lifecycle.report(&id)?;
    Ok(HttpResponse::Ok().json(report))
}

// --- Chat ---

#[post("/{id}/chat")]
pub async fn chat(
    lifecycle: web::Data<SessionLifecycle>,
    id: web::Path<String>,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let answer = lifecycle.chat(&id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(answer))
}

// --- Images ---

#[post("/{id}/upload/analyze")]
pub async fn upload_and_analyze(
    lifecycle: web::Data<SessionLifecycle>,
    id: web::Path<String>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?;
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        let limit = lifecycle.max_upload_bytes();
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?;
            if bytes.len() + chunk.len() > limit {
                return Err(ApiError::BadRequest(format!(
                    "File too large (limit {} bytes)",
                    limit
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        upload = Some((filename, bytes));
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("Missing 'file' field".to_string()));
    };

    let analysis = lifecycle.upload_and_analyze(&id, &filename, bytes).await?;
    Ok(HttpResponse::Ok().json(analysis))
}

// --- Service ---

pub async fn root() -> WebResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "Dog Health AI API running"
    })))
}

pub async fn health() -> WebResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({"status": "healthy"})))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health))
        .service(
            web::scope("/session")
                .service(start_session)
                .service(get_history)
                .service(chat)
                .service(upload_and_analyze)
                .service(end_session)
                .service(get_report),
        );
}
