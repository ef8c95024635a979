//! Session lifecycle: the request-level operations, independent of HTTP.
//!
//! Store calls are short critical sections. Capability calls (FAQ, LLM,
//! classifier) always happen between them, never while the store is locked.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::models::{
    ChatAnswer, ChatRequest, EndSessionResponse, ImageAnalysisResponse, ReportResponse,
    StartSessionResponse,
};
use crate::capabilities::enrichment::{describe_location, nutrition_tips_for_breed};
use crate::capabilities::{
    ChatResponder, Enricher, ImageClassifier, LocationAdvisor, NutrientAdvisor, QualityAnalyzer,
};
use crate::report::{report_file_name, ReportData, ReportRenderer};
use crate::session::{is_valid_session_id, AnalysisResult, ChatTurn, SessionSnapshot, SessionStore};

pub const DEFAULT_DOG_THRESHOLD: f32 = 0.30;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const END_MESSAGE: &str = "Session ended. Report generated for this session only.";

pub struct SessionLifecycle {
    store: Arc<SessionStore>,
    renderer: ReportRenderer,
    responder: ChatResponder,
    classifier: Arc<dyn ImageClassifier>,
    quality: QualityAnalyzer,
    enrichers: Vec<Box<dyn Enricher>>,
    uploads_dir: PathBuf,
    dog_threshold: f32,
    max_upload_bytes: usize,
}

impl SessionLifecycle {
    pub fn new(
        store: Arc<SessionStore>,
        renderer: ReportRenderer,
        responder: ChatResponder,
        classifier: Arc<dyn ImageClassifier>,
        uploads_dir: impl AsRef<Path>,
    ) -> std::io::Result<Self> {
        let uploads_dir = uploads_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&uploads_dir)?;

        Ok(Self {
            store,
            renderer,
            responder,
            classifier,
            quality: QualityAnalyzer,
            enrichers: vec![Box::new(NutrientAdvisor), Box::new(LocationAdvisor)],
            uploads_dir,
            dog_threshold: DEFAULT_DOG_THRESHOLD,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        })
    }

    pub fn with_dog_threshold(mut self, threshold: f32) -> Self {
        self.dog_threshold = threshold;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn with_enrichers(mut self, enrichers: Vec<Box<dyn Enricher>>) -> Self {
        self.enrichers = enrichers;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Resumes `existing` if it is live, otherwise opens a new session.
    pub fn start(&self, existing: Option<&str>) -> Result<StartSessionResponse, ApiError> {
        if let Some(id) = existing.filter(|id| self.store.exists(id)) {
            info!("Resuming session {}", id);
            return Ok(StartSessionResponse {
                session_id: id.to_string(),
            });
        }
        let session_id = self.store.create_session()?;
        Ok(StartSessionResponse { session_id })
    }

    /// Live history first, then the snapshot; unknown ids yield an empty list.
    pub fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>, ApiError> {
        if !is_valid_session_id(session_id) {
            return Ok(Vec::new());
        }
        if let Some(session) = self.store.get_history(session_id) {
            return Ok(session.chat_history);
        }
        Ok(self
            .store
            .read_snapshot(session_id)?
            .map(|snapshot| snapshot.chat_history)
            .unwrap_or_default())
    }

    pub async fn chat(&self, session_id: &str, request: ChatRequest) -> Result<ChatAnswer, ApiError> {
        self.ensure_live(session_id)?;

        let history = self
            .store
            .get_history(session_id)
            .map(|s| s.chat_history)
            .unwrap_or_default();
        let location = request.location.as_ref().and_then(describe_location);

        let answer = self
            .responder
            .answer(&request.question, &history, location.as_deref())
            .await;

        let mut text = answer.answer;
        for enricher in &self.enrichers {
            if let Some(block) = enricher.enrich(&request.question, location.as_deref()) {
                info!("Added {} block to answer in session {}", enricher.name(), session_id);
                text.push_str("\n\n");
                text.push_str(&block);
            }
        }

        self.store.add_exchange(session_id, &request.question, &text)?;

        Ok(ChatAnswer {
            answer: text,
            matched_question: answer.matched_question,
            score: answer.score,
        })
    }

    pub async fn upload_and_analyze(
        &self,
        session_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageAnalysisResponse, ApiError> {
        self.ensure_live(session_id)?;

        let image = image::load_from_memory(&bytes)
            .map_err(|_| ApiError::BadRequest("Invalid image file".to_string()))?;

        let detection = self.classifier.detect_dog(&bytes).await?;
        if detection.dog_confidence < self.dog_threshold {
            info!(
                "Rejected upload for session {}: '{}' ({:.2})",
                session_id, detection.label, detection.confidence
            );
            return Err(ApiError::BadRequest(format!(
                "This looks like '{}' ({:.2}). Please upload a clear dog photo.",
                detection.label, detection.confidence
            )));
        }

        let image_id = Uuid::new_v4().to_string();
        let stored_name = sanitize_filename(filename).unwrap_or_else(|| format!("{}.img", image_id));
        let destination = self.uploads_dir.join(&stored_name);
        tokio::fs::write(&destination, &bytes).await?;

        let breed = self.classifier.predict_breed(&bytes).await?;
        let quality = self.quality.analyze(&image);

        let analysis = AnalysisResult {
            nutrition_tips: nutrition_tips_for_breed(&breed.label),
            breed: breed.label,
            breed_confidence: round3(f64::from(breed.confidence)),
            brightness: round3(quality.brightness),
            clarity: round3(quality.clarity),
            color_balance: round3(quality.color_balance),
            summary: quality.summary,
        };

        self.store
            .add_image_analysis(session_id, &stored_name, analysis.clone())?;
        info!(
            "Analyzed {} for session {}: {} ({})",
            stored_name, session_id, analysis.breed, analysis.breed_confidence
        );

        Ok(ImageAnalysisResponse {
            image_id,
            breed: analysis.breed,
            breed_confidence: analysis.breed_confidence,
            brightness: analysis.brightness,
            clarity: analysis.clarity,
            color_balance: analysis.color_balance,
            summary: analysis.summary,
            nutrition_tips: analysis.nutrition_tips,
        })
    }

    pub fn end(&self, session_id: &str) -> Result<EndSessionResponse, ApiError> {
        let not_found = || ApiError::NotFound("Invalid or already ended session".to_string());
        if !is_valid_session_id(session_id) {
            return Err(not_found());
        }
        let session = self.store.end_session(session_id)?.ok_or_else(not_found)?;

        self.renderer.render(
            session_id,
            &ReportData {
                chat_history: &session.chat_history,
                image_history: &session.image_history,
            },
        )?;

        Ok(EndSessionResponse {
            session_id: session_id.to_string(),
            created_at: session.created_at,
            chat_summary: session.chat_history,
            image_analyses: session.image_history,
            report_url: report_url(session_id),
            message: END_MESSAGE.to_string(),
        })
    }

    /// Renders the report only if none exists yet for this id. A report
    /// rendered earlier is returned as is, even if the session has grown
    /// since.
    pub fn report(&self, session_id: &str) -> Result<ReportResponse, ApiError> {
        let not_found = || ApiError::NotFound("Session not found".to_string());
        if !is_valid_session_id(session_id) {
            return Err(not_found());
        }

        let data: SessionSnapshot = match self.store.get_history(session_id) {
            Some(session) => session.into(),
            None => self.store.read_snapshot(session_id)?.ok_or_else(not_found)?,
        };

        if !self.renderer.report_path(session_id).exists() {
            self.renderer.render(
                session_id,
                &ReportData {
                    chat_history: &data.chat_history,
                    image_history: &data.image_history,
                },
            )?;
        }

        Ok(ReportResponse {
            session_id: session_id.to_string(),
            report_url: report_url(session_id),
            chat_count: data.chat_history.len(),
            image_count: data.image_history.len(),
        })
    }

    /// Chat and upload silently open sessions they have not seen before.
    fn ensure_live(&self, session_id: &str) -> Result<(), ApiError> {
        if !is_valid_session_id(session_id) {
            return Err(ApiError::BadRequest("Invalid session id".to_string()));
        }
        if !self.store.exists(session_id) {
            warn!("Session {} is not live, creating it", session_id);
            self.store.create_session_with_id(session_id)?;
        }
        Ok(())
    }
}

/// Public path of a session's report. This server only writes the file into
/// `storage.reports_dir`; serving `/reports/` is left to a static file
/// server or reverse proxy in front of it.
pub fn report_url(session_id: &str) -> String {
    format!("/reports/{}", report_file_name(session_id))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Keeps only the final path component of a client supplied file name.
fn sanitize_filename(filename: &str) -> Option<String> {
    let name = Path::new(filename.trim()).file_name()?.to_str()?;
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(round3(0.912_345), 0.912);
        assert_eq!(round3(0.4567), 0.457);
        assert_eq!(round3(1.0), 1.0);
    }

    #[test]
    fn filenames_lose_their_directories() {
        assert_eq!(sanitize_filename("rex.jpg"), Some("rex.jpg".to_string()));
        assert_eq!(sanitize_filename("../../etc/passwd"), Some("passwd".to_string()));
        assert_eq!(sanitize_filename(".hidden"), None);
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
    }
}
