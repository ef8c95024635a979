use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::capabilities::CapabilityError;

/// Result of the "is there a dog in this picture" check.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DogDetection {
    /// Combined probability of all dog classes.
    pub dog_confidence: f32,
    /// Top overall label, used to tell the user what we saw instead.
    pub label: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    async fn detect_dog(&self, image: &[u8]) -> Result<DogDetection, CapabilityError>;

    async fn predict_breed(&self, image: &[u8]) -> Result<Prediction, CapabilityError>;
}

/// Talks to an inference service exposing `POST /detect` and `POST /breed`,
/// both taking the raw image bytes.
pub struct HttpImageClassifier {
    client: Client,
    base_url: String,
}

impl HttpImageClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: DeserializeOwned>(
        &self,
        route: &str,
        image: &[u8],
    ) -> Result<T, CapabilityError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, route))
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Api(format!("Classifier Error {}: {}", status, text)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CapabilityError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ImageClassifier for HttpImageClassifier {
    async fn detect_dog(&self, image: &[u8]) -> Result<DogDetection, CapabilityError> {
        self.post("detect", image).await
    }

    async fn predict_breed(&self, image: &[u8]) -> Result<Prediction, CapabilityError> {
        self.post("breed", image).await
    }
}

/// Stand-in used when no classifier endpoint is configured.
pub struct UnconfiguredClassifier;

#[async_trait]
impl ImageClassifier for UnconfiguredClassifier {
    async fn detect_dog(&self, _image: &[u8]) -> Result<DogDetection, CapabilityError> {
        Err(CapabilityError::Unavailable("image classifier".to_string()))
    }

    async fn predict_breed(&self, _image: &[u8]) -> Result<Prediction, CapabilityError> {
        Err(CapabilityError::Unavailable("image classifier".to_string()))
    }
}
