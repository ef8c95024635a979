#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dogcare::api::SessionLifecycle;
use dogcare::capabilities::{
    CapabilityError, ChatResponder, DogDetection, FaqMatcher, ImageClassifier, Prediction,
};
use dogcare::report::ReportRenderer;
use dogcare::session::SessionStore;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Answers every detection with a fixed result and counts calls.
pub struct FakeClassifier {
    pub detection: DogDetection,
    pub breed: Prediction,
    pub calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn dog() -> Self {
        Self {
            detection: DogDetection {
                dog_confidence: 0.93,
                label: "golden retriever".into(),
                confidence: 0.87,
            },
            breed: Prediction {
                label: "golden retriever".into(),
                confidence: 0.871_234,
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn cat() -> Self {
        Self {
            detection: DogDetection {
                dog_confidence: 0.04,
                label: "cat".into(),
                confidence: 0.82,
            },
            ..Self::dog()
        }
    }
}

#[async_trait]
impl ImageClassifier for FakeClassifier {
    async fn detect_dog(&self, _image: &[u8]) -> Result<DogDetection, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detection.clone())
    }

    async fn predict_breed(&self, _image: &[u8]) -> Result<Prediction, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.breed.clone())
    }
}

pub fn faq() -> FaqMatcher {
    FaqMatcher::new(vec![
        (
            "How often should I feed my puppy?".into(),
            "Puppies do best with three to four small meals a day.".into(),
        ),
        (
            "Can dogs eat chocolate?".into(),
            "No. Chocolate is toxic to dogs; call your vet if yours ate some.".into(),
        ),
    ])
}

pub fn lifecycle(root: &Path, classifier: Arc<dyn ImageClassifier>) -> SessionLifecycle {
    let store = SessionStore::new(root.join("sessions")).unwrap();
    let renderer = ReportRenderer::new(root.join("reports")).unwrap();
    let responder = ChatResponder::new(Arc::new(faq()), 0.6);
    SessionLifecycle::new(Arc::new(store), renderer, responder, classifier, root.join("uploads"))
        .unwrap()
}

pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_fn(48, 48, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([200, 170, 120])
        } else {
            Rgb([90, 60, 30])
        }
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}
