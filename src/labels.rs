use async_trait::async_trait;

use crate::upload::NormalizedImageBuffer;

/// Most labels requested from, and kept out of, a single detection call.
pub const MAX_LABELS: usize = 10;
/// Minimum detection confidence on the service's 0-100 scale.
pub const MIN_CONFIDENCE: f32 = 75.0;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("vision service error: {0}")]
    Service(String),
    #[error("vision service request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub confidence: f32,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// Detected labels after the confidence floor and count cap are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn from_detections<I>(detections: I) -> Self
    where
        I: IntoIterator<Item = Label>,
    {
        let labels = detections
            .into_iter()
            .filter(|label| !label.name.trim().is_empty())
            .filter(|label| label.confidence >= MIN_CONFIDENCE)
            .take(MAX_LABELS)
            .collect();
        Self { labels }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    /// Concept names in detection order; confidences stay internal.
    pub fn names(&self) -> Vec<String> {
        self.labels.iter().map(|label| label.name.clone()).collect()
    }
}

#[async_trait]
pub trait LabelDetector: Send + Sync {
    async fn detect_labels(&self, image: &NormalizedImageBuffer) -> Result<LabelSet, LabelError>;
}
