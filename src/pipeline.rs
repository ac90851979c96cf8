use std::sync::Arc;

use tokio::task;
use tracing::{error, info, warn};

use crate::{
    caption::{describe_labels, CaptionGenerator},
    credential::Credential,
    error::PipelineError,
    labels::LabelDetector,
    upload::{NormalizeError, NormalizedImageBuffer, UploadedImage},
};

pub const WAITING_MESSAGE: &str =
    "Please upload an image and ensure an OpenAI API key is provided.";

#[derive(Debug, Clone, PartialEq)]
pub struct AltText {
    pub labels: Vec<String>,
    pub caption: String,
}

/// Result of one pipeline run. Nothing fails past this point.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Waiting,
    Captioned(AltText),
    Failed(PipelineError),
}

impl Outcome {
    /// Text shown to the user for this outcome.
    pub fn message(&self) -> String {
        match self {
            Outcome::Waiting => WAITING_MESSAGE.to_string(),
            Outcome::Captioned(alt) => alt.caption.clone(),
            Outcome::Failed(err) => format!("Error generating alt text: {err}"),
        }
    }
}

/// Labeling followed by captioning, with both clients injected.
#[derive(Clone)]
pub struct Pipeline {
    detector: Arc<dyn LabelDetector>,
    captioner: Arc<dyn CaptionGenerator>,
}

impl Pipeline {
    pub fn new(detector: Arc<dyn LabelDetector>, captioner: Arc<dyn CaptionGenerator>) -> Self {
        Self {
            detector,
            captioner,
        }
    }

    pub async fn run(&self, image: Option<UploadedImage>, credential: Option<Credential>) -> Outcome {
        let (Some(image), Some(credential)) = (image, credential) else {
            warn!("missing image or api key, skipping pipeline");
            return Outcome::Waiting;
        };

        match self.generate(image, &credential).await {
            Ok(alt) => {
                info!(labels = alt.labels.len(), "generated alt text");
                Outcome::Captioned(alt)
            }
            Err(err) => {
                error!(stage = %err.stage, error = %err.message, "pipeline failed");
                Outcome::Failed(err)
            }
        }
    }

    async fn generate(
        &self,
        image: UploadedImage,
        credential: &Credential,
    ) -> Result<AltText, PipelineError> {
        let normalized = task::spawn_blocking(move || NormalizedImageBuffer::from_upload(&image))
            .await
            .map_err(NormalizeError::from)??;

        let labels = self.detector.detect_labels(&normalized).await?.names();
        let caption = describe_labels(self.captioner.as_ref(), &labels, credential).await?;

        Ok(AltText { labels, caption })
    }
}
