//! Amazon Rekognition `DetectLabels` client.

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, BehaviorVersion};
use aws_sdk_rekognition::{
    config::{Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    operation::detect_labels::DetectLabelsError,
    primitives::Blob,
    types::Image,
    Client,
};
use tracing::debug;

use crate::{
    config::AwsSettings,
    labels::{Label, LabelDetector, LabelError, LabelSet, MAX_LABELS, MIN_CONFIDENCE},
    upload::NormalizedImageBuffer,
};

#[derive(Clone)]
pub struct RekognitionDetector {
    client: Client,
}

impl RekognitionDetector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the SDK client from the configured key pair and region, falling
    /// back to the default provider chain for whatever is missing. SDK retries
    /// are switched off so each run makes exactly one request.
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());

        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(url) = &settings.endpoint_url {
            loader = loader.endpoint_url(url.clone());
        }
        if let Some(key) = &settings.access_key {
            loader = loader.credentials_provider(Credentials::new(
                key.access_key_id.clone(),
                key.secret_access_key.clone(),
                None,
                None,
                "alt-text-generator",
            ));
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl LabelDetector for RekognitionDetector {
    async fn detect_labels(&self, image: &NormalizedImageBuffer) -> Result<LabelSet, LabelError> {
        debug!(
            bytes = image.as_bytes().len(),
            "sending image to rekognition"
        );

        let output = self
            .client
            .detect_labels()
            .image(
                Image::builder()
                    .bytes(Blob::new(image.as_bytes().to_vec()))
                    .build(),
            )
            .max_labels(MAX_LABELS as i32)
            .min_confidence(MIN_CONFIDENCE)
            .send()
            .await
            .map_err(classify_error)?;

        let set = labels_from_response(output.labels());
        debug!(count = set.len(), "rekognition returned labels");
        Ok(set)
    }
}

pub(crate) fn labels_from_response(labels: &[aws_sdk_rekognition::types::Label]) -> LabelSet {
    LabelSet::from_detections(labels.iter().filter_map(|label| {
        let name = label.name()?;
        Some(Label::new(name, label.confidence().unwrap_or_default()))
    }))
}

fn classify_error(err: SdkError<DetectLabelsError>) -> LabelError {
    match err.as_service_error() {
        Some(service) => LabelError::Service(DisplayErrorContext(service).to_string()),
        None => LabelError::Transport(DisplayErrorContext(&err).to_string()),
    }
}
