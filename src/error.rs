use std::fmt;

use crate::{caption::CaptionError, labels::LabelError, upload::NormalizeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Labeling,
    Captioning,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Labeling => f.write_str("label detection"),
            Stage::Captioning => f.write_str("caption generation"),
        }
    }
}

/// Failure of a single pipeline run, tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} failed: {message}")]
pub struct PipelineError {
    pub stage: Stage,
    pub message: String,
}

impl PipelineError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl From<NormalizeError> for PipelineError {
    fn from(err: NormalizeError) -> Self {
        Self::new(Stage::Labeling, err.to_string())
    }
}

impl From<LabelError> for PipelineError {
    fn from(err: LabelError) -> Self {
        Self::new(Stage::Labeling, err.to_string())
    }
}

impl From<CaptionError> for PipelineError {
    fn from(err: CaptionError) -> Self {
        Self::new(Stage::Captioning, err.to_string())
    }
}
