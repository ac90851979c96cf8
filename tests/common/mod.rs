// Shared fakes and request helpers for router tests
#![allow(dead_code)]

use std::{
    io::Cursor,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use alt_text_generator::{
    caption::{CaptionError, CaptionGenerator, CaptionRequest},
    credential::Credential,
    labels::{Label, LabelDetector, LabelError, LabelSet},
    pipeline::Pipeline,
    server::{self, AppState},
    upload::NormalizedImageBuffer,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request},
    Router,
};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

pub const BOUNDARY: &str = "alt-text-test-boundary";
pub const TEST_UPLOAD_LIMIT: usize = 1024 * 1024;

pub struct FakeDetector {
    labels: Result<Vec<(String, f32)>, String>,
    calls: AtomicUsize,
    alpha_seen: Mutex<Vec<bool>>,
}

impl FakeDetector {
    pub fn returning(labels: &[(&str, f32)]) -> Arc<Self> {
        Arc::new(Self {
            labels: Ok(labels.iter().map(|(n, c)| (n.to_string(), *c)).collect()),
            calls: AtomicUsize::new(0),
            alpha_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            labels: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            alpha_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn alpha_seen(&self) -> Vec<bool> {
        self.alpha_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LabelDetector for FakeDetector {
    async fn detect_labels(&self, buffer: &NormalizedImageBuffer) -> Result<LabelSet, LabelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let decoded = image::load_from_memory(buffer.as_bytes()).unwrap();
        self.alpha_seen
            .lock()
            .unwrap()
            .push(decoded.color().has_alpha());

        match &self.labels {
            Ok(labels) => Ok(LabelSet::from_detections(
                labels.iter().map(|(name, conf)| Label::new(name.clone(), *conf)),
            )),
            Err(message) => Err(LabelError::Service(message.clone())),
        }
    }
}

pub struct FakeCaptioner {
    reply: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    credentials: Mutex<Vec<String>>,
}

impl FakeCaptioner {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptionGenerator for FakeCaptioner {
    async fn complete(
        &self,
        request: &CaptionRequest,
        credential: &Credential,
    ) -> Result<String, CaptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap()
            .push(request.prompt().unwrap_or_default().to_string());
        self.credentials
            .lock()
            .unwrap()
            .push(credential.expose().to_string());

        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(message) => Err(CaptionError::Api {
                status: 500,
                message: message.clone(),
            }),
        }
    }
}

pub fn app(
    detector: &Arc<FakeDetector>,
    captioner: &Arc<FakeCaptioner>,
    configured_key: Option<&str>,
) -> Router {
    let pipeline = Pipeline::new(detector.clone(), captioner.clone());
    let state = AppState::new(pipeline, configured_key.and_then(Credential::new));
    server::router(state, TEST_UPLOAD_LIMIT)
}

/// Semi-transparent PNG, so normalization has an alpha channel to drop.
pub fn rgba_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(12, 12, Rgba([90, 140, 200, 160]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

pub enum Part<'a> {
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
