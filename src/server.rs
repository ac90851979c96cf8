use std::{sync::Arc, time::Instant};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, warn};

use crate::{
    caption::CAPTION_MODEL,
    credential::Credential,
    pipeline::{Outcome, Pipeline, WAITING_MESSAGE},
    upload::{ImageFormat, NormalizeError, UploadedImage},
};

const INDEX_TEMPLATE: &str = include_str!("index.html");

const CREDENTIAL_FIELD: &str = r#"<div class="key-field">
            <label for="apiKey">Enter your OpenAI API Key:</label>
            <input type="password" id="apiKey" name="api_key" autocomplete="off">
        </div>"#;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pipeline: Pipeline,
    api_key: Option<Credential>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, api_key: Option<Credential>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { pipeline, api_key }),
        }
    }

    pub fn has_preconfigured_key(&self) -> bool {
        self.inner.api_key.is_some()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResponse {
    Captioned {
        caption: String,
        labels: Vec<String>,
        model: String,
        processing_time_ms: u128,
    },
    Waiting {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Fields pulled out of the upload form. A file outside the accepted set is
/// kept as its rejection so the credential guard can run first.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<Result<UploadedImage, NormalizeError>>,
    api_key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum FormError {
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Format(#[from] NormalizeError),
}

impl FormError {
    fn status(&self) -> StatusCode {
        match self {
            FormError::Multipart(err) => err.status(),
            FormError::Format(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        let body = UploadResponse::Error {
            message: format!("Error generating alt text: {self}"),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_image))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

pub fn render_index(show_credential_field: bool) -> String {
    let accept = ImageFormat::ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    INDEX_TEMPLATE
        .replace("{{ACCEPT}}", &accept)
        .replace(
            "{{CREDENTIAL_FIELD}}",
            if show_credential_field {
                CREDENTIAL_FIELD
            } else {
                ""
            },
        )
        .replace("{{MODEL}}", CAPTION_MODEL)
        .replace("{{WAITING}}", WAITING_MESSAGE)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(!state.has_preconfigured_key()))
}

async fn health() -> &'static str {
    "ok"
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, FormError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_string);
                let mime = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                if data.is_empty() {
                    continue;
                }

                form.image = Some(
                    ImageFormat::detect(file_name.as_deref(), mime.as_deref()).map(|format| {
                        debug!(bytes = data.len(), %format, "received upload");
                        UploadedImage::new(data.to_vec(), format, file_name)
                    }),
                );
            }
            Some("api_key") => {
                form.api_key = Some(field.text().await?);
            }
            other => {
                debug!(field = ?other, "ignoring unexpected form field");
            }
        }
    }

    Ok(form)
}

async fn upload_image(State(state): State<AppState>, multipart: Multipart) -> Response {
    let start = Instant::now();

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(err) => {
            warn!(error = %err, "rejected upload");
            return err.into_response();
        }
    };

    let credential = Credential::resolve(state.inner.api_key.as_ref(), form.api_key.as_deref());

    // without a key the request is still waiting for input, whatever the file
    let image = match (form.image, &credential) {
        (Some(Ok(image)), _) => Some(image),
        (Some(Err(err)), Some(_)) => {
            warn!(error = %err, "rejected upload");
            return FormError::from(err).into_response();
        }
        _ => None,
    };

    let outcome = state.inner.pipeline.run(image, credential).await;
    let message = outcome.message();

    match outcome {
        Outcome::Captioned(alt) => Json(UploadResponse::Captioned {
            caption: alt.caption,
            labels: alt.labels,
            model: CAPTION_MODEL.to_string(),
            processing_time_ms: start.elapsed().as_millis(),
        })
        .into_response(),
        Outcome::Waiting => Json(UploadResponse::Waiting { message }).into_response(),
        Outcome::Failed(_) => {
            (StatusCode::BAD_GATEWAY, Json(UploadResponse::Error { message })).into_response()
        }
    }
}

pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_shows_key_field_only_without_configured_key() {
        let with_field = render_index(true);
        assert!(with_field.contains(r#"type="password""#));
        assert!(with_field.contains("Enter your OpenAI API Key:"));

        let without_field = render_index(false);
        assert!(!without_field.contains(r#"type="password""#));
        assert!(!without_field.contains("{{CREDENTIAL_FIELD}}"));
    }

    #[test]
    fn page_restricts_file_picker() {
        let page = render_index(false);
        assert!(page.contains(r#"accept=".jpg,.jpeg,.png,.webp""#));
        assert!(page.contains("Please upload an image and ensure an OpenAI API key is provided."));
    }

    #[test]
    fn responses_are_tagged_by_status() {
        let json = serde_json::to_value(UploadResponse::Waiting {
            message: "wait".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["message"], "wait");

        let json = serde_json::to_value(UploadResponse::Captioned {
            caption: "A dog.".into(),
            labels: vec!["Dog".into()],
            model: CAPTION_MODEL.into(),
            processing_time_ms: 12,
        })
        .unwrap();
        assert_eq!(json["status"], "captioned");
        assert_eq!(json["labels"][0], "Dog");
    }
}
