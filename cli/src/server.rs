//! HTTP API for the font library (made by fontlib)
//!
//! Routes live under `/font-library/v1` and answer with one of three JSON
//! envelopes: success and failed (both 200) or error (500). Library calls
//! block on disk and network, so each runs on tokio's blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fontlib_core::fetch::Fetcher;
use fontlib_core::library::{
    FileSource, FontLibrary, FontRequest, Outcome, UpdateFontRequest, UploadRequest,
};
use fontlib_core::model::{FontRecord, Provenance, VariantRequest};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::task;

pub const API_PREFIX: &str = "/font-library/v1";

/// Shared state handed to every handler.
pub struct AppState<F> {
    pub library: FontLibrary<F>,
    /// Bearer token required on API routes; `None` leaves them open.
    pub token: Option<String>,
}

impl<F> AppState<F> {
    pub fn new(library: FontLibrary<F>, token: Option<String>) -> Self {
        Self { library, token }
    }
}

/// Response envelope shared by all API routes.
#[derive(Debug)]
pub enum Envelope {
    Success { response: Value, data: Value },
    Failed { response: Value },
    Error { code: String, response: String },
    Forbidden,
}

impl Envelope {
    fn success(response: impl Into<Value>) -> Self {
        Envelope::Success {
            response: response.into(),
            data: Value::Null,
        }
    }

    fn error(code: impl Into<String>, response: impl Into<String>) -> Self {
        Envelope::Error {
            code: code.into(),
            response: response.into(),
        }
    }
}

impl From<fontlib_core::Error> for Envelope {
    fn from(err: fontlib_core::Error) -> Self {
        warn!("request failed: {err}");
        Envelope::error(err.code(), err.to_string())
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        match self {
            Envelope::Success { response, data } => (
                StatusCode::OK,
                Json(json!({"success": true, "response": response, "data": data})),
            )
                .into_response(),
            Envelope::Failed { response } => (
                StatusCode::OK,
                Json(json!({"success": false, "response": response})),
            )
                .into_response(),
            Envelope::Error { code, response } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": true,
                    "success": false,
                    "error_code": code,
                    "response": response,
                })),
            )
                .into_response(),
            Envelope::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": true,
                    "success": false,
                    "error_code": "rest_forbidden",
                    "response": "Sorry, you are not allowed to do that.",
                })),
            )
                .into_response(),
        }
    }
}

/// Bind `bind` and serve the API until the process exits.
pub async fn serve<F: Fetcher + 'static>(bind: &str, state: AppState<F>) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding HTTP server to {bind}"))?;
    info!("serving font library on http://{bind}{API_PREFIX}");

    axum::serve(listener, router(Arc::new(state)))
        .await
        .context("serving HTTP")?;
    Ok(())
}

pub fn router<F: Fetcher + 'static>(state: Arc<AppState<F>>) -> Router {
    let api = Router::new()
        .route("/get-fonts", get(get_fonts::<F>))
        .route("/download-google-font", post(download_google_font::<F>))
        .route("/optimize-google-fonts", post(optimize_google_fonts::<F>))
        .route("/upload-fonts", post(upload_fonts::<F>))
        .route("/update-font-post", post(update_font_post::<F>))
        .route("/delete-font", post(delete_font::<F>))
        .route("/get-settings", get(get_settings::<F>))
        .route("/set-settings", post(set_settings::<F>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_token::<F>,
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest(API_PREFIX, api)
        .with_state(state)
}

async fn require_token<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    request: Request,
    next: Next,
) -> Response {
    if !authorized(state.token.as_deref(), request.headers()) {
        return Envelope::Forbidden.into_response();
    }
    next.run(request).await
}

fn authorized(token: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = token else {
        return true;
    };

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|given| given.trim() == expected)
}

/// Run `work` against the library on the blocking pool.
async fn blocking<F, T>(
    state: Arc<AppState<F>>,
    work: impl FnOnce(&FontLibrary<F>) -> fontlib_core::Result<T> + Send + 'static,
) -> Result<T, Envelope>
where
    F: Fetcher + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(move || work(&state.library))
        .await
        .map_err(|e| Envelope::error("internal_error", format!("task join error: {e}")))?
        .map_err(Envelope::from)
}

fn to_value(value: impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GetFontsParams {
    name: Option<String>,
}

/// A listed font with the derived fields clients render from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FontView<'a> {
    #[serde(flatten)]
    font: &'a FontRecord,
    font_family: String,
    disabled: bool,
}

impl<'a> From<&'a FontRecord> for FontView<'a> {
    fn from(font: &'a FontRecord) -> Self {
        Self {
            font,
            font_family: font.font_family_stack(),
            disabled: font.is_disabled(),
        }
    }
}

async fn get_fonts<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Query(params): Query<GetFontsParams>,
) -> Envelope {
    match blocking(state, move |lib| lib.get_fonts(params.name.as_deref())).await {
        Ok(fonts) => {
            let views: Vec<FontView> = fonts.iter().map(FontView::from).collect();
            Envelope::success(to_value(views))
        }
        Err(envelope) => envelope,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleFontBody {
    font: FontRequest,
    variants: Vec<VariantRequest>,
}

async fn optimize_google_fonts<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Json(body): Json<GoogleFontBody>,
) -> Envelope {
    let outcome = blocking(state, move |lib| {
        lib.optimize_google_fonts(&body.font, body.variants)
    })
    .await;

    match outcome {
        Ok(Outcome::Done(variants)) => Envelope::success(to_value(variants)),
        Ok(Outcome::Failed(message)) => Envelope::Failed {
            response: message.into(),
        },
        Err(envelope) => envelope,
    }
}

async fn download_google_font<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Json(body): Json<GoogleFontBody>,
) -> Envelope {
    let outcome = blocking(state, move |lib| {
        lib.download_google_font(&body.font, body.variants)
    })
    .await;

    match outcome {
        Ok(Outcome::Done(result)) => Envelope::success(to_value(result)),
        Ok(Outcome::Failed(message)) => Envelope::Failed {
            response: message.into(),
        },
        Err(envelope) => envelope,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UploadBody {
    font: FontRequest,
    slug: Option<String>,
    source: Provenance,
    variants: Vec<VariantRequest>,
}

impl UploadBody {
    fn into_request(self, files: HashMap<String, FileSource>) -> UploadRequest {
        let slug = self
            .slug
            .or_else(|| Some(self.font.slug.clone()).filter(|s| !s.is_empty()));
        UploadRequest {
            font: self.font,
            slug,
            source: self.source,
            variants: self.variants,
            files,
        }
    }
}

async fn upload_fonts<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    request: Request,
) -> Envelope {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let upload = if is_multipart {
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => read_multipart_upload(multipart).await,
            Err(rejection) => Err(rejection.body_text()),
        }
    } else {
        match Json::<UploadBody>::from_request(request, &()).await {
            Ok(Json(body)) => Ok(body.into_request(HashMap::new())),
            Err(rejection) => Err(rejection.body_text()),
        }
    };

    let upload = match upload {
        Ok(upload) => upload,
        Err(message) => return Envelope::Failed {
            response: message.into(),
        },
    };

    match blocking(state, move |lib| lib.upload_fonts(upload)).await {
        Ok(result) => Envelope::success(to_value(result)),
        Err(envelope) => envelope,
    }
}

/// Form fields `font`, `variants` (both JSON), `source` and `slug`; every
/// part carrying a file name is a font file keyed by its field name.
async fn read_multipart_upload(mut multipart: Multipart) -> Result<UploadRequest, String> {
    let mut body = UploadBody {
        source: Provenance::Custom,
        ..UploadBody::default()
    };
    let mut files = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let bytes = field.bytes().await.map_err(|e| e.body_text())?;
            files.insert(
                name,
                FileSource::Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                },
            );
            continue;
        }

        let text = field.text().await.map_err(|e| e.body_text())?;
        match name.as_str() {
            "font" => {
                body.font = serde_json::from_str(&text).map_err(|e| format!("font: {e}"))?;
            }
            "variants" => {
                body.variants =
                    serde_json::from_str(&text).map_err(|e| format!("variants: {e}"))?;
            }
            "source" => body.source = text.parse()?,
            "slug" => body.slug = Some(text).filter(|s| !s.is_empty()),
            _ => {}
        }
    }

    Ok(body.into_request(files))
}

async fn update_font_post<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Json(body): Json<UpdateFontRequest>,
) -> Envelope {
    match blocking(state, move |lib| lib.update_font(body)).await {
        Ok(font) => Envelope::Success {
            response: "Font post successfully updated!".into(),
            data: to_value(font),
        },
        Err(envelope) => envelope,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFontBody {
    font_id: u64,
}

async fn delete_font<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Json(body): Json<DeleteFontBody>,
) -> Envelope {
    match blocking(state, move |lib| lib.delete_font(body.font_id)).await {
        Ok(_) => Envelope::success("Font successfully deleted!"),
        Err(envelope) => envelope,
    }
}

async fn get_settings<F: Fetcher + 'static>(State(state): State<Arc<AppState<F>>>) -> Envelope {
    match blocking(state, |lib| lib.get_settings()).await {
        Ok(settings) => Envelope::success(to_value(settings)),
        Err(envelope) => envelope,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SetSettingsBody {
    settings: Map<String, Value>,
}

async fn set_settings<F: Fetcher + 'static>(
    State(state): State<Arc<AppState<F>>>,
    Json(body): Json<SetSettingsBody>,
) -> Envelope {
    match blocking(state, move |lib| lib.set_settings(&body.settings)).await {
        Ok(update) if update.updated => Envelope::success(json!({
            "message": "Font settings successfully updated!",
            "response": true,
            "settings": update.settings,
        })),
        Ok(update) => Envelope::Failed {
            response: json!({
                "message": "Failed to update font settings.",
                "settings": update.settings,
            }),
        },
        Err(envelope) => envelope,
    }
}
