//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    middleware,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{delete, get, post},
};
use futures_util::stream::{self, Stream};
use media::{
    AssetStore, CropFormat, MediaError, ResourceType, SocialFormat, UploadKind, UploadSignature,
    signature::unix_timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    gallery,
    middleware::{AuthUser, auth_middleware},
    models::{SaveVideoRequest, VideoView, video::ByteCount},
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/videos", get(list_videos).post(save_video))
        .route("/api/videos/:id", delete(delete_video))
        .route("/api/upload-signature", post(upload_signature))
        .route("/api/video-upload", post(upload_video))
        .route("/api/image-upload", post(upload_image))
        .route("/api/crop-formats", get(crop_formats))
        .route("/api/video-crop", get(video_crop))
        .route("/api/video-crop/status", get(video_crop_status))
        .route("/api/social-formats", get(social_formats))
        .route("/api/social-image", get(social_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// The caller's gallery, newest first
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<VideoView>>> {
    let views = gallery::list(state.videos.as_ref(), &state.urls(), user.id).await?;
    Ok(Json(views))
}

/// Save metadata for a video uploaded directly to the provider
pub async fn save_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SaveVideoRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_video = payload
        .validate(user.id)
        .map_err(|details| ApiError::Validation {
            message: "Missing required fields".to_string(),
            details,
        })?;

    let video = state.videos.create(&new_video).await.map_err(|e| {
        error!("Failed to save video metadata: {}", e);
        ApiError::InternalServerError
    })?;

    info!("Saved video {} for {}", video.id, user.email);
    Ok((StatusCode::CREATED, Json(video)))
}

/// Delete a video and its provider asset
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    gallery::delete(state.videos.as_ref(), state.assets.as_ref(), id, user.id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct SignatureQuery {
    pub kind: Option<UploadKind>,
}

/// Signed parameters for a direct browser upload
pub async fn upload_signature(
    State(state): State<AppState>,
    Query(query): Query<SignatureQuery>,
) -> Json<UploadSignature> {
    let kind = query.kind.unwrap_or_default();
    Json(UploadSignature::issue(
        state.cloudinary.config(),
        kind,
        unix_timestamp(),
    ))
}

/// A parsed multipart upload
struct UploadForm {
    filename: String,
    data: Vec<u8>,
    fields: HashMap<String, String>,
}

/// Read a multipart body, enforcing `max_bytes` on the `file` part
async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> ApiResult<UploadForm> {
    let mut file = None;
    let mut fields = HashMap::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error(max_bytes))? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let mut data = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error(max_bytes))? {
                if data.len() + chunk.len() > max_bytes {
                    return Err(ApiError::PayloadTooLarge { max_bytes });
                }
                data.extend_from_slice(&chunk);
            }
            file = Some((filename, data));
        } else {
            let value = field.text().await.map_err(multipart_error(max_bytes))?;
            fields.insert(name, value);
        }
    }

    let (filename, data) = file.ok_or_else(|| ApiError::BadRequest("File not found".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }

    Ok(UploadForm {
        filename,
        data,
        fields,
    })
}

fn multipart_error(max_bytes: usize) -> impl Fn(MultipartError) -> ApiError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge { max_bytes };
        }
        ApiError::BadRequest(e.body_text())
    }
}

/// Upload a video through the server, then save its metadata
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_upload(multipart, state.config.max_video_upload_bytes).await?;

    // validate before spending an upload
    let title = form.fields.get("title").cloned();
    if title.as_deref().map(str::trim).unwrap_or_default().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }

    info!("Uploading video {} ({} bytes) for {}", form.filename, form.data.len(), user.email);
    let asset = state
        .cloudinary
        .upload(form.data, &form.filename, UploadKind::Video)
        .await
        .map_err(|e| {
            error!("Video upload failed: {}", e);
            ApiError::Upstream(e)
        })?;

    let original_size = form
        .fields
        .get("originalSize")
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(asset.bytes);

    let new_video = SaveVideoRequest {
        title,
        description: form.fields.get("description").cloned(),
        public_id: Some(asset.public_id.clone()),
        original_size: Some(byte_count(original_size)),
        compressed_size: Some(byte_count(asset.compressed_bytes)),
        duration: Some(asset.duration),
    }
    .validate(user.id);

    let new_video = match new_video {
        Ok(new_video) => new_video,
        Err(details) => {
            let details = details.join(", ");
            error!(
                "Provider returned unusable metadata for {}: {}",
                asset.public_id, details
            );
            discard_upload(&state, &asset.public_id).await;
            return Err(ApiError::Upstream(MediaError::Decode(details)));
        }
    };

    let video = match state.videos.create(&new_video).await {
        Ok(video) => video,
        Err(e) => {
            error!("Failed to save video metadata for {}: {}", asset.public_id, e);
            discard_upload(&state, &asset.public_id).await;
            return Err(ApiError::InternalServerError);
        }
    };

    Ok((StatusCode::CREATED, Json(VideoView::new(video, &state.urls()))))
}

/// Remove an uploaded video that will never get a gallery row
async fn discard_upload(state: &AppState, public_id: &str) {
    match state.assets.destroy(public_id, ResourceType::Video).await {
        Ok(_) => info!("Discarded orphaned upload {}", public_id),
        Err(e) => error!("Failed to discard orphaned upload {}: {}", public_id, e),
    }
}

fn byte_count(bytes: i64) -> ByteCount {
    ByteCount::Number(bytes as f64)
}

/// Upload an image for the social share tool
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_upload(multipart, state.config.max_image_upload_bytes).await?;

    info!("Uploading image {} for {}", form.filename, user.email);
    let asset = state
        .cloudinary
        .upload(form.data, &form.filename, UploadKind::Image)
        .await
        .map_err(|e| {
            error!("Image upload failed: {}", e);
            ApiError::Upstream(e)
        })?;

    Ok(Json(json!({ "publicId": asset.public_id })))
}

/// One entry of the crop format picker
#[derive(Debug, Serialize)]
pub struct CropFormatInfo {
    pub format: CropFormat,
    pub label: &'static str,
    pub description: &'static str,
    pub width: u32,
    pub height: u32,
}

/// The smart crop presets
pub async fn crop_formats() -> Json<Vec<CropFormatInfo>> {
    Json(
        CropFormat::ALL
            .into_iter()
            .map(|format| {
                let (width, height) = format.dimensions();
                CropFormatInfo {
                    format,
                    label: format.label(),
                    description: format.description(),
                    width,
                    height,
                }
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformQuery {
    pub public_id: String,
    pub format: String,
}

impl TransformQuery {
    fn public_id(&self) -> ApiResult<&str> {
        let public_id = self.public_id.trim();
        if public_id.is_empty() {
            return Err(ApiError::BadRequest("publicId is required".to_string()));
        }
        Ok(public_id)
    }

    fn crop_format(&self) -> ApiResult<CropFormat> {
        CropFormat::parse(self.format.trim())
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown crop format: {}", self.format)))
    }

    fn social_format(&self) -> ApiResult<SocialFormat> {
        SocialFormat::parse(self.format.trim())
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown social format: {}", self.format)))
    }
}

/// Transformation URL ready to display or download
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformedAsset {
    pub url: String,
    pub download_name: String,
    pub width: u32,
    pub height: u32,
}

/// Smart-cropped video URL
pub async fn video_crop(
    State(state): State<AppState>,
    Query(query): Query<TransformQuery>,
) -> ApiResult<Json<TransformedAsset>> {
    let format = query.crop_format()?;
    let (width, height) = format.dimensions();

    Ok(Json(TransformedAsset {
        url: state.urls().cropped_video(query.public_id()?, format),
        download_name: format.download_name(),
        width,
        height,
    }))
}

/// Stream the availability of a cropped video as server-sent events
///
/// Each failed probe produces a `progress` event and the stream ends with a
/// single `ready` event once the video is served. A client that disconnects
/// stops the polling.
pub async fn video_crop_status(
    State(state): State<AppState>,
    Query(query): Query<TransformQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let format = query.crop_format()?;
    let url = state.urls().cropped_video(query.public_id()?, format);

    // the upload already happened, so processing starts at the upload share
    let task = state.poller.spawn(url, 90);

    let events = stream::unfold(Some(task), |task| async move {
        let mut task = task?;
        let status = task.next().await?;
        let name = if status.ready { "ready" } else { "progress" };
        let event = Event::default().event(name).json_data(&status).ok()?;
        let next = if status.ready { None } else { Some(task) };
        Some((Ok::<_, Infallible>(event), next))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// One entry of the social format picker
#[derive(Debug, Serialize)]
pub struct SocialFormatInfo {
    pub format: SocialFormat,
    pub aspect_ratio: &'static str,
    pub width: u32,
    pub height: u32,
}

/// The social media image presets
pub async fn social_formats() -> Json<Vec<SocialFormatInfo>> {
    Json(
        SocialFormat::ALL
            .into_iter()
            .map(|format| {
                let (width, height) = format.dimensions();
                SocialFormatInfo {
                    format,
                    aspect_ratio: format.aspect_ratio(),
                    width,
                    height,
                }
            })
            .collect(),
    )
}

/// Image resized for a social media format
pub async fn social_image(
    State(state): State<AppState>,
    Query(query): Query<TransformQuery>,
) -> ApiResult<Json<TransformedAsset>> {
    let format = query.social_format()?;
    let (width, height) = format.dimensions();

    Ok(Json(TransformedAsset {
        url: state.urls().social_image(query.public_id()?, format),
        download_name: format.download_name(),
        width,
        height,
    }))
}
