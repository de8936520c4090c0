//! Cloudinary upload and admin client

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::CloudinaryConfig;
use crate::error::{MediaError, MediaResult};
use crate::signature::{UploadKind, sign_params, unix_timestamp};
use crate::transform::{ResourceType, UrlBuilder};

/// Metadata of an asset stored by the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub public_id: String,
    /// Size of the original upload
    pub bytes: i64,
    /// Size after the eager transformation, the original size when there is none
    pub compressed_bytes: i64,
    /// Seconds, zero for images
    pub duration: f64,
    pub secure_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    #[serde(default)]
    bytes: i64,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    secure_url: String,
    #[serde(default)]
    eager: Vec<EagerResult>,
}

#[derive(Debug, Deserialize)]
struct EagerResult {
    #[serde(default)]
    bytes: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl From<UploadResponse> for UploadedAsset {
    fn from(response: UploadResponse) -> Self {
        let compressed_bytes = response
            .eager
            .first()
            .and_then(|e| e.bytes)
            .unwrap_or(response.bytes);

        UploadedAsset {
            public_id: response.public_id,
            bytes: response.bytes,
            compressed_bytes,
            duration: response.duration.unwrap_or_default(),
            secure_url: response.secure_url,
        }
    }
}

/// Result of removing an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Deleted,
    /// The provider had no such asset; nothing left to remove
    NotFound,
}

/// Remote store holding the uploaded assets
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn destroy(&self, public_id: &str, resource: ResourceType) -> MediaResult<DestroyOutcome>;
}

/// HTTP client for the Cloudinary upload API
#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    pub fn urls(&self) -> UrlBuilder {
        UrlBuilder::new(&self.config.delivery_base, &self.config.cloud_name)
    }

    fn endpoint(&self, resource: ResourceType, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.api_base,
            self.config.cloud_name,
            resource.as_str(),
            action
        )
    }

    /// Upload a file into the folder for `kind`, applying its eager transformation
    pub async fn upload(
        &self,
        data: Vec<u8>,
        filename: &str,
        kind: UploadKind,
    ) -> MediaResult<UploadedAsset> {
        let timestamp = unix_timestamp();
        let mut params = kind.upload_params();
        params.insert("timestamp", timestamp.to_string());
        let signature = sign_params(&params, &self.config.api_secret);

        let size = data.len();
        let mut form = Form::new()
            .part("file", Part::bytes(data).file_name(filename.to_string()))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = self.endpoint(kind.resource_type(), "upload");
        debug!("Uploading {} bytes to {}", size, url);

        let response = self.http.post(&url).multipart(form).send().await?;
        let body: UploadResponse = decode(response).await?;
        let asset = UploadedAsset::from(body);

        info!(
            "Uploaded asset {} ({} -> {} bytes)",
            asset.public_id, asset.bytes, asset.compressed_bytes
        );
        Ok(asset)
    }
}

#[async_trait]
impl AssetStore for CloudinaryClient {
    async fn destroy(&self, public_id: &str, resource: ResourceType) -> MediaResult<DestroyOutcome> {
        let timestamp = unix_timestamp();
        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("timestamp", timestamp.to_string());
        let signature = sign_params(&params, &self.config.api_secret);

        let form = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
        ];

        let response = self
            .http
            .post(self.endpoint(resource, "destroy"))
            .form(&form)
            .send()
            .await?;
        let body: DestroyResponse = decode(response).await?;

        match body.result.as_str() {
            "ok" => {
                info!("Destroyed asset {}", public_id);
                Ok(DestroyOutcome::Deleted)
            }
            "not found" => {
                warn!("Asset {} was already gone from the provider", public_id);
                Ok(DestroyOutcome::NotFound)
            }
            other => Err(MediaError::Rejected {
                status: 200,
                message: format!("destroy returned '{}'", other),
            }),
        }
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> MediaResult<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or(text);
        return Err(MediaError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&text).map_err(|e| MediaError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "1234".to_string(),
            api_secret: "test_secret".to_string(),
            api_base: server.uri(),
            delivery_base: "https://res.cloudinary.com".to_string(),
        })
    }

    #[tokio::test]
    async fn test_upload_reads_eager_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/upload"))
            .and(body_string_contains("video-uploads"))
            .and(body_string_contains("q_auto,f_mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "video-uploads/clip",
                "bytes": 5_000_000,
                "duration": 12.5,
                "secure_url": "https://res.cloudinary.com/demo/video/upload/video-uploads/clip.mov",
                "eager": [{ "bytes": 1_250_000 }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let asset = client(&server)
            .upload(vec![0u8; 16], "clip.mov", UploadKind::Video)
            .await
            .unwrap();

        assert_eq!(asset.public_id, "video-uploads/clip");
        assert_eq!(asset.bytes, 5_000_000);
        assert_eq!(asset.compressed_bytes, 1_250_000);
        assert_eq!(asset.duration, 12.5);
    }

    #[tokio::test]
    async fn test_image_upload_falls_back_to_original_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "image-uploads/cat",
                "bytes": 2048,
                "secure_url": "https://res.cloudinary.com/demo/image/upload/image-uploads/cat.png"
            })))
            .mount(&server)
            .await;

        let asset = client(&server)
            .upload(vec![1u8; 8], "cat.png", UploadKind::Image)
            .await
            .unwrap();

        assert_eq!(asset.compressed_bytes, 2048);
        assert_eq!(asset.duration, 0.0);
    }

    #[tokio::test]
    async fn test_upload_surfaces_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .upload(vec![0u8; 4], "clip.mov", UploadKind::Video)
            .await
            .unwrap_err();

        match err {
            MediaError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_destroy_outcomes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/destroy"))
            .and(body_string_contains("public_id=video-uploads%2Fclip"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "ok" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/destroy"))
            .and(body_string_contains("public_id=video-uploads%2Fgone"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "not found" })),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(
            client.destroy("video-uploads/clip", ResourceType::Video).await.unwrap(),
            DestroyOutcome::Deleted
        );
        assert_eq!(
            client.destroy("video-uploads/gone", ResourceType::Video).await.unwrap(),
            DestroyOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_destroy_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/video/destroy"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server)
            .destroy("video-uploads/clip", ResourceType::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Rejected { status: 500, .. }));
    }
}
