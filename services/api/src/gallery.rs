//! Gallery operations spanning the database and the media provider

use media::{AssetStore, DestroyOutcome, ResourceType, UrlBuilder};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::VideoView,
    repositories::VideoStore,
};

/// The caller's videos as gallery cards, newest first
pub async fn list(videos: &dyn VideoStore, urls: &UrlBuilder, user_id: Uuid) -> ApiResult<Vec<VideoView>> {
    let rows = videos.list_by_owner(user_id).await.map_err(|e| {
        error!("Failed to fetch videos: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(rows.into_iter().map(|v| VideoView::new(v, urls)).collect())
}

/// Delete a video: the provider asset first, then the row
///
/// When the provider call fails the row is kept so the user can retry.
/// An asset the provider no longer has counts as deleted.
pub async fn delete(
    videos: &dyn VideoStore,
    assets: &dyn AssetStore,
    id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    let video = videos
        .find_owned(id, user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up video {}: {}", id, e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Video not found"))?;

    match assets.destroy(&video.public_id, ResourceType::Video).await {
        Ok(DestroyOutcome::Deleted) => {}
        Ok(DestroyOutcome::NotFound) => {
            warn!("Asset {} was missing at the provider", video.public_id);
        }
        Err(e) => {
            error!("Failed to delete asset {}: {}", video.public_id, e);
            return Err(ApiError::Upstream(e));
        }
    }

    let removed = videos.delete_owned(id, user_id).await.map_err(|e| {
        // the asset is already gone at this point
        error!("Deleted asset {} but failed to delete video {}: {}", video.public_id, id, e);
        ApiError::InternalServerError
    })?;

    if removed {
        info!("Deleted video {} for user {}", id, user_id);
    } else {
        warn!("Video {} disappeared before it could be deleted", id);
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod fakes {
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use media::{DestroyOutcome, MediaError, MediaResult, ResourceType};
    use std::sync::Mutex;
    use uuid::Uuid;

    use crate::models::{NewVideo, Video};
    use crate::repositories::VideoStore;

    /// In-memory video store
    #[derive(Default)]
    pub struct FakeVideos {
        pub rows: Mutex<Vec<Video>>,
    }

    #[async_trait]
    impl VideoStore for FakeVideos {
        async fn create(&self, video: &NewVideo) -> Result<Video> {
            let row = Video {
                id: Uuid::new_v4(),
                title: video.title.clone(),
                description: video.description.clone(),
                public_id: video.public_id.clone(),
                original_size: video.original_size,
                compressed_size: video.compressed_size,
                duration: video.duration,
                user_id: video.user_id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.rows.lock().unwrap().push(row.clone());
            Ok(row)
        }

        async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Video>> {
            let mut rows: Vec<Video> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|v| v.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Video>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.id == id && v.user_id == user_id)
                .cloned())
        }

        async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|v| !(v.id == id && v.user_id == user_id));
            Ok(rows.len() < before)
        }
    }

    /// Asset store recording destroyed ids; optionally failing every call
    #[derive(Default)]
    pub struct FakeAssets {
        pub destroyed: Mutex<Vec<String>>,
        pub fail: bool,
        pub missing: bool,
    }

    #[async_trait]
    impl media::AssetStore for FakeAssets {
        async fn destroy(&self, public_id: &str, _resource: ResourceType) -> MediaResult<DestroyOutcome> {
            if self.fail {
                return Err(MediaError::Rejected {
                    status: 500,
                    message: "provider unavailable".to_string(),
                });
            }
            self.destroyed.lock().unwrap().push(public_id.to_string());
            Ok(if self.missing {
                DestroyOutcome::NotFound
            } else {
                DestroyOutcome::Deleted
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{FakeAssets, FakeVideos};
    use super::*;
    use crate::models::NewVideo;

    async fn seed(videos: &FakeVideos, user_id: Uuid, title: &str) -> Uuid {
        videos
            .create(&NewVideo {
                title: title.to_string(),
                description: None,
                public_id: format!("video-uploads/{}", title),
                original_size: 1000,
                compressed_size: 250,
                duration: 4.0,
                user_id,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_delete_removes_asset_then_row() {
        let videos = FakeVideos::default();
        let assets = FakeAssets::default();
        let user_id = Uuid::new_v4();
        let id = seed(&videos, user_id, "clip").await;

        delete(&videos, &assets, id, user_id).await.unwrap();

        assert_eq!(*assets.destroyed.lock().unwrap(), vec!["video-uploads/clip"]);
        assert!(videos.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_row() {
        let videos = FakeVideos::default();
        let assets = FakeAssets {
            fail: true,
            ..Default::default()
        };
        let user_id = Uuid::new_v4();
        let id = seed(&videos, user_id, "clip").await;

        let err = delete(&videos, &assets, id, user_id).await.unwrap_err();

        assert!(matches!(err, ApiError::Upstream(_)));
        assert_eq!(videos.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_asset_still_deletes_row() {
        let videos = FakeVideos::default();
        let assets = FakeAssets {
            missing: true,
            ..Default::default()
        };
        let user_id = Uuid::new_v4();
        let id = seed(&videos, user_id, "clip").await;

        delete(&videos, &assets, id, user_id).await.unwrap();
        assert!(videos.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cannot_delete_someone_elses_video() {
        let videos = FakeVideos::default();
        let assets = FakeAssets::default();
        let id = seed(&videos, Uuid::new_v4(), "clip").await;

        let err = delete(&videos, &assets, id, Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(assets.destroyed.lock().unwrap().is_empty());
        assert_eq!(videos.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_only_returns_own_videos() {
        let videos = FakeVideos::default();
        let user_id = Uuid::new_v4();
        seed(&videos, user_id, "mine").await;
        seed(&videos, Uuid::new_v4(), "theirs").await;

        let urls = UrlBuilder::new("https://res.cloudinary.com", "demo");
        let views = list(&videos, &urls, user_id).await.unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].video.title, "mine");
    }
}
