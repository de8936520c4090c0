//! Video models for the API service

use chrono::{DateTime, Utc};
use media::{
    UrlBuilder,
    format::{compression_percentage, format_duration, format_size},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored video metadata; the media itself lives at the provider
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub public_id: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub duration: f64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated insert payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    pub public_id: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub duration: f64,
    pub user_id: Uuid,
}

/// Byte count sent by clients either as a JSON number or as a string
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ByteCount {
    Number(f64),
    Text(String),
}

impl ByteCount {
    fn parse(&self) -> Option<i64> {
        let value = match self {
            ByteCount::Number(n) => *n,
            ByteCount::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as i64)
    }

    fn is_zero(&self) -> bool {
        self.parse() == Some(0)
    }
}

/// Request for saving metadata after an upload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub public_id: Option<String>,
    pub original_size: Option<ByteCount>,
    pub compressed_size: Option<ByteCount>,
    pub duration: Option<f64>,
}

impl SaveVideoRequest {
    /// Check required fields and ranges, producing the row to insert
    ///
    /// Title, public id and both sizes are required; a zero size counts as
    /// missing. Errors are itemized in field order.
    pub fn validate(self, user_id: Uuid) -> Result<NewVideo, Vec<String>> {
        let mut errors = Vec::new();

        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if title.is_none() {
            errors.push("title is required".to_string());
        }

        let public_id = self
            .public_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if public_id.is_none() {
            errors.push("publicId is required".to_string());
        }

        let original_size = size_field("originalSize", self.original_size.as_ref(), &mut errors);
        let compressed_size =
            size_field("compressedSize", self.compressed_size.as_ref(), &mut errors);

        let duration = self.duration.unwrap_or(0.0);
        if !duration.is_finite() || duration < 0.0 {
            errors.push("duration must be a non-negative number".to_string());
        }

        match (title, public_id, original_size, compressed_size) {
            (Some(title), Some(public_id), Some(original_size), Some(compressed_size))
                if errors.is_empty() =>
            {
                Ok(NewVideo {
                    title: title.to_string(),
                    description: self
                        .description
                        .map(|d| d.trim().to_string())
                        .filter(|d| !d.is_empty()),
                    public_id: public_id.to_string(),
                    original_size,
                    compressed_size,
                    duration,
                    user_id,
                })
            }
            _ => Err(errors),
        }
    }
}

fn size_field(name: &str, value: Option<&ByteCount>, errors: &mut Vec<String>) -> Option<i64> {
    match value {
        None => {
            errors.push(format!("{} is required", name));
            None
        }
        Some(v) if v.is_zero() => {
            errors.push(format!("{} is required", name));
            None
        }
        Some(v) => {
            let parsed = v.parse();
            if parsed.is_none() {
                errors.push(format!("{} must be a non-negative whole number of bytes", name));
            }
            parsed
        }
    }
}

/// Gallery card: stored metadata plus provider URLs and display strings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(flatten)]
    pub video: Video,
    pub thumbnail_url: String,
    pub preview_url: String,
    pub video_url: String,
    pub download_name: String,
    pub original_size_label: String,
    pub compressed_size_label: String,
    pub duration_label: String,
    pub compression_percentage: i64,
}

impl VideoView {
    pub fn new(video: Video, urls: &UrlBuilder) -> Self {
        VideoView {
            thumbnail_url: urls.video_thumbnail(&video.public_id),
            preview_url: urls.video_preview(&video.public_id),
            video_url: urls.video_full(&video.public_id),
            download_name: format!("{}.mp4", video.title),
            original_size_label: format_size(video.original_size),
            compressed_size_label: format_size(video.compressed_size),
            duration_label: format_duration(video.duration),
            compression_percentage: compression_percentage(
                video.original_size,
                video.compressed_size,
            ),
            video,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> SaveVideoRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_validate_accepts_numbers_and_strings() {
        let user_id = Uuid::new_v4();
        let video = request(serde_json::json!({
            "title": "  Holiday ",
            "publicId": "video-uploads/holiday",
            "originalSize": "5000000",
            "compressedSize": 1250000,
            "duration": 12.5
        }))
        .validate(user_id)
        .unwrap();

        assert_eq!(video.title, "Holiday");
        assert_eq!(video.description, None);
        assert_eq!(video.original_size, 5_000_000);
        assert_eq!(video.compressed_size, 1_250_000);
        assert_eq!(video.user_id, user_id);
    }

    #[test]
    fn test_validate_reports_missing_fields() {
        let errors = request(serde_json::json!({ "originalSize": 0 }))
            .validate(Uuid::new_v4())
            .unwrap_err();

        assert_eq!(
            errors,
            vec![
                "title is required",
                "publicId is required",
                "originalSize is required",
                "compressedSize is required",
            ]
        );
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        let errors = request(serde_json::json!({
            "title": "Clip",
            "publicId": "video-uploads/clip",
            "originalSize": -5,
            "compressedSize": "abc",
            "duration": -1.0
        }))
        .validate(Uuid::new_v4())
        .unwrap_err();

        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_view_adds_urls_and_labels() {
        let video = Video {
            id: Uuid::new_v4(),
            title: "Holiday".to_string(),
            description: None,
            public_id: "video-uploads/holiday".to_string(),
            original_size: 5_000_000,
            compressed_size: 1_250_000,
            duration: 65.0,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let view = VideoView::new(video, &UrlBuilder::new("https://res.cloudinary.com", "demo"));
        assert_eq!(view.compression_percentage, 75);
        assert_eq!(view.original_size_label, "5 MB");
        assert_eq!(view.duration_label, "1:05");
        assert_eq!(view.download_name, "Holiday.mp4");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["publicId"], "video-uploads/holiday");
        assert!(
            json["thumbnailUrl"]
                .as_str()
                .unwrap()
                .ends_with("/video-uploads/holiday.jpg")
        );
    }
}
