//! Transformation URLs
//!
//! The provider performs cropping, compression, previews and format
//! conversion on the fly; all this crate does is encode the desired
//! operations into the delivery URL path.

use serde::{Deserialize, Serialize};

/// Provider resource type, the second path segment of asset URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Image,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "video",
            ResourceType::Image => "image",
        }
    }
}

/// Ordered set of provider transformation parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformation {
    crop: Option<&'static str>,
    gravity: Option<&'static str>,
    aspect_ratio: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    quality: Option<&'static str>,
    format: Option<&'static str>,
    effects: Vec<String>,
}

impl Transformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// `c_fill,g_auto`: fill the frame and let the provider keep the subject in view
    pub fn smart_fill(mut self) -> Self {
        self.crop = Some("fill");
        self.gravity = Some("auto");
        self
    }

    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn auto_quality(mut self) -> Self {
        self.quality = Some("auto");
        self
    }

    pub fn format(mut self, format: &'static str) -> Self {
        self.format = Some(format);
        self
    }

    /// Raw effect appended verbatim, e.g. `e_preview:duration_15`
    pub fn effect(mut self, effect: impl Into<String>) -> Self {
        self.effects.push(effect.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to_string().is_empty()
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(crop) = self.crop {
            parts.push(format!("c_{}", crop));
        }
        if let Some(gravity) = self.gravity {
            parts.push(format!("g_{}", gravity));
        }
        if let Some(ratio) = &self.aspect_ratio {
            parts.push(format!("ar_{}", ratio));
        }
        if let Some(width) = self.width {
            parts.push(format!("w_{}", width));
        }
        if let Some(height) = self.height {
            parts.push(format!("h_{}", height));
        }
        if let Some(quality) = self.quality {
            parts.push(format!("q_{}", quality));
        }
        if let Some(format) = self.format {
            parts.push(format!("f_{}", format));
        }
        parts.extend(self.effects.iter().cloned());
        f.write_str(&parts.join(","))
    }
}

/// Builds delivery URLs for one cloud
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    delivery_base: String,
    cloud_name: String,
}

impl UrlBuilder {
    pub fn new(delivery_base: impl Into<String>, cloud_name: impl Into<String>) -> Self {
        Self {
            delivery_base: delivery_base.into().trim_end_matches('/').to_string(),
            cloud_name: cloud_name.into(),
        }
    }

    /// `{base}/{cloud}/{resource}/upload[/{transformation}]/{public_id}.{ext}`
    pub fn url(
        &self,
        resource: ResourceType,
        transformation: &Transformation,
        public_id: &str,
        extension: &str,
    ) -> String {
        let transformation = transformation.to_string();
        let mut url = format!(
            "{}/{}/{}/upload/",
            self.delivery_base,
            self.cloud_name,
            resource.as_str()
        );
        if !transformation.is_empty() {
            url.push_str(&transformation);
            url.push('/');
        }
        url.push_str(public_id.trim_start_matches('/'));
        url.push('.');
        url.push_str(extension);
        url
    }

    /// Poster frame for gallery cards
    pub fn video_thumbnail(&self, public_id: &str) -> String {
        let t = Transformation::new()
            .smart_fill()
            .size(400, 225)
            .auto_quality()
            .format("jpg");
        self.url(ResourceType::Video, &t, public_id, "jpg")
    }

    /// Short highlight reel played while hovering a gallery card
    pub fn video_preview(&self, public_id: &str) -> String {
        let t = Transformation::new()
            .size(400, 225)
            .effect("e_preview:duration_15:max_seg_9:min_seg_dur_1");
        self.url(ResourceType::Video, &t, public_id, "mp4")
    }

    /// Full-resolution playback/download URL
    pub fn video_full(&self, public_id: &str) -> String {
        let t = Transformation::new().size(1920, 1080);
        self.url(ResourceType::Video, &t, public_id, "mp4")
    }

    /// Subject-aware crop of a video to one of the social formats
    pub fn cropped_video(&self, public_id: &str, format: CropFormat) -> String {
        let t = Transformation::new()
            .smart_fill()
            .aspect_ratio(format.aspect_ratio());
        self.url(ResourceType::Video, &t, public_id, "mp4")
    }

    /// Subject-aware resize of an image to a social media format
    pub fn social_image(&self, public_id: &str, format: SocialFormat) -> String {
        let (width, height) = format.dimensions();
        let t = Transformation::new().smart_fill().size(width, height);
        self.url(ResourceType::Image, &t, public_id, "png")
    }
}

/// Smart crop presets offered by the video cropper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropFormat {
    #[serde(rename = "9:16")]
    Reel,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
}

impl CropFormat {
    pub const ALL: [CropFormat; 4] = [
        CropFormat::Reel,
        CropFormat::Square,
        CropFormat::Portrait,
        CropFormat::Landscape,
    ];

    pub fn aspect_ratio(self) -> &'static str {
        match self {
            CropFormat::Reel => "9:16",
            CropFormat::Square => "1:1",
            CropFormat::Portrait => "4:5",
            CropFormat::Landscape => "16:9",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CropFormat::Reel => "Instagram Reel / TikTok",
            CropFormat::Square => "Square Post",
            CropFormat::Portrait => "Portrait",
            CropFormat::Landscape => "Landscape",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CropFormat::Reel => "Full screen vertical video",
            CropFormat::Square => "Perfect for Instagram feed",
            CropFormat::Portrait => "Taller feed posts",
            CropFormat::Landscape => "Standard YouTube format",
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            CropFormat::Reel => (1080, 1920),
            CropFormat::Square => (1080, 1080),
            CropFormat::Portrait => (1080, 1350),
            CropFormat::Landscape => (1920, 1080),
        }
    }

    /// e.g. `cropped-video-9-16.mp4`
    pub fn download_name(self) -> String {
        format!(
            "cropped-video-{}.mp4",
            self.aspect_ratio().replace(':', "-")
        )
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.aspect_ratio() == value)
    }
}

/// Image formats offered by the social share tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocialFormat {
    #[serde(rename = "Instagram Square (1:1)")]
    InstagramSquare,
    #[serde(rename = "Instagram Portrait (4:5)")]
    InstagramPortrait,
    #[serde(rename = "Twitter Post (16:9)")]
    TwitterPost,
    #[serde(rename = "Twitter Header (3:1)")]
    TwitterHeader,
    #[serde(rename = "Facebook Cover (205:78)")]
    FacebookCover,
}

impl SocialFormat {
    pub const ALL: [SocialFormat; 5] = [
        SocialFormat::InstagramSquare,
        SocialFormat::InstagramPortrait,
        SocialFormat::TwitterPost,
        SocialFormat::TwitterHeader,
        SocialFormat::FacebookCover,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SocialFormat::InstagramSquare => "Instagram Square (1:1)",
            SocialFormat::InstagramPortrait => "Instagram Portrait (4:5)",
            SocialFormat::TwitterPost => "Twitter Post (16:9)",
            SocialFormat::TwitterHeader => "Twitter Header (3:1)",
            SocialFormat::FacebookCover => "Facebook Cover (205:78)",
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            SocialFormat::InstagramSquare => (1080, 1080),
            SocialFormat::InstagramPortrait => (1080, 1350),
            SocialFormat::TwitterPost => (1200, 675),
            SocialFormat::TwitterHeader => (1500, 500),
            SocialFormat::FacebookCover => (820, 312),
        }
    }

    pub fn aspect_ratio(self) -> &'static str {
        match self {
            SocialFormat::InstagramSquare => "1:1",
            SocialFormat::InstagramPortrait => "4:5",
            SocialFormat::TwitterPost => "16:9",
            SocialFormat::TwitterHeader => "3:1",
            SocialFormat::FacebookCover => "205:78",
        }
    }

    /// Label with whitespace replaced by underscores, e.g. `Twitter_Post_(16:9).png`
    pub fn download_name(self) -> String {
        format!(
            "{}.png",
            self.label().split_whitespace().collect::<Vec<_>>().join("_")
        )
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.label() == value || f.aspect_ratio() == value)
    }
}
