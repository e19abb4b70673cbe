//! Size-variant URL generation
//!
//! Storage download URLs can address pre-rendered variants through a
//! `size_WxH` object path segment. Other URLs have no variants, so every
//! preset maps back to the original.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static STORAGE_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(https?://firebasestorage\.googleapis\.com/v0/b/[^/?#]+/o/)([^?#]+)(.*)$")
        .expect("storage url pattern is valid")
});

static SIZE_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|/|%2[fF])size_\d+x\d+(/|%2[fF])")
        .expect("size segment pattern is valid")
});

/// Fixed size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePreset {
    /// 150x150
    Thumbnail,
    /// 300x300
    Small,
    /// 600x600
    Medium,
    /// 1200x1200
    Large,
}

impl SizePreset {
    /// All presets, smallest first
    pub const ALL: [Self; 4] = [Self::Thumbnail, Self::Small, Self::Medium, Self::Large];

    /// Bounding box in pixels
    #[inline]
    #[must_use]
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Thumbnail => (150, 150),
            Self::Small => (300, 300),
            Self::Medium => (600, 600),
            Self::Large => (1200, 1200),
        }
    }

    /// Path segment naming this preset, e.g. `size_150x150`
    #[must_use]
    pub fn marker(self) -> String {
        let (width, height) = self.dimensions();
        format!("size_{width}x{height}")
    }
}

/// One URL per preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSizes {
    /// 150x150 variant
    pub thumbnail: String,
    /// 300x300 variant
    pub small: String,
    /// 600x600 variant
    pub medium: String,
    /// 1200x1200 variant
    pub large: String,
}

impl ImageSizes {
    /// URL for a preset
    #[must_use]
    pub fn get(&self, preset: SizePreset) -> &str {
        match preset {
            SizePreset::Thumbnail => &self.thumbnail,
            SizePreset::Small => &self.small,
            SizePreset::Medium => &self.medium,
            SizePreset::Large => &self.large,
        }
    }
}

/// Whether `url` addresses a storage object that has size variants
#[must_use]
pub fn supports_size_variants(url: &str) -> bool {
    STORAGE_OBJECT.is_match(url)
}

/// URL of one preset variant, or `url` unchanged if it has no variants
#[must_use]
pub fn size_variant(url: &str, preset: SizePreset) -> String {
    let Some(captures) = STORAGE_OBJECT.captures(url) else {
        return url.to_string();
    };
    let (Some(base), Some(object), Some(rest)) = (captures.get(1), captures.get(2), captures.get(3))
    else {
        return url.to_string();
    };

    let marker = preset.marker();
    let object = object.as_str();
    let object = if SIZE_SEGMENT.is_match(object) {
        SIZE_SEGMENT
            .replacen(object, 1, |caps: &regex::Captures<'_>| {
                format!("{}{marker}{}", &caps[1], &caps[2])
            })
            .into_owned()
    } else {
        format!("{marker}%2F{object}")
    };

    format!("{}{object}{}", base.as_str(), rest.as_str())
}

/// URLs for all four presets
#[must_use]
pub fn generate_image_sizes(url: &str) -> ImageSizes {
    ImageSizes {
        thumbnail: size_variant(url, SizePreset::Thumbnail),
        small: size_variant(url, SizePreset::Small),
        medium: size_variant(url, SizePreset::Medium),
        large: size_variant(url, SizePreset::Large),
    }
}
