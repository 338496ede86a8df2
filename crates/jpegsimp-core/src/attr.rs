//! Image attributes and write options.

use serde::{Deserialize, Serialize};

/// Image dimension in pixels.
pub type Dimension = u32;

/// JPEG quantization quality (0-100).
pub type Quality = u8;

/// Lowest output quality the optimizer will ever encode at.
///
/// Requests below this value are raised to it by [`effective_quality`].
pub const MIN_QUALITY: Quality = 75;

/// Resolve a requested output quality against the quality floor.
///
/// Returns `max(quality, MIN_QUALITY)`.
#[inline]
pub fn effective_quality(quality: Quality) -> Quality {
    quality.max(MIN_QUALITY)
}

fn is_zero(quality: &Quality) -> bool {
    *quality == 0
}

/// Intrinsic attributes of an opened image.
///
/// Populated once from codec-reported values when the image is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    /// Image width in pixels.
    pub width: Dimension,
    /// Image height in pixels.
    pub height: Dimension,
    /// Estimated quantization quality of the source (0 when unknown).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub quality: Quality,
    /// Format extension (e.g. "jpg").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ext: String,
    /// Display name, usually the file name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Attr {
    /// Create attributes from codec-reported width, height and quality.
    pub fn new(width: Dimension, height: Dimension, quality: Quality) -> Self {
        Self {
            width,
            height,
            quality,
            ..Default::default()
        }
    }

    /// Attach a format extension.
    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = ext.into();
        self
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Caller-supplied options applied before writing.
///
/// The zero value (`strip_all = false`, `quality = 0`) is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOption {
    /// Remove non-essential metadata segments (EXIF, XMP, ICC, comments).
    pub strip_all: bool,
    /// Target output quality, subject to [`MIN_QUALITY`].
    pub quality: Quality,
}

impl WriteOption {
    /// Create a write option.
    pub fn new(quality: Quality, strip_all: bool) -> Self {
        Self { strip_all, quality }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the floor is exactly max(q, 75) across the whole range.
        #[test]
        fn prop_effective_quality_is_max(q in 0u8..=100) {
            prop_assert_eq!(effective_quality(q), q.max(75));
        }

        /// Property: the floor never lowers a request.
        #[test]
        fn prop_effective_quality_never_lowers(q in any::<u8>()) {
            prop_assert!(effective_quality(q) >= q);
            prop_assert!(effective_quality(q) >= MIN_QUALITY);
        }

        /// Property: applying the floor twice changes nothing.
        #[test]
        fn prop_effective_quality_idempotent(q in any::<u8>()) {
            prop_assert_eq!(effective_quality(effective_quality(q)), effective_quality(q));
        }
    }
}
