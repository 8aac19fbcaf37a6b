//! Design session state.
//!
//! A [`DesignSessionState`] is everything the compositor needs to render one
//! design. It is plain data: renders take a copy, and variations keep one as
//! their snapshot.

use crate::image_source::ImageRef;
use crate::placement::PlacementTransform;
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Background fill behind the base image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackgroundSpec {
    Color([u8; 3]),
    Transparent,
}

impl BackgroundSpec {
    pub const WHITE: Self = Self::Color([255, 255, 255]);

    /// RGBA fill value; transparent black for [`BackgroundSpec::Transparent`].
    pub fn fill(&self) -> Rgba<u8> {
        match self {
            Self::Color([r, g, b]) => Rgba([*r, *g, *b, 255]),
            Self::Transparent => Rgba([0, 0, 0, 0]),
        }
    }
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for BackgroundSpec {
    type Err = String;

    /// Accepts `transparent`, `#rgb` and `#rrggbb` (case-insensitive).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("transparent") {
            return Ok(Self::Transparent);
        }

        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| format!("Unrecognised background '{}'", raw))?;
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| format!("Invalid hex color '{}'", raw));

        if !hex.is_ascii() {
            return Err(format!("Invalid hex color '{}'", raw));
        }

        match hex.len() {
            // #rgb expands each digit: f -> ff
            3 => Ok(Self::Color([
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            ])),
            6 => Ok(Self::Color([
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            ])),
            _ => Err(format!("Invalid hex color '{}'", raw)),
        }
    }
}

impl TryFrom<String> for BackgroundSpec {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<BackgroundSpec> for String {
    fn from(spec: BackgroundSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for BackgroundSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color([r, g, b]) => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            Self::Transparent => write!(f, "transparent"),
        }
    }
}

/// Live-preview adjustments, in percent (100 = unchanged).
///
/// These never reach an exported raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub brightness: u16,
    pub contrast: u16,
}

impl FilterSettings {
    pub const MAX: u16 = 200;

    pub fn new(brightness: u16, contrast: u16) -> Self {
        Self {
            brightness: brightness.min(Self::MAX),
            contrast: contrast.min(Self::MAX),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 100 && self.contrast == 100
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            brightness: 100,
            contrast: 100,
        }
    }
}

/// Everything needed to render one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSessionState {
    pub base_image: ImageRef,
    pub overlay_image: Option<ImageRef>,
    pub background: BackgroundSpec,
    pub placement: PlacementTransform,
    pub filters: FilterSettings,
}

impl DesignSessionState {
    pub fn new(base_image: ImageRef) -> Self {
        Self {
            base_image,
            overlay_image: None,
            background: BackgroundSpec::default(),
            placement: PlacementTransform::default(),
            filters: FilterSettings::default(),
        }
    }

    pub fn with_overlay(mut self, overlay: ImageRef) -> Self {
        self.overlay_image = Some(overlay);
        self
    }

    pub fn with_background(mut self, background: BackgroundSpec) -> Self {
        self.background = background;
        self
    }

    pub fn with_placement(mut self, placement: PlacementTransform) -> Self {
        self.placement = placement.sanitized();
        self
    }
}
