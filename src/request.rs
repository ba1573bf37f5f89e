//! Caller-facing request body and the validated [`GenerationRequest`] built from it.
//!
//! Validation happens exactly once, when a [`GenerateVideoBody`] is turned into a
//! [`GenerationRequest`]. Everything downstream matches on the variant instead of
//! re-checking which optional fields are present.

use crate::error::ValidationError;
use crate::types::{ImageListItem, TaskKind};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "kling-v1";
/// The only model accepting more than one reference image.
pub const MULTI_REFERENCE_MODEL: &str = "kling-v1-6";
pub const MAX_REFERENCE_IMAGES: usize = 5;
pub const DEFAULT_DURATION: u32 = 5;

/// Generation quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Standard,
    Professional,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Standard => "std",
            Mode::Professional => "pro",
        }
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "std" => Ok(Mode::Standard),
            "pro" => Ok(Mode::Professional),
            other => Err(ValidationError::new(format!(
                "mode must be \"std\" or \"pro\", got \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Landscape,
    Portrait,
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(ValidationError::new(format!(
                "unsupported aspect_ratio \"{other}\", expected one of 16:9, 9:16, 1:1"
            ))),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference image, either raw base64 or an `http(s)` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage(String);

impl ReferenceImage {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::new("reference image must not be empty"));
        }
        // The provider expects bare base64, not a data URL.
        let data = match raw.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
            Some((_, payload)) => payload,
            None => raw,
        };
        Ok(Self(data.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The JSON body accepted by `POST /api/generate-video`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateVideoBody {
    #[serde(default)]
    pub input: String,
    pub model: Option<String>,
    pub mode: Option<String>,
    pub aspect_ratio: Option<String>,
    pub duration: Option<i64>,
    pub negative_prompt: Option<String>,
    pub cfg_scale: Option<f32>,
    /// Base64 images for single-image mode.
    #[serde(default)]
    pub images: Vec<String>,
    /// Image objects for multi-image mode.
    #[serde(default)]
    pub image_list: Vec<ImageListItem>,
}

/// Fields shared by every request variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoParams {
    pub model: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub cfg_scale: Option<f32>,
    pub mode: Mode,
    pub duration: u32,
}

/// A validated generation request. The variant decides which provider endpoint is called.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    TextToVideo {
        params: VideoParams,
        aspect_ratio: AspectRatio,
    },
    ImageToVideo {
        params: VideoParams,
        image: ReferenceImage,
    },
    MultiImageToVideo {
        params: VideoParams,
        aspect_ratio: AspectRatio,
        images: Vec<ReferenceImage>,
    },
}

impl GenerationRequest {
    pub fn params(&self) -> &VideoParams {
        match self {
            GenerationRequest::TextToVideo { params, .. }
            | GenerationRequest::ImageToVideo { params, .. }
            | GenerationRequest::MultiImageToVideo { params, .. } => params,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            GenerationRequest::TextToVideo { .. } => TaskKind::Text2Video,
            GenerationRequest::ImageToVideo { .. } => TaskKind::Image2Video,
            GenerationRequest::MultiImageToVideo { .. } => TaskKind::MultiImage2Video,
        }
    }

    /// `None` for image-to-video, where the frame follows the reference image.
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        match self {
            GenerationRequest::TextToVideo { aspect_ratio, .. }
            | GenerationRequest::MultiImageToVideo { aspect_ratio, .. } => Some(*aspect_ratio),
            GenerationRequest::ImageToVideo { .. } => None,
        }
    }

    pub fn reference_count(&self) -> usize {
        match self {
            GenerationRequest::TextToVideo { .. } => 0,
            GenerationRequest::ImageToVideo { .. } => 1,
            GenerationRequest::MultiImageToVideo { images, .. } => images.len(),
        }
    }
}

impl TryFrom<GenerateVideoBody> for GenerationRequest {
    type Error = ValidationError;

    fn try_from(body: GenerateVideoBody) -> Result<Self, Self::Error> {
        let prompt = body.input.trim();
        if prompt.is_empty() {
            return Err(ValidationError::new("input must not be empty"));
        }

        if !body.images.is_empty() && !body.image_list.is_empty() {
            return Err(ValidationError::new("images and image_list cannot be used together"));
        }
        let raw_images: Vec<&str> = if body.image_list.is_empty() {
            body.images.iter().map(String::as_str).collect()
        } else {
            body.image_list.iter().map(|item| item.image.as_str()).collect()
        };
        if raw_images.len() > MAX_REFERENCE_IMAGES {
            return Err(ValidationError::new(format!(
                "at most {MAX_REFERENCE_IMAGES} reference images are allowed, got {}",
                raw_images.len()
            )));
        }

        let model = body
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string();

        let multi = !body.image_list.is_empty() || raw_images.len() > 1;
        if multi && model != MULTI_REFERENCE_MODEL {
            return Err(ValidationError::new(format!(
                "multiple reference images require model {MULTI_REFERENCE_MODEL}, got {model}"
            )));
        }

        let mode = match body.mode.as_deref() {
            Some(m) => m.parse()?,
            None => Mode::default(),
        };
        let aspect_ratio = match body.aspect_ratio.as_deref() {
            Some(a) => a.parse()?,
            None => AspectRatio::default(),
        };
        let duration = match body.duration {
            None => DEFAULT_DURATION,
            Some(d) if d > 0 => u32::try_from(d)
                .map_err(|_| ValidationError::new(format!("duration {d} is too large")))?,
            Some(d) => {
                return Err(ValidationError::new(format!(
                    "duration must be a positive number of seconds, got {d}"
                )));
            }
        };
        if let Some(cfg) = body.cfg_scale {
            if !(0.0..=1.0).contains(&cfg) {
                return Err(ValidationError::new("cfg_scale must be between 0 and 1"));
            }
        }

        let params = VideoParams {
            model,
            prompt: prompt.to_string(),
            negative_prompt: body
                .negative_prompt
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            cfg_scale: body.cfg_scale,
            mode,
            duration,
        };

        let mut images = raw_images
            .into_iter()
            .map(ReferenceImage::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let request = if multi {
            GenerationRequest::MultiImageToVideo {
                params,
                aspect_ratio,
                images,
            }
        } else if let Some(image) = images.pop() {
            GenerationRequest::ImageToVideo { params, image }
        } else {
            GenerationRequest::TextToVideo {
                params,
                aspect_ratio,
            }
        };
        Ok(request)
    }
}
