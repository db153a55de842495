use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::DocForgeError;

/// The interchangeable OCR engines a deployment can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    /// Local raster OCR: flat text, no localization.
    Tesseract,
    /// Detection + recognition model producing polygons and scores.
    Paddle,
    /// OCR.space HTTP API.
    OcrSpace,
}

impl OcrBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Paddle => "paddle",
            Self::OcrSpace => "ocr_space",
        }
    }
}

impl fmt::Display for OcrBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OcrBackendKind {
    type Err = DocForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "tesseract" | "local" | "local_raster" => Ok(Self::Tesseract),
            "paddle" | "paddleocr" | "bbox" | "bounding_box" => Ok(Self::Paddle),
            "ocr_space" | "ocrspace" | "remote" | "remote_api" => Ok(Self::OcrSpace),
            _ => Err(DocForgeError::UnknownBackend(s.to_string())),
        }
    }
}

/// Axis-aligned rectangle `[x_min, y_min, x_max, y_max]` in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    /// Reduce an arbitrary polygon to the rectangle spanned by the min/max of its
    /// vertex coordinates. Returns `None` for an empty polygon.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut points = points.into_iter();
        let (x, y) = points.next()?;
        let init = Self { x_min: x, y_min: y, x_max: x, y_max: y };
        Some(points.fold(init, |acc, (x, y)| Self {
            x_min: acc.x_min.min(x),
            y_min: acc.y_min.min(y),
            x_max: acc.x_max.max(x),
            y_max: acc.y_max.max(y),
        }))
    }

    /// Rectangle from a top-left corner plus extent, as reported by most HTTP OCR APIs.
    pub fn from_rect(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { x_min: left, y_min: top, x_max: left + width.max(0.0), y_max: top + height.max(0.0) }
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self { x_min: v[0], y_min: v[1], x_max: v[2], y_max: v[3] }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

/// One recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ExtractedItem {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), bbox: None, confidence: None }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Attach a recognition score, rounded to 4 decimal places.
    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence = Some(round_confidence(score));
        self
    }
}

/// Round a recognition score to 4 decimal places.
pub fn round_confidence(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

/// Result of one OCR call.
///
/// `Warning` means the engine ran but found nothing; `Error` means the extraction
/// itself failed. Neither is ever represented as an empty `Items`.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutcome {
    Items(Vec<ExtractedItem>),
    Warning(String),
    Error(String),
}

impl OcrOutcome {
    /// Wrap a successful extraction, turning an empty list into a warning.
    pub fn from_items(items: Vec<ExtractedItem>) -> Self {
        if items.is_empty() {
            Self::Warning("No text detected".to_string())
        } else {
            Self::Items(items)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn items(&self) -> &[ExtractedItem] {
        match self {
            Self::Items(items) => items,
            _ => &[],
        }
    }

    /// Newline-joined text of all items; warnings and errors render as their message.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Items(items) => items
                .iter()
                .map(|i| i.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Warning(msg) | Self::Error(msg) => msg.clone(),
        }
    }

    /// Serialize to the JSON shape handed to tool callers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| serde_json::json!([{ "error": e.to_string() }]))
    }
}

#[derive(Serialize)]
struct WarningRecord<'a> {
    warning: &'a str,
}

#[derive(Serialize)]
struct ErrorRecord<'a> {
    error: &'a str,
}

impl Serialize for OcrOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Items(items) => items.serialize(serializer),
            Self::Warning(msg) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&WarningRecord { warning: msg })?;
                seq.end()
            }
            Self::Error(msg) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&ErrorRecord { error: msg })?;
                seq.end()
            }
        }
    }
}
