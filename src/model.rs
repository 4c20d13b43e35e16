use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An image picked by the user, held in memory until it is replaced.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Handle to the preview of one selection. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewId(pub u64);

impl PreviewId {
    pub fn locator(&self) -> String {
        format!("/preview/{}", self.0)
    }
}

impl fmt::Display for PreviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub file: ImageFile,
    pub preview: PreviewId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    pub confidence: f64,
}

impl PredictionResult {
    /// Classifier labels join words with hyphens, e.g. `Tomato-Leaf-Mold`.
    pub fn display_label(&self) -> String {
        self.label.replace('-', " ")
    }

    /// Fill width of the confidence bar, in percent.
    pub fn bar_width(&self) -> f64 {
        if self.confidence.is_nan() {
            return 0.0;
        }
        self.confidence.clamp(0.0, 100.0)
    }

    pub fn confidence_text(&self) -> String {
        format!("Confidence: {}%", self.confidence)
    }
}
