//! Persisted project document: the source photo plus its annotation layers.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, PixelSize, Size};
use crate::CoreResult;

/// Canonical serialized project.
///
/// History is never persisted; opening a project always starts with an empty
/// undo log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Project identifier.
    pub id: String,
    /// Reference to the source photo, resolved through an asset resolver.
    pub source_image_path: String,
    /// Native pixel size of the source photo.
    pub source_dimensions: PixelSize,
    /// Size of the editing canvas the element geometry is relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_size: Option<Size>,
    /// Layers in z-order.
    #[serde(default)]
    pub elements: Vec<CanvasElement>,
    /// Creation time in milliseconds since the epoch.
    #[serde(default)]
    pub created_at: u64,
    /// Last save time in milliseconds since the epoch.
    #[serde(default)]
    pub updated_at: u64,
}

impl ProjectDocument {
    /// Create an empty project for a source photo.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source_image_path: impl Into<String>,
        source_dimensions: PixelSize,
    ) -> Self {
        let now = current_timestamp_ms();
        Self {
            id: id.into(),
            source_image_path: source_image_path.into(),
            source_dimensions,
            canvas_size: None,
            elements: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the editing canvas size.
    #[must_use]
    pub fn with_canvas_size(mut self, width: f32, height: f32) -> Self {
        self.canvas_size = Some(Size::new(width, height));
        self
    }

    /// Set the layers.
    #[must_use]
    pub fn with_elements(mut self, elements: Vec<CanvasElement>) -> Self {
        self.elements = elements;
        self
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = current_timestamp_ms().max(self.created_at);
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Serialization`] if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Serialization`] if the input is not a valid
    /// project document.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The source reference as a path, for resolvers that want one.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        PathBuf::from(&self.source_image_path)
    }
}

/// Current Unix timestamp in milliseconds.
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TextStyle;

    #[test]
    fn test_json_roundtrip_keeps_element_order() {
        let doc = ProjectDocument::new("trip", "/photos/beach.jpg", PixelSize::new(4000, 3000))
            .with_canvas_size(400.0, 300.0)
            .with_elements(vec![
                CanvasElement::sticker("bundle://heart.png", 64.0, 64.0),
                CanvasElement::text(TextStyle::new("Summer", 32.0)),
            ]);

        let json = doc.to_json().expect("serialize");
        let parsed = ProjectDocument::from_json(&json).expect("parse");
        assert_eq!(parsed, doc);
        assert_eq!(parsed.elements[1].kind.type_name(), "text");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{
            "id": "p1",
            "source_image_path": "a.jpg",
            "source_dimensions": {"width": 10, "height": 20}
        }"#;
        let parsed = ProjectDocument::from_json(json).expect("parse");
        assert!(parsed.elements.is_empty());
        assert!(parsed.canvas_size.is_none());
        assert_eq!(parsed.created_at, 0);
    }

    #[test]
    fn test_touch_never_goes_backwards() {
        let mut doc = ProjectDocument::new("p", "a.jpg", PixelSize::new(1, 1));
        let created = doc.created_at;
        doc.touch();
        assert!(doc.updated_at >= created);
    }
}
