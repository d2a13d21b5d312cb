use thiserror::Error;

/// Errors raised by the geometry core.
///
/// Callers at the UI boundary catch these, log them and degrade the
/// offending feature to empty/zero instead of failing the whole page.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Unsupported geometry type: {kind} (expected Polygon or MultiPolygon)")]
    UnsupportedGeometryKind { kind: String },

    #[error("Malformed geometry: {reason}")]
    MalformedGeometry { reason: String },

    #[error("Invalid JSON input: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid transform parameters: {reason}")]
    InvalidTransform { reason: String },
}

impl GeometryError {
    pub fn unsupported(kind: impl Into<String>) -> Self {
        GeometryError::UnsupportedGeometryKind { kind: kind.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        GeometryError::MalformedGeometry {
            reason: reason.into(),
        }
    }
}

impl From<GeometryError> for wasm_bindgen::JsValue {
    fn from(err: GeometryError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
