//! Model loader seam.
//!
//! Parsing model files is the host's job. The engine only checks the file
//! format up front, hands out tickets, and instantiates whatever graph the
//! host eventually reports back.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::ModelNode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    Fbx,
    Gltf,
    Glb,
    Stl,
}

impl ModelFormat {
    /// Format from the file extension (case-insensitive)
    pub fn detect(file_name: &str) -> Result<Self, LoadError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "fbx" => Ok(ModelFormat::Fbx),
            "gltf" => Ok(ModelFormat::Gltf),
            "glb" => Ok(ModelFormat::Glb),
            "stl" => Ok(ModelFormat::Stl),
            _ => Err(LoadError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("could not load {file}: {reason}")]
    Failed { file: String, reason: String },
    #[error("{0} contains no geometry")]
    Empty(String),
}

/// A file handed over by the upload control
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn format(&self) -> Result<ModelFormat, LoadError> {
        ModelFormat::detect(&self.name)
    }
}

/// Turns an uploaded file into a model graph
pub trait ModelLoader {
    fn load(&self, file: &UploadFile) -> Result<ModelNode, LoadError>;
}

/// Handle for an upload whose result has not arrived yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadTicket(pub u64);

/// An upload waiting for its result
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: String,
    pub format: ModelFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_formats() {
        assert_eq!(ModelFormat::detect("robot.fbx"), Ok(ModelFormat::Fbx));
        assert_eq!(ModelFormat::detect("scene.GLTF"), Ok(ModelFormat::Gltf));
        assert_eq!(ModelFormat::detect("a.b.Glb"), Ok(ModelFormat::Glb));
        assert_eq!(ModelFormat::detect("part.stl"), Ok(ModelFormat::Stl));
    }

    #[test]
    fn test_detect_rejects_unknown() {
        for name in ["model.obj", "noext", "archive.glb.zip", ""] {
            assert!(matches!(
                ModelFormat::detect(name),
                Err(LoadError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_error_messages() {
        let e = LoadError::Failed {
            file: "x.fbx".into(),
            reason: "truncated".into(),
        };
        assert_eq!(e.to_string(), "could not load x.fbx: truncated");
        assert_eq!(
            LoadError::UnsupportedFormat("a.obj".into()).to_string(),
            "unsupported file type: a.obj"
        );
    }

    #[test]
    fn test_ticket_serializes_as_number() {
        assert_eq!(serde_json::to_string(&UploadTicket(7)).unwrap(), "7");
    }
}
