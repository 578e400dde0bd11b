//! Errors raised while loading a scene description.

use thiserror::Error;

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Texture error: {0}")]
    Texture(#[from] tessera_renderer::TextureError),

    #[error("Unknown texture type '{kind}' at texture #{index}")]
    UnknownTextureKind { kind: String, index: usize },

    #[error("Texture '{0}' not found")]
    UnknownTexture(String),

    #[error("Texture index {index} out of range ({count} declared)")]
    TextureIndexOutOfRange { index: usize, count: usize },

    #[error("Texture name '{0}' declared twice")]
    DuplicateTextureName(String),

    #[error("Texture {texture} cannot be used as {expected}")]
    TextureKindMismatch { texture: String, expected: &'static str },

    #[error("Unknown material type '{kind}' at material #{index}")]
    UnknownMaterialKind { kind: String, index: usize },

    #[error("Unknown object type '{kind}' at object #{index}")]
    UnknownShapeKind { kind: String, index: usize },

    #[error("Material '{0}' not found")]
    UnknownMaterial(String),

    #[error("Material index {index} out of range ({count} declared before it)")]
    MaterialIndexOutOfRange { index: usize, count: usize },

    #[error("Material name '{0}' declared twice")]
    DuplicateMaterialName(String),

    #[error("Invalid {context}: {detail}")]
    Invalid { context: String, detail: String },
}

impl SceneError {
    pub(crate) fn invalid(context: impl Into<String>, detail: impl ToString) -> Self {
        SceneError::Invalid {
            context: context.into(),
            detail: detail.to_string(),
        }
    }
}

/// Result type for scene loading.
pub type SceneResult<T> = Result<T, SceneError>;
