//! 文件操作错误定义

use tachie_core::codec::CodecError;
use tachie_core::layer::{GeometryError, LayerError, StructuralError};
use tachie_core::mesh::MeshError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl From<LayerError> for FileError {
    fn from(err: LayerError) -> Self {
        match err {
            LayerError::Geometry(e) => FileError::Geometry(e),
            LayerError::Mesh(e) => FileError::Mesh(e),
        }
    }
}
