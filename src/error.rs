use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by [`Detector`](crate::models::Detector) backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("image file not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("inference framework directory not found: {}", .0.display())]
    MissingRuntime(PathBuf),
    #[error("model checkpoint not found, check the path: {}", .0.display())]
    MissingCheckpoint(PathBuf),
    #[error("failed to load model from {}: {source}", path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed to analyse the image, the file may be corrupt ({0})")]
    InferenceFailure(#[from] InferenceError),
    #[error("confidence threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while running a loaded model on one image.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("ort (onnxruntime) error: {0}")]
    Ort(#[from] ort::Error),
    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<usize>),
    #[error("{0}")]
    Backend(BoxError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
