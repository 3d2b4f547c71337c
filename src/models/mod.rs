//! Implemented detection models.

use std::path::Path;

use crate::error::{BoxError, InferenceError};
use crate::Detection;

mod yolov5;

pub use yolov5::YOLOv5Model;

/// A loaded detection model.
///
/// The handle is created once from a checkpoint on local disk and then only
/// read from; any backend that can produce [`Detection`]s for an image file can
/// stand in for [`YOLOv5Model`].
pub trait Detector: Sized {
    /// Load a checkpoint from a local path.
    fn load(checkpoint: &Path) -> Result<Self, BoxError>;

    /// Run one inference pass over the image at `image_path`.
    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, InferenceError>;
}
