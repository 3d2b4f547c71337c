use std::path::Path;

use itertools::Itertools;

use crate::error::Result;
use crate::models::Detector;
use crate::Detection;

/// Labels of detections scoring strictly above `threshold`, each reported once
/// in order of first appearance.
pub fn filter_labels(detections: &[Detection], threshold: f32) -> Vec<String> {
    detections
        .iter()
        .filter(|d| d.confidence > threshold)
        .map(|d| d.label.clone())
        .unique()
        .collect()
}

/// Run `model` on the image at `image_path` and return the ingredient list.
///
/// An empty list is a successful result; only inference errors fail.
pub fn estimate_ingredients<D: Detector>(
    model: &D,
    image_path: &Path,
    threshold: f32,
) -> Result<Vec<String>> {
    let detections = model.detect(image_path)?;
    tracing::debug!(
        image = %image_path.display(),
        detections = detections.len(),
        threshold,
        "inference finished"
    );

    Ok(filter_labels(&detections, threshold))
}
