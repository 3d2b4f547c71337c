use geo_types::{coord, Rect};

/// One raw model output: a box in source-image pixels, a score and a class label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detection {
    pub bbox: Rect<f32>,
    pub confidence: f32,
    pub label: String,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, label: &str, confidence: f32) -> Self {
        let bbox = Rect::new(coord! { x: x1, y: y1 }, coord! { x: x2, y: y2 });

        Self {
            bbox,
            confidence,
            label: label.to_string(),
        }
    }

    /// Clamp the box to an image of the given size.
    pub fn clip(&mut self, width: f32, height: f32) {
        let min = self.bbox.min();
        let max = self.bbox.max();
        self.bbox = Rect::new(
            coord! { x: min.x.clamp(0.0, width), y: min.y.clamp(0.0, height) },
            coord! { x: max.x.clamp(0.0, width), y: max.y.clamp(0.0, height) },
        );
    }
}
