use std::path::PathBuf;

use crate::checkpoint::CheckpointLayout;
use crate::error::{Error, Result};

/// Settings for one `estimate` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Training output root holding `runs/train/<run>`.
    pub root: PathBuf,
    /// Training run whose best checkpoint is loaded.
    pub run_name: String,
    /// Detections must score strictly above this to be reported.
    pub confidence_threshold: f32,
}

impl Config {
    pub const DEFAULT_ROOT: &'static str = "yolov5";
    pub const DEFAULT_RUN_NAME: &'static str = "direct_test_run";
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.4;

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::InvalidThreshold(self.confidence_threshold));
        }
        Ok(())
    }

    pub fn layout(&self) -> CheckpointLayout {
        CheckpointLayout::new(&self.root)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(Self::DEFAULT_ROOT),
            run_name: Self::DEFAULT_RUN_NAME.to_string(),
            confidence_threshold: Self::DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}
