//! Locating trained checkpoints by run name.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::models::Detector;

/// On-disk layout of training output: `<root>/runs/train/<run>/weights/best.onnx`.
#[derive(Debug, Clone)]
pub struct CheckpointLayout {
    root: PathBuf,
}

impl CheckpointLayout {
    pub const RUNS_DIR: &'static str = "runs/train";
    pub const WEIGHTS_DIR: &'static str = "weights";
    pub const CHECKPOINT_FILE: &'static str = "best.onnx";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The expected checkpoint path for `run_name`, whether or not it exists.
    pub fn checkpoint_path(&self, run_name: &str) -> PathBuf {
        self.root
            .join(Self::RUNS_DIR)
            .join(run_name)
            .join(Self::WEIGHTS_DIR)
            .join(Self::CHECKPOINT_FILE)
    }

    /// Resolve the checkpoint for `run_name`, failing if the root directory or
    /// the checkpoint file is missing.
    pub fn resolve(&self, run_name: &str) -> Result<PathBuf> {
        if !self.root.is_dir() {
            return Err(Error::MissingRuntime(self.root().to_path_buf()));
        }

        let path = self.checkpoint_path(run_name);
        if !path.is_file() {
            return Err(Error::MissingCheckpoint(path));
        }

        Ok(path)
    }

    /// Resolve and load the checkpoint for `run_name`.
    pub fn load<D: Detector>(&self, run_name: &str) -> Result<D> {
        let path = self.resolve(run_name)?;
        tracing::debug!(path = %path.display(), "loading checkpoint");

        let started = Instant::now();
        match D::load(&path) {
            Ok(model) => {
                tracing::debug!(elapsed = ?started.elapsed(), "checkpoint loaded");
                Ok(model)
            }
            Err(source) => Err(Error::LoadFailure { path, source }),
        }
    }
}
