//! # Overview
//!
//! Estimates which ingredients appear in a photo. A YOLOv5 checkpoint trained
//! on ingredient classes is loaded from a local training run (in ONNX format,
//! run through onnxruntime via [ort](https://github.com/pykeio/ort)), the image
//! is passed through it once, and the distinct labels scoring above a
//! confidence threshold are returned.

mod checkpoint;
mod config;
mod detection;
mod driver;
mod error;
mod estimate;
mod utils;

pub use error::{BoxError, Error, InferenceError, Result};

// re-exports
pub use geo_types;
pub use image;
pub use ort;

pub mod models;

pub use checkpoint::CheckpointLayout;
pub use config::Config;
pub use detection::Detection;
pub use driver::run;
pub use estimate::{estimate_ingredients, filter_labels};
