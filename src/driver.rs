use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::estimate::estimate_ingredients;
use crate::models::Detector;

/// Estimate the ingredients in `image_path` and write one label per line to `out`.
///
/// Nothing is written unless inference succeeds; an empty ingredient list
/// writes nothing and is not an error.
pub fn run<D: Detector>(config: &Config, image_path: &Path, out: &mut impl Write) -> Result<()> {
    config.validate()?;

    if !image_path.exists() {
        return Err(Error::MissingInput(image_path.to_path_buf()));
    }

    let model: D = config.layout().load(&config.run_name)?;
    let ingredients = estimate_ingredients(&model, image_path, config.confidence_threshold)?;

    for ingredient in &ingredients {
        writeln!(out, "{ingredient}")?;
    }
    out.flush()?;

    Ok(())
}
