use std::fs;
use std::path::{Path, PathBuf};

use ingredient_estimate::{
    models::Detector, run, BoxError, CheckpointLayout, Config, Detection, Error, InferenceError,
};
use tempfile::TempDir;

/// A detector whose "checkpoint" is a text file of `label confidence` lines.
///
/// Images whose content starts with `corrupt` fail to decode.
struct CannedDetector {
    detections: Vec<Detection>,
}

impl Detector for CannedDetector {
    fn load(checkpoint: &Path) -> Result<Self, BoxError> {
        let mut detections = vec![];
        for line in fs::read_to_string(checkpoint)?.lines() {
            let (label, confidence) = line
                .rsplit_once(' ')
                .ok_or_else(|| format!("malformed checkpoint line: {line:?}"))?;
            detections.push(Detection::new(0.0, 0.0, 10.0, 10.0, label, confidence.parse()?));
        }
        Ok(Self { detections })
    }

    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, InferenceError> {
        let bytes = fs::read(image_path).map_err(|e| InferenceError::Backend(e.into()))?;
        if bytes.starts_with(b"corrupt") {
            return Err(InferenceError::Backend("unsupported image format".into()));
        }
        Ok(self.detections.clone())
    }
}

struct Workspace {
    dir: TempDir,
    config: Config,
}

impl Workspace {
    fn new(checkpoint: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            root: dir.path().join("yolov5"),
            ..Config::default()
        };
        fs::create_dir_all(&config.root).unwrap();

        if let Some(content) = checkpoint {
            let path = config.layout().checkpoint_path(&config.run_name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        Self { dir, config }
    }

    fn image(&self, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join("dish.jpg");
        fs::write(&path, content).unwrap();
        path
    }

    fn run(&self, image_path: &Path) -> (Result<(), Error>, String) {
        let mut out = vec![];
        let result = run::<CannedDetector>(&self.config, image_path, &mut out);
        (result, String::from_utf8(out).unwrap())
    }
}

#[test]
fn prints_labels_above_threshold() {
    let ws = Workspace::new(Some("tomato 0.9\nonion 0.3"));
    let image = ws.image(b"jpeg");

    let (result, stdout) = ws.run(&image);
    assert!(result.is_ok());
    assert_eq!(stdout, "tomato\n");
}

#[test]
fn repeated_labels_print_once() {
    let ws = Workspace::new(Some("tomato 0.9\nonion 0.8\ntomato 0.7\nbell pepper 0.6"));
    let image = ws.image(b"jpeg");

    let (result, stdout) = ws.run(&image);
    assert!(result.is_ok());
    assert_eq!(stdout, "tomato\nonion\nbell pepper\n");
}

#[test]
fn no_detections_prints_nothing() {
    let ws = Workspace::new(Some("onion 0.3"));
    let image = ws.image(b"jpeg");

    let (result, stdout) = ws.run(&image);
    assert!(result.is_ok());
    assert!(stdout.is_empty());
}

#[test]
fn missing_image_fails_before_loading() {
    let ws = Workspace::new(None);
    let image = ws.dir.path().join("missing.jpg");

    let (result, stdout) = ws.run(&image);
    assert!(matches!(result, Err(Error::MissingInput(p)) if p == image));
    assert!(stdout.is_empty());
}

#[test]
fn missing_root_is_reported() {
    let ws = Workspace::new(None);
    let image = ws.image(b"jpeg");
    let config = Config {
        root: ws.dir.path().join("nowhere"),
        ..ws.config.clone()
    };

    let mut out = vec![];
    let result = run::<CannedDetector>(&config, &image, &mut out);
    assert!(matches!(result, Err(Error::MissingRuntime(_))));
    assert!(out.is_empty());
}

#[test]
fn missing_checkpoint_names_expected_path() {
    let ws = Workspace::new(None);
    let image = ws.image(b"jpeg");
    let expected = CheckpointLayout::new(&ws.config.root).checkpoint_path(&ws.config.run_name);

    let (result, stdout) = ws.run(&image);
    let err = result.unwrap_err();
    assert!(err.to_string().contains(&expected.display().to_string()));
    assert!(matches!(err, Error::MissingCheckpoint(_)));
    assert!(stdout.is_empty());
}

#[test]
fn unloadable_checkpoint_is_a_load_failure() {
    let ws = Workspace::new(Some("not-a-checkpoint"));
    let image = ws.image(b"jpeg");

    let (result, stdout) = ws.run(&image);
    let err = result.unwrap_err();
    assert!(matches!(err, Error::LoadFailure { .. }));
    assert!(err.to_string().contains("malformed checkpoint line"));
    assert!(stdout.is_empty());
}

#[test]
fn inference_failure_prints_no_labels() {
    let ws = Workspace::new(Some("tomato 0.9"));
    let image = ws.image(b"corrupt bytes");

    let (result, stdout) = ws.run(&image);
    let err = result.unwrap_err();
    assert!(matches!(err, Error::InferenceFailure(_)));
    assert!(err.to_string().contains("unsupported image format"));
    assert!(stdout.is_empty());
}

#[test]
fn invalid_threshold_is_rejected() {
    let ws = Workspace::new(Some("tomato 0.9"));
    let image = ws.image(b"jpeg");
    let config = Config {
        confidence_threshold: 1.5,
        ..ws.config.clone()
    };

    let mut out = vec![];
    let result = run::<CannedDetector>(&config, &image, &mut out);
    assert!(matches!(result, Err(Error::InvalidThreshold(_))));
}
