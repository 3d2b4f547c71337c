use std::path::Path;

use image::{imageops, DynamicImage, ImageDecoder, ImageReader};
use ndarray::{s, Array, Array1, Array2, ArrayBase, ArrayView2, ArrayViewD, Dim, Ix3, OwnedRepr};
use ort::{Session, SessionBuilder, SessionOutputs};
use regex::Regex;

use super::Detector;
use crate::error::{BoxError, InferenceError};
use crate::{utils, Detection};

/// A [`YOLOv5`](https://github.com/ultralytics/yolov5) detector exported to ONNX.
pub struct YOLOv5Model {
    model: ort::Session,
    label_map: Vec<(i64, String)>,
}

/// Geometry of the letterbox applied during preprocessing.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    ratio: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    fn fit(width: u32, height: u32) -> (Self, u32, u32) {
        let ratio = f32::min(
            YOLOv5Model::REQUIRED_WIDTH as f32 / width as f32,
            YOLOv5Model::REQUIRED_HEIGHT as f32 / height as f32,
        );
        let new_width = ((width as f32 * ratio).round() as u32).clamp(1, YOLOv5Model::REQUIRED_WIDTH);
        let new_height =
            ((height as f32 * ratio).round() as u32).clamp(1, YOLOv5Model::REQUIRED_HEIGHT);

        let letterbox = Self {
            ratio,
            pad_x: ((YOLOv5Model::REQUIRED_WIDTH - new_width) / 2) as f32,
            pad_y: ((YOLOv5Model::REQUIRED_HEIGHT - new_height) / 2) as f32,
        };

        (letterbox, new_width, new_height)
    }

    /// Map a point from model input space back to the source image.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.ratio, (y - self.pad_y) / self.ratio)
    }
}

/// A scored box that survived the model's own score pre-filter.
#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    class_id: usize,
    score: f32,
    bbox: [f32; 4],
}

impl YOLOv5Model {
    /// Required input image width.
    pub const REQUIRED_WIDTH: u32 = 640;
    /// Required input image height.
    pub const REQUIRED_HEIGHT: u32 = 640;
    /// Score below which raw predictions are discarded before NMS.
    pub const SCORE_THRESHOLD: f32 = 0.25;
    /// IoU above which overlapping boxes of the same class are suppressed.
    pub const NMS_THRESHOLD: f32 = 0.45;
    /// Upper bound on detections returned per image.
    pub const MAX_DETECTIONS: usize = 1000;

    // per-class box offset for class-aware NMS
    const MAX_WH: f32 = 7680.0;

    /// Construct a [`YOLOv5Model`] from a model file.
    ///
    /// Class names are read from the `names` metadata written by the YOLOv5
    /// exporter unless a `label_map` is given.
    pub fn new_from_file(
        file_path: impl AsRef<Path>,
        label_map: Option<&[(i64, &str)]>,
        session_builder: SessionBuilder,
    ) -> Result<Self, ort::Error> {
        let model = session_builder.commit_from_file(file_path)?;

        let label_map = match label_map {
            Some(label_map) => label_map.iter().map(|(i, l)| (*i, l.to_string())).collect(),
            None => read_label_map(&model)?,
        };

        Ok(Self { model, label_map })
    }

    /// Predict [`Detection`]s from the image provided.
    pub fn predict(&self, img: &image::DynamicImage) -> Result<Vec<Detection>, InferenceError> {
        let (input, letterbox) = Self::preprocess(img);

        let input_name = &self.model.inputs[0].name;
        let outputs = self.model.run(ort::inputs![input_name => input]?)?;

        self.postprocess(&outputs, &letterbox, img.width(), img.height())
    }

    fn preprocess(
        img: &image::DynamicImage,
    ) -> (ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>>, Letterbox) {
        let (letterbox, new_width, new_height) = Letterbox::fit(img.width(), img.height());

        let mut padded_img = Array::from_elem(
            (
                1,
                3,
                Self::REQUIRED_HEIGHT as usize,
                Self::REQUIRED_WIDTH as usize,
            ),
            114_f32 / 255.0,
        );

        let resized_img =
            img.resize_exact(new_width, new_height, imageops::FilterType::Triangle);

        let (offset_x, offset_y) = (letterbox.pad_x as usize, letterbox.pad_y as usize);
        for (x, y, pixel) in resized_img.into_rgb8().enumerate_pixels() {
            let x = x as usize + offset_x;
            let y = y as usize + offset_y;
            let [r, g, b] = pixel.0;
            padded_img[[0, 0, y, x]] = r as f32 / 255.0;
            padded_img[[0, 1, y, x]] = g as f32 / 255.0;
            padded_img[[0, 2, y, x]] = b as f32 / 255.0;
        }

        (padded_img, letterbox)
    }

    fn postprocess(
        &self,
        outputs: &SessionOutputs<'_, '_>,
        letterbox: &Letterbox,
        img_width: u32,
        img_height: u32,
    ) -> Result<Vec<Detection>, InferenceError> {
        let output = outputs[0].try_extract_tensor::<f32>()?;

        let candidates = decode_predictions(single_batch(output)?);
        let detections = suppress(candidates)
            .into_iter()
            .map(|candidate| {
                let [x1, y1, x2, y2] = candidate.bbox;
                let (x1, y1) = letterbox.unmap(x1, y1);
                let (x2, y2) = letterbox.unmap(x2, y2);
                let label = label_for(&self.label_map, candidate.class_id as i64);

                let mut detection = Detection::new(x1, y1, x2, y2, &label, candidate.score);
                detection.clip(img_width as f32, img_height as f32);
                detection
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = detections.len(), "decoded detections");

        Ok(detections)
    }
}

impl Detector for YOLOv5Model {
    fn load(checkpoint: &Path) -> Result<Self, BoxError> {
        let session_builder = Session::builder()?;
        Ok(Self::new_from_file(checkpoint, None, session_builder)?)
    }

    fn detect(&self, image_path: &Path) -> Result<Vec<Detection>, InferenceError> {
        let img = open_upright(image_path)?;
        self.predict(&img)
    }
}

/// Decode an image and apply its EXIF orientation.
fn open_upright(image_path: &Path) -> Result<DynamicImage, InferenceError> {
    let mut decoder = ImageReader::open(image_path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(image::ImageError::IoError)?
        .into_decoder()?;
    let orientation = decoder.orientation()?;

    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    Ok(img)
}

fn label_for(label_map: &[(i64, String)], label_id: i64) -> String {
    label_map
        .iter()
        .find(|(l_i, _)| l_i == &label_id)
        .map(|(_, label)| label.clone())
        .unwrap_or_else(|| format!("class{label_id}"))
}

/// Check the raw output is `[1, anchors, 5 + classes]` and drop the batch axis.
fn single_batch(output: ArrayViewD<'_, f32>) -> Result<ArrayView2<'_, f32>, InferenceError> {
    let shape = output.shape().to_vec();

    // [batch, anchors, cx cy w h obj cls...]
    let predictions = output
        .into_dimensionality::<Ix3>()
        .map_err(|_| InferenceError::OutputShape(shape.clone()))?;
    if predictions.shape()[0] != 1 || predictions.shape()[2] < 6 {
        return Err(InferenceError::OutputShape(shape));
    }

    Ok(predictions.slice_move(s![0, .., ..]))
}

fn read_label_map(session: &Session) -> Result<Vec<(i64, String)>, ort::Error> {
    let names = session.metadata()?.custom("names")?;
    let label_map = names.as_deref().map(parse_names).unwrap_or_default();

    if label_map.is_empty() {
        tracing::warn!("checkpoint carries no class names, labels fall back to class ids");
    }

    Ok(label_map)
}

/// Parse the `names` metadata written by the YOLOv5 exporter.
///
/// Accepts the dict form `{0: 'tomato', 1: 'onion'}` and the older list form
/// `['tomato', 'onion']`.
fn parse_names(names: &str) -> Vec<(i64, String)> {
    // UNWRAP SAFETY: both patterns are constant and valid
    let dict = Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).unwrap();
    let list = Regex::new(r#"'([^']*)'|"([^"]*)""#).unwrap();

    let quoted = |caps: &regex::Captures, first: usize| {
        caps.get(first)
            .or_else(|| caps.get(first + 1))
            .map(|m| m.as_str().to_string())
    };

    let label_map: Vec<(i64, String)> = dict
        .captures_iter(names)
        .filter_map(|caps| Some((caps[1].parse().ok()?, quoted(&caps, 2)?)))
        .collect();
    if !label_map.is_empty() {
        return label_map;
    }

    list.captures_iter(names)
        .filter_map(|caps| quoted(&caps, 1))
        .enumerate()
        .map(|(i, label)| (i as i64, label))
        .collect()
}

fn decode_predictions(predictions: ArrayView2<f32>) -> Vec<Candidate> {
    let mut candidates = vec![];

    for row in predictions.outer_iter() {
        let objectness = row[4];
        if objectness <= YOLOv5Model::SCORE_THRESHOLD {
            continue;
        }

        let Some((class_id, class_score)) = row
            .slice(s![5..])
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };

        let score = objectness * class_score;
        if score <= YOLOv5Model::SCORE_THRESHOLD {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        candidates.push(Candidate {
            class_id,
            score,
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        });
    }

    candidates
}

fn suppress(candidates: Vec<Candidate>) -> Vec<Candidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let offset_boxes: Array2<f32> = Array2::from(
        candidates
            .iter()
            .map(|c| {
                let offset = c.class_id as f32 * YOLOv5Model::MAX_WH;
                c.bbox.map(|v| v + offset)
            })
            .collect::<Vec<_>>(),
    );
    let scores = Array1::from_iter(candidates.iter().map(|c| c.score));

    utils::nms(&offset_boxes, &scores, YOLOv5Model::NMS_THRESHOLD)
        .into_iter()
        .take(YOLOv5Model::MAX_DETECTIONS)
        .map(|i| candidates[i].clone())
        .collect()
}
