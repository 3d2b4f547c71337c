use ndarray::prelude::*;
use ndarray::Data;

use std::cmp::Ordering;

// argsort_by function from: https://github.com/rust-ndarray/ndarray/issues/1145
pub fn argsort_by<S, F>(arr: &ArrayBase<S, Ix1>, mut compare: F) -> Vec<usize>
where
    S: Data,
    F: FnMut(&S::Elem, &S::Elem) -> Ordering,
{
    let mut indices: Vec<usize> = (0..arr.len()).collect();
    indices.sort_by(move |&i, &j| compare(&arr[i], &arr[j]));
    indices
}

/// Greedy non-maximum suppression over xyxy `boxes`.
///
/// Returns the indices of kept boxes, highest score first.
pub(crate) fn nms(boxes: &Array2<f32>, scores: &Array1<f32>, iou_thr: f32) -> Vec<usize> {
    let x1 = boxes.slice(s![.., 0]);
    let y1 = boxes.slice(s![.., 1]);
    let x2 = boxes.slice(s![.., 2]);
    let y2 = boxes.slice(s![.., 3]);

    let areas = (&x2 - &x1) * (&y2 - &y1);
    let mut order = {
        let mut o = argsort_by(scores, |a, b| a.total_cmp(b));
        o.reverse();
        o
    };

    let mut keep = vec![];

    while let Some((&i, rest)) = order.split_first() {
        keep.push(i);

        order = rest
            .iter()
            .copied()
            .filter(|&j| {
                let w = f32::max(0.0, f32::min(x2[i], x2[j]) - f32::max(x1[i], x1[j]));
                let h = f32::max(0.0, f32::min(y2[i], y2[j]) - f32::max(y1[i], y1[j]));
                let inter = w * h;
                let union = areas[i] + areas[j] - inter;
                union <= 0.0 || inter / union <= iou_thr
            })
            .collect();
    }

    keep
}
