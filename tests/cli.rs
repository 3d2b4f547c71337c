use std::fs;
use std::process::{Command, Output};

fn estimate(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_estimate"))
        .args(args)
        .env_remove("ESTIMATE_RUN")
        .env_remove("ESTIMATE_ROOT")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn missing_image_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("missing.jpg");

    let output = estimate(&[image.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("image file not found"));
}

#[test]
fn missing_checkpoint_exits_with_one_and_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("yolov5");
    fs::create_dir_all(&root).unwrap();
    let image = dir.path().join("dish.jpg");
    fs::write(&image, b"jpeg").unwrap();

    let output = estimate(&[
        image.to_str().unwrap(),
        "--root",
        root.to_str().unwrap(),
        "--run",
        "nightly",
    ]);

    let expected = root.join("runs/train/nightly/weights/best.onnx");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains(&expected.display().to_string()));
}

#[test]
fn missing_root_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("dish.jpg");
    fs::write(&image, b"jpeg").unwrap();

    let output = estimate(&[
        image.to_str().unwrap(),
        "--root",
        dir.path().join("nowhere").to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn out_of_range_threshold_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("dish.jpg");
    fs::write(&image, b"jpeg").unwrap();

    let output = estimate(&[image.to_str().unwrap(), "--conf", "2.0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
