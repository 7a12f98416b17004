//! Integration tests for image loading and result persistence.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use idgen_adapters::{FileResultOutput, FsImageLoader};
use idgen_core::{GenerationResult, ImageLoader, ResultOutput};
use idgen_test_support::SyntheticImageBuilder;
use image::GenericImageView;

fn loader() -> FsImageLoader {
    FsImageLoader::new(Duration::from_secs(5)).expect("client should build")
}

fn result(width: u32, height: u32) -> GenerationResult {
    GenerationResult {
        image: SyntheticImageBuilder::portrait(width, height),
        nsfw: false,
        seed: 7,
        width,
        height,
    }
}

#[test]
fn test_load_png_as_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.png");
    SyntheticImageBuilder::checkerboard(24, 16, 4)
        .to_luma8()
        .save(&path)
        .unwrap();

    let image = loader().load(path.to_str().unwrap()).unwrap();
    assert_eq!(image.dimensions(), (24, 16));
    assert!(image.as_rgb8().is_some());
}

#[test]
fn test_load_missing_file_names_path() {
    let err = loader().load("/nonexistent/face.jpg").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/face.jpg"));
}

#[test]
fn test_persist_writes_jpeg_and_creates_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/nested/result.jpg");
    let output = FileResultOutput::new(&path);

    let written = output.persist(&result(64, 48)).unwrap();
    assert_eq!(written, path);

    let reloaded = image::open(&path).unwrap();
    assert_eq!(reloaded.dimensions(), (64, 48));
    assert_eq!(
        image::ImageFormat::from_path(&path).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[test]
fn test_persist_overwrites_previous_result() {
    let dir = tempfile::tempdir().unwrap();
    let output = FileResultOutput::new(dir.path().join("result.jpg"));

    output.persist(&result(64, 48)).unwrap();
    output.persist(&result(32, 32)).unwrap();

    let reloaded = image::open(output.path()).unwrap();
    assert_eq!(reloaded.dimensions(), (32, 32));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
