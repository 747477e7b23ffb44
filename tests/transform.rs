//! Integration tests for resizing and enhancement.

mod common;

use image::{ColorType, DynamicImage, GenericImageView, Rgb, RgbImage, RgbaImage};

use episnap::transform::{enhance_file, resize_file};
use episnap::{AspectRatio, enhance, resize_to_target};

use common::gradient_frame;

// ── Resize ─────────────────────────────────────────────────────────

#[test]
fn resize_hits_exact_targets() {
    let small = gradient_frame(640, 360);
    assert_eq!(
        resize_to_target(&small, AspectRatio::Widescreen).dimensions(),
        (1920, 1080)
    );

    let square = gradient_frame(1000, 1000);
    assert_eq!(
        resize_to_target(&square, AspectRatio::Standard).dimensions(),
        (1440, 1080)
    );
}

#[test]
fn resize_keeps_matching_frames() {
    let frame = gradient_frame(1440, 1080);
    let resized = resize_to_target(&frame, AspectRatio::Standard);
    assert_eq!(resized.as_bytes(), frame.as_bytes());
}

#[test]
fn resize_file_in_place() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("frame.png");
    gradient_frame(320, 240).save(&path).expect("Failed to write frame");

    resize_file(&path, AspectRatio::Widescreen).expect("Failed to resize file");
    assert_eq!(image::open(&path).unwrap().dimensions(), (1920, 1080));
}

// ── Enhance ────────────────────────────────────────────────────────

#[test]
fn enhance_compounds() {
    let frame = gradient_frame(64, 48);
    let once = enhance(&frame);
    let twice = enhance(&once);
    assert_ne!(once.as_bytes(), frame.as_bytes());
    assert_ne!(twice.as_bytes(), once.as_bytes());
}

#[test]
fn enhance_keeps_size_and_drops_alpha() {
    let frame = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        33,
        17,
        image::Rgba([10, 120, 200, 128]),
    ));
    let enhanced = enhance(&frame);
    assert_eq!(enhanced.dimensions(), (33, 17));
    assert_eq!(enhanced.color(), ColorType::Rgb8);
}

#[test]
fn enhance_brightens_flat_gray() {
    // Contrast and color leave a flat gray frame alone; brightness lifts it.
    let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([100, 100, 100])));
    let enhanced = enhance(&frame).to_rgb8();
    let pixel = enhanced.get_pixel(4, 4).0;
    assert!(pixel.iter().all(|&channel| channel > 100), "{pixel:?}");
}

#[test]
fn enhance_file_rejects_garbage() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("frame.png");
    std::fs::write(&path, b"definitely not a png").unwrap();
    assert!(enhance_file(&path).is_err());
}
