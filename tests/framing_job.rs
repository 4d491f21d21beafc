use std::{collections::HashMap, path::PathBuf};

use image::{Rgba, RgbaImage};
use tarot_compose::{FitMode, FontBook, FrameJob, FrameLabels, Rgba8};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tarot_compose_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn job(root: &std::path::Path, labels: HashMap<String, FrameLabels>) -> FrameJob {
    FrameJob {
        input_dir: root.join("cards"),
        frame_path: root.join("frame.png"),
        output_dir: root.join("framed"),
        labels,
        font: None,
        fit: FitMode::Fit,
        color: Rgba8::GOLD,
    }
}

fn seed(root: &std::path::Path) {
    let cards = root.join("cards");
    std::fs::create_dir_all(&cards).unwrap();
    RgbaImage::from_pixel(20, 40, Rgba([0, 0, 200, 255]))
        .save(cards.join("the_tower.png"))
        .unwrap();
    image::RgbImage::from_pixel(40, 20, image::Rgb([0, 200, 0]))
        .save(cards.join("wheel.jpg"))
        .unwrap();
    std::fs::write(cards.join("notes.txt"), b"ignored").unwrap();

    // Opaque 4px gold rim, transparent inside.
    let mut frame = RgbaImage::new(100, 200);
    for (x, y, px) in frame.enumerate_pixels_mut() {
        if x < 4 || y < 4 || x >= 96 || y >= 196 {
            *px = Rgba([255, 215, 0, 255]);
        }
    }
    frame.save(root.join("frame.png")).unwrap();
}

#[test]
fn frames_every_image_in_directory() {
    let root = temp_dir("framing_dir");
    seed(&root);

    let report = job(&root, HashMap::new()).run(&FontBook::empty()).unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(
        report.written,
        vec![
            root.join("framed").join("the_tower_bordered.png"),
            root.join("framed").join("wheel_bordered.png"),
        ]
    );

    let tower = image::open(&report.written[0]).unwrap();
    assert_eq!(tower.color(), image::ColorType::Rgb8);
    let tower = tower.to_rgb8();
    assert_eq!(tower.dimensions(), (100, 200));
    assert_eq!(tower.get_pixel(0, 0).0, [255, 215, 0]);
    // Art fills the middle of the window.
    let mid = tower.get_pixel(50, 100).0;
    assert!(mid[2] > 150 && mid[0] < 50, "{mid:?}");

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn labels_render_with_bundled_face() {
    let root = temp_dir("framing_labels");
    seed(&root);

    let mut labels = HashMap::new();
    labels.insert(
        "the_tower".to_owned(),
        FrameLabels {
            name: Some("The Tower".to_owned()),
            number: Some("XVI".to_owned()),
        },
    );
    let report = job(&root, labels).run(&FontBook::empty()).unwrap();
    assert_eq!(report.written.len(), 2);
    assert!(report.failures.is_empty());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn missing_frame_is_fatal() {
    let root = temp_dir("framing_no_frame");
    std::fs::create_dir_all(root.join("cards")).unwrap();
    assert!(job(&root, HashMap::new()).run(&FontBook::empty()).is_err());
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn unreadable_art_is_reported_per_file() {
    let root = temp_dir("framing_broken");
    seed(&root);
    std::fs::write(root.join("cards").join("broken.png"), b"nope").unwrap();

    let report = job(&root, HashMap::new()).run(&FontBook::empty()).unwrap();
    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].filename, "broken.png");
    std::fs::remove_dir_all(&root).ok();
}
