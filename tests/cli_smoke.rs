use std::path::PathBuf;

use image::{Rgba, RgbaImage};

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

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_tarot-compose")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "tarot-compose.exe"
            } else {
                "tarot-compose"
            });
            p
        })
}

#[test]
fn cli_elements_processes_all_cards() {
    let root = temp_dir("cli_elements");
    let cards = root.join("images").join("cards");
    std::fs::create_dir_all(&cards).unwrap();
    for name in ["the_star.png", "two_of_cups.png"] {
        RgbaImage::from_pixel(40, 60, Rgba([30, 30, 90, 255]))
            .save(cards.join(name))
            .unwrap();
    }

    let root_arg = root.to_string_lossy().to_string();
    let output = std::process::Command::new(exe())
        .args(["--root", root_arg.as_str(), "elements", "--all"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("processed 2 of 2 cards"), "{stdout}");
    assert!(root.join("images/final/the_star.png").is_file());
    assert!(root.join("images/final/two_of_cups.png").is_file());
    // Defaults are written back when no config exists.
    assert!(root.join("config/elements_config.json").is_file());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn cli_elements_fails_on_empty_card_directory() {
    let root = temp_dir("cli_empty");
    std::fs::create_dir_all(&root).unwrap();

    let root_arg = root.to_string_lossy().to_string();
    let status = std::process::Command::new(exe())
        .args(["--root", root_arg.as_str(), "elements"])
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn cli_elements_fails_on_missing_file() {
    let root = temp_dir("cli_missing_file");
    std::fs::create_dir_all(&root).unwrap();

    let root_arg = root.to_string_lossy().to_string();
    let status = std::process::Command::new(exe())
        .args(["--root", root_arg.as_str(), "elements", "--file", "nope.png"])
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn cli_frame_writes_bordered_png() {
    let root = temp_dir("cli_frame");
    let input = root.join("in");
    let output = root.join("out");
    std::fs::create_dir_all(&input).unwrap();

    RgbaImage::from_pixel(30, 30, Rgba([200, 0, 0, 255]))
        .save(input.join("hermit.png"))
        .unwrap();
    let border = root.join("frame.png");
    RgbaImage::new(50, 80).save(&border).unwrap();

    let status = std::process::Command::new(exe())
        .arg("frame")
        .arg("--input-dir")
        .arg(&input)
        .arg("--border")
        .arg(&border)
        .arg("--output-dir")
        .arg(&output)
        .args(["--resize", "fill"])
        .status()
        .unwrap();

    assert!(status.success());
    let framed = image::open(output.join("hermit_bordered.png")).unwrap();
    assert_eq!(framed.color(), image::ColorType::Rgb8);
    assert_eq!((framed.width(), framed.height()), (50, 80));
    std::fs::remove_dir_all(&root).ok();
}
