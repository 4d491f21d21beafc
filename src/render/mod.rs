//! Compositing stages applied to a card canvas.
//!
//! Every stage mutates the canvas in place and reports a [`StageOutcome`]. A stage that
//! returns `Err` leaves the canvas exactly as it found it.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;

use crate::{config::Position, foundation::error::CardResult};

pub mod border;
pub mod composite;
pub mod overlay;
pub mod text;

/// Image element kinds with a backing asset directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Border,
    Nameplate,
    Numeral,
}

impl ElementKind {
    pub const ALL: [Self; 3] = [Self::Border, Self::Nameplate, Self::Numeral];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Border => "border",
            Self::Nameplate => "nameplate",
            Self::Numeral => "numeral",
        }
    }

    /// Overlay width as a fraction of the canvas width. Borders always span the canvas.
    pub fn width_ratio(self) -> f64 {
        match self {
            Self::Border => 1.0,
            Self::Nameplate => 0.7,
            Self::Numeral => 0.2,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Toggled off in `use_custom_elements`.
    Disabled,
    /// The card has no numeral to badge.
    NoNumeral,
    MissingAsset(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Applied,
    Skipped(SkipReason),
}

/// Horizontal origin that centers an item of width `item_w`.
pub fn center_x(canvas_w: u32, item_w: u32) -> i64 {
    (i64::from(canvas_w) - i64::from(item_w)).div_euclid(2)
}

/// Vertical origin of an item of height `item_h` anchored at `position`.
pub fn place_y(position: Position, canvas_h: u32, item_h: u32, offset: i32) -> i64 {
    let (canvas_h, item_h, offset) = (i64::from(canvas_h), i64::from(item_h), i64::from(offset));
    match position {
        Position::Top => offset,
        Position::Bottom => canvas_h - item_h + offset,
        Position::Center => (canvas_h - item_h).div_euclid(2) + offset,
    }
}

/// Load an element asset as RGBA8. `Ok(None)` means the file does not exist.
pub fn load_asset(path: &Path) -> CardResult<Option<RgbaImage>> {
    if !path.is_file() {
        return Ok(None);
    }
    let img = image::open(path).with_context(|| format!("decode asset '{}'", path.display()))?;
    Ok(Some(img.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_x_floors_like_integer_division() {
        assert_eq!(center_x(100, 70), 15);
        assert_eq!(center_x(101, 70), 15);
        assert_eq!(center_x(50, 81), -16);
    }

    #[test]
    fn place_y_follows_anchor_formulas() {
        assert_eq!(place_y(Position::Top, 1000, 100, 50), 50);
        assert_eq!(place_y(Position::Top, 1000, 100, -5), -5);
        assert_eq!(place_y(Position::Bottom, 1000, 100, -50), 850);
        assert_eq!(place_y(Position::Bottom, 1000, 100, 30), 930);
        assert_eq!(place_y(Position::Center, 1000, 101, 0), 449);
        assert_eq!(place_y(Position::Center, 1000, 100, -20), 430);
    }

    #[test]
    fn unknown_position_string_places_like_center() {
        let parsed: Position = serde_json::from_str("\"sideways\"").unwrap();
        assert_eq!(
            place_y(parsed, 640, 40, 7),
            place_y(Position::Center, 640, 40, 7)
        );
    }

    #[test]
    fn width_ratios_are_fixed() {
        assert_eq!(ElementKind::Nameplate.width_ratio(), 0.7);
        assert_eq!(ElementKind::Numeral.width_ratio(), 0.2);
    }

    #[test]
    fn load_asset_reports_missing_as_none() {
        let missing = std::env::temp_dir().join("tarot_compose_definitely_missing.png");
        assert!(load_asset(&missing).unwrap().is_none());
    }

    #[test]
    fn load_asset_fails_on_undecodable_file() {
        let path = std::env::temp_dir().join(format!(
            "tarot_compose_garbage_{}.png",
            std::process::id()
        ));
        std::fs::write(&path, b"not a png").unwrap();
        assert!(load_asset(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
