//! Typed element configuration, persisted as a flat JSON file.

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::{
    color::Rgba8,
    error::{CardError, CardResult},
};

/// Vertical anchor of an element on the card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    Top,
    #[default]
    Center,
    Bottom,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }

    /// Strict parse used by interactive input; unknown values are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s).unwrap_or_else(|| {
            tracing::warn!(position = %s, "unknown position, using center");
            Self::Center
        }))
    }
}

/// Element opacity, always within `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Opacity(f32);

impl Opacity {
    pub const OPAQUE: Self = Self(1.0);

    /// Clamp into `[0, 1]`; NaN becomes fully opaque.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self::OPAQUE
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Strict constructor used by interactive input.
    pub fn try_new(value: f32) -> Option<Self> {
        (0.0..=1.0).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    pub fn is_opaque(self) -> bool {
        self.0 >= 1.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl<'de> Deserialize<'de> for Opacity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        let clamped = Self::new(raw as f32);
        if !(0.0..=1.0).contains(&raw) {
            tracing::warn!(opacity = raw, clamped = clamped.0, "opacity out of range");
        }
        Ok(clamped)
    }
}

/// One image element (border, nameplate or numeral badge).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageElementConfig {
    /// Asset file name inside the element's directory.
    pub file: String,
    pub position: Position,
    #[serde(alias = "offset")]
    pub offset_y: i32,
    pub opacity: Opacity,
}

impl Default for ImageElementConfig {
    fn default() -> Self {
        Self {
            file: String::new(),
            position: Position::Center,
            offset_y: 0,
            opacity: Opacity::OPAQUE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Font family name or path to a font file.
    pub font: String,
    pub size: u32,
    pub color: Rgba8,
    pub stroke_width: u32,
    pub stroke_color: Rgba8,
    pub position: Position,
    #[serde(alias = "offset")]
    pub offset_y: i32,
    pub opacity: Opacity,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: "Arial".to_owned(),
            size: 60,
            color: Rgba8::WHITE,
            stroke_width: 2,
            stroke_color: Rgba8::BLACK,
            position: Position::Bottom,
            offset_y: -50,
            opacity: Opacity::OPAQUE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementToggles {
    pub border: bool,
    pub nameplate: bool,
    pub numeral: bool,
    pub text: bool,
}

impl Default for ElementToggles {
    fn default() -> Self {
        Self {
            border: true,
            nameplate: true,
            numeral: true,
            text: true,
        }
    }
}

/// Full configuration of the compositing pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementConfig {
    pub border: ImageElementConfig,
    pub nameplate: ImageElementConfig,
    pub numeral: ImageElementConfig,
    pub text: TextConfig,
    pub use_custom_elements: ElementToggles,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            border: ImageElementConfig {
                file: "default_border.png".to_owned(),
                position: Position::Center,
                offset_y: 0,
                opacity: Opacity::new(0.9),
            },
            nameplate: ImageElementConfig {
                file: "default_nameplate.png".to_owned(),
                position: Position::Bottom,
                offset_y: -50,
                opacity: Opacity::new(0.9),
            },
            numeral: ImageElementConfig {
                file: "default_numeral.png".to_owned(),
                position: Position::Top,
                offset_y: 50,
                opacity: Opacity::new(0.9),
            },
            text: TextConfig::default(),
            use_custom_elements: ElementToggles::default(),
        }
    }
}

impl ElementConfig {
    pub fn from_json(json: &str) -> CardResult<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| CardError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> CardResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CardError::serde(e.to_string()))
    }

    pub fn validate(&self) -> CardResult<()> {
        if self.text.size == 0 {
            return Err(CardError::validation("text size must be > 0"));
        }
        for (kind, el) in [
            ("border", &self.border),
            ("nameplate", &self.nameplate),
            ("numeral", &self.numeral),
        ] {
            if el.file.contains(['/', '\\']) {
                return Err(CardError::validation(format!(
                    "{kind} file must be a bare file name, got '{}'",
                    el.file
                )));
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> CardResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Load the config file, substituting (and persisting) the defaults when it is missing or
    /// malformed.
    pub fn load_or_default(path: &Path) -> CardResult<Self> {
        if path.exists() {
            match Self::load(path) {
                Ok(cfg) => return Ok(cfg),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "malformed element config, restoring defaults"
                    );
                }
            }
        } else {
            tracing::info!(path = %path.display(), "no element config, writing defaults");
        }

        let cfg = Self::default();
        cfg.save(path)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> CardResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config dir '{}'", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("write config '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "tarot_compose_{name}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ElementConfig::default();
        assert_eq!(cfg.border.opacity.get(), 0.9);
        assert_eq!(cfg.nameplate.position, Position::Bottom);
        assert_eq!(cfg.nameplate.offset_y, -50);
        assert_eq!(cfg.numeral.position, Position::Top);
        assert_eq!(cfg.numeral.offset_y, 50);
        assert_eq!(cfg.text.size, 60);
        assert_eq!(cfg.text.stroke_width, 2);
        assert!(cfg.use_custom_elements.border && cfg.use_custom_elements.text);
    }

    #[test]
    fn parses_full_config_with_partial_elements() {
        let json = r##"{
            "border": {"file": "gold.png", "opacity": 0.75},
            "nameplate": {"file": "plate.png", "position": "bottom", "offset_y": -40, "opacity": 1.0},
            "numeral": {"file": "badge.png", "position": "top", "offset_y": 30, "opacity": 0.5},
            "text": {"font": "DejaVu Sans", "size": 48, "color": "#FFD700",
                     "stroke_width": 3, "stroke_color": "#000000",
                     "position": "top", "offset_y": 12},
            "use_custom_elements": {"border": true, "nameplate": false, "numeral": true, "text": true}
        }"##;
        let cfg = ElementConfig::from_json(json).unwrap();
        assert_eq!(cfg.border.file, "gold.png");
        assert_eq!(cfg.border.position, Position::Center);
        assert_eq!(cfg.nameplate.offset_y, -40);
        assert!(!cfg.use_custom_elements.nameplate);
        assert_eq!(cfg.text.color, Rgba8::GOLD);
        assert_eq!(cfg.text.position, Position::Top);
        assert_eq!(cfg.text.opacity, Opacity::OPAQUE);
    }

    #[test]
    fn unknown_position_falls_back_to_center() {
        let json = r#"{"nameplate": {"position": "middle-ish"}}"#;
        let cfg = ElementConfig::from_json(json).unwrap();
        assert_eq!(cfg.nameplate.position, Position::Center);
    }

    #[test]
    fn opacity_is_clamped_at_load() {
        let json = r#"{"border": {"opacity": 1.7}, "numeral": {"opacity": -0.2}}"#;
        let cfg = ElementConfig::from_json(json).unwrap();
        assert_eq!(cfg.border.opacity.get(), 1.0);
        assert_eq!(cfg.numeral.opacity.get(), 0.0);
        assert_eq!(Opacity::try_new(1.5), None);
        assert_eq!(Opacity::new(f32::NAN), Opacity::OPAQUE);
    }

    #[test]
    fn offset_alias_is_accepted() {
        let json = r#"{"numeral": {"offset": 17}}"#;
        let cfg = ElementConfig::from_json(json).unwrap();
        assert_eq!(cfg.numeral.offset_y, 17);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(ElementConfig::from_json(r#"{"text": {"size": 0}}"#).is_err());
        assert!(ElementConfig::from_json(r##"{"text": {"color": "#12"}}"##).is_err());
        assert!(ElementConfig::from_json(r#"{"border": {"file": "../x.png"}}"#).is_err());
        assert!(ElementConfig::from_json("{not json").is_err());
    }

    #[test]
    fn load_or_default_creates_and_persists_defaults() {
        let dir = temp_dir("config_missing");
        let path = dir.join("config").join("elements_config.json");

        let cfg = ElementConfig::load_or_default(&path).unwrap();
        assert_eq!(cfg, ElementConfig::default());
        assert!(path.exists());

        let reloaded = ElementConfig::load(&path).unwrap();
        assert_eq!(reloaded, cfg);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_or_default_replaces_malformed_file() {
        let dir = temp_dir("config_malformed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("elements_config.json");
        std::fs::write(&path, "{ \"border\": ").unwrap();

        let cfg = ElementConfig::load_or_default(&path).unwrap();
        assert_eq!(cfg, ElementConfig::default());
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("default_border.png"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_then_load_keeps_edits() {
        let dir = temp_dir("config_roundtrip");
        let path = dir.join("cfg.json");
        let mut cfg = ElementConfig::default();
        cfg.text.font = "Georgia".to_owned();
        cfg.numeral.position = Position::Center;
        cfg.use_custom_elements.border = false;
        cfg.save(&path).unwrap();

        assert_eq!(ElementConfig::load(&path).unwrap(), cfg);
        std::fs::remove_dir_all(&dir).ok();
    }
}
