//! Fitting card art inside a pre-sized decorative frame.
//!
//! Unlike the element pipeline, the frame dictates the output size: the art is scaled into the
//! frame's inner window and the frame is laid over it.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::{RgbaImage, imageops::FilterType};

use crate::{
    fonts::FontBook,
    foundation::{
        color::Rgba8,
        error::{CardError, CardResult},
    },
    pipeline::CardFailure,
    render::{
        center_x, composite, load_asset,
        text::{TextDraw, TextRenderer},
    },
    workspace::list_images,
};

const MARGIN_TOP: f64 = 0.12;
const MARGIN_BOTTOM: f64 = 0.12;
const MARGIN_SIDE: f64 = 0.08;
const NAME_SIZE_RATIO: f64 = 0.05;
const NUMBER_SIZE_RATIO: f64 = 0.04;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitMode {
    /// Scale to fit inside the window, leaving transparent bands.
    #[default]
    Fit,
    /// Scale to cover the window and center-crop.
    Fill,
}

/// Inner window of a frame: `(left, top, width, height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InnerWindow {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub margin_bottom: u32,
}

impl InnerWindow {
    pub fn for_frame(frame_w: u32, frame_h: u32) -> Self {
        let top = (f64::from(frame_h) * MARGIN_TOP) as u32;
        let bottom = (f64::from(frame_h) * MARGIN_BOTTOM) as u32;
        let side = (f64::from(frame_w) * MARGIN_SIDE) as u32;
        Self {
            left: side,
            top,
            width: frame_w.saturating_sub(2 * side),
            height: frame_h.saturating_sub(top + bottom),
            margin_bottom: bottom,
        }
    }
}

/// Optional title/number printed on the frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub struct FrameLabels {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

/// Place `art` inside the window of `frame` and lay the frame on top. The result has the
/// frame's dimensions.
pub fn frame_card(art: &RgbaImage, frame: &RgbaImage, fit: FitMode) -> CardResult<RgbaImage> {
    let (fw, fh) = frame.dimensions();
    let window = InnerWindow::for_frame(fw, fh);
    let (aw, ah) = art.dimensions();
    if window.width == 0 || window.height == 0 || aw == 0 || ah == 0 {
        return Err(CardError::render("frame window or card art is empty"));
    }

    let rw = f64::from(window.width) / f64::from(aw);
    let rh = f64::from(window.height) / f64::from(ah);
    let mut canvas = RgbaImage::new(fw, fh);

    match fit {
        FitMode::Fit => {
            let ratio = rw.min(rh);
            let (nw, nh) = scale_dims(aw, ah, ratio)?;
            let resized = image::imageops::resize(art, nw, nh, FilterType::Lanczos3);
            let x = i64::from(window.left) + center_x(window.width, nw);
            let y = i64::from(window.top) + center_x(window.height, nh);
            image::imageops::replace(&mut canvas, &resized, x, y);
        }
        FitMode::Fill => {
            let ratio = rw.max(rh);
            let (nw, nh) = scale_dims(aw, ah, ratio)?;
            let resized = image::imageops::resize(art, nw, nh, FilterType::Lanczos3);
            let cx = nw.saturating_sub(window.width) / 2;
            let cy = nh.saturating_sub(window.height) / 2;
            let cropped = image::imageops::crop_imm(
                &resized,
                cx,
                cy,
                window.width.min(nw),
                window.height.min(nh),
            )
            .to_image();
            image::imageops::replace(
                &mut canvas,
                &cropped,
                i64::from(window.left),
                i64::from(window.top),
            );
        }
    }

    composite::over_in_place(&mut canvas, frame)?;
    Ok(canvas)
}

fn scale_dims(w: u32, h: u32, ratio: f64) -> CardResult<(u32, u32)> {
    let nw = (f64::from(w) * ratio) as u32;
    let nh = (f64::from(h) * ratio) as u32;
    if nw == 0 || nh == 0 {
        return Err(CardError::render("card art scales to an empty image"));
    }
    Ok((nw, nh))
}

/// Print the name centered in the bottom band and the number centered in the top band.
pub fn draw_frame_labels(
    canvas: &mut RgbaImage,
    renderer: &mut TextRenderer,
    labels: &FrameLabels,
    color: Rgba8,
) -> CardResult<()> {
    let (w, h) = canvas.dimensions();
    let window = InnerWindow::for_frame(w, h);
    let name_size = (f64::from(h) * NAME_SIZE_RATIO) as u32;
    let number_size = (f64::from(h) * NUMBER_SIZE_RATIO) as u32;

    let name = match labels.name.as_deref().filter(|s| !s.is_empty()) {
        Some(text) => Some(renderer.shape_sized(text, name_size as f32)?),
        None => None,
    };
    let number = match labels.number.as_deref().filter(|s| !s.is_empty()) {
        Some(text) => Some(renderer.shape_sized(text, number_size as f32)?),
        None => None,
    };

    let mut draws = Vec::new();
    if let Some(shaped) = &name {
        draws.push(TextDraw {
            text: shaped,
            x: center_x(w, shaped.width),
            y: i64::from(h) - i64::from(window.margin_bottom / 2) - i64::from(name_size / 2),
            fill: color,
            stroke: color,
            stroke_width: 0,
        });
    }
    if let Some(shaped) = &number {
        draws.push(TextDraw {
            text: shaped,
            x: center_x(w, shaped.width),
            y: i64::from(window.top / 2) - i64::from(number_size / 2),
            fill: color,
            stroke: color,
            stroke_width: 0,
        });
    }
    if draws.is_empty() {
        return Ok(());
    }
    renderer.draw(canvas, &draws, crate::config::Opacity::OPAQUE)
}

/// Load a `{stem: {"name": .., "number": ..}}` label mapping.
pub fn load_label_mapping(path: &Path) -> CardResult<HashMap<String, FrameLabels>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read label mapping '{}'", path.display()))?;
    serde_json::from_str(&json).map_err(|e| CardError::serde(e.to_string()))
}

/// Settings for framing a whole directory.
#[derive(Clone, Debug)]
pub struct FrameJob {
    pub input_dir: PathBuf,
    pub frame_path: PathBuf,
    pub output_dir: PathBuf,
    pub labels: HashMap<String, FrameLabels>,
    pub font: Option<String>,
    pub fit: FitMode,
    pub color: Rgba8,
}

#[derive(Debug, Default)]
pub struct FrameReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<CardFailure>,
}

impl FrameJob {
    /// Frame every image in `input_dir` into `<stem>_bordered.png` under `output_dir`.
    pub fn run(&self, fonts: &FontBook) -> CardResult<FrameReport> {
        let frame = load_asset(&self.frame_path)?.ok_or_else(|| {
            CardError::validation(format!(
                "frame image '{}' not found",
                self.frame_path.display()
            ))
        })?;
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("create output dir '{}'", self.output_dir.display())
        })?;

        let mut renderer = None;
        if !self.labels.is_empty() {
            let font_name = self.font.as_deref().unwrap_or("sans-serif");
            match fonts.resolve(font_name, 40.0).and_then(TextRenderer::new) {
                Ok(r) => renderer = Some(r),
                Err(err) => tracing::warn!(error = %err, "frame labels disabled"),
            }
        }

        let files = list_images(&self.input_dir)?;
        tracing::info!(count = files.len(), "framing images");

        let mut report = FrameReport::default();
        for filename in files {
            match self.frame_one(&filename, &frame, renderer.as_mut()) {
                Ok(path) => report.written.push(path),
                Err(error) => {
                    tracing::error!(file = %filename, error = %error, "framing failed");
                    report.failures.push(CardFailure { filename, error });
                }
            }
        }
        Ok(report)
    }

    fn frame_one(
        &self,
        filename: &str,
        frame: &RgbaImage,
        renderer: Option<&mut TextRenderer>,
    ) -> CardResult<PathBuf> {
        let input = self.input_dir.join(filename);
        let art = image::open(&input)
            .with_context(|| format!("open card '{}'", input.display()))?
            .to_rgba8();
        let mut framed = frame_card(&art, frame, self.fit)?;

        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(filename);
        if let (Some(labels), Some(renderer)) = (self.labels.get(stem), renderer)
            && let Err(err) = draw_frame_labels(&mut framed, renderer, labels, self.color)
        {
            tracing::warn!(file = %filename, error = %err, "frame labels failed");
        }

        let output = self.output_dir.join(format!("{stem}_bordered.png"));
        image::DynamicImage::ImageRgba8(framed)
            .to_rgb8()
            .save(&output)?;
        tracing::info!(output = %output.display(), "saved framed card");
        Ok(output)
    }
}
