use image::RgbaImage;

use crate::{
    config::{Opacity, TextConfig},
    fonts::ResolvedFont,
    foundation::{
        color::Rgba8,
        error::{CardError, CardResult},
    },
    render::{StageOutcome, center_x, composite, place_y},
};

/// Vertical gap between the numeral line and the title below it.
pub const NUMERAL_GAP_PX: i64 = 20;

/// Integer offsets stamped to outline a glyph: every `(dx, dy)` in `[-w, w]^2` inside the
/// disk of radius `w`. Empty for `w == 0`.
pub fn stroke_offsets(width: u32) -> Vec<(i32, i32)> {
    if width == 0 {
        return Vec::new();
    }
    let w = width as i32;
    let mut out = Vec::new();
    for dx in -w..=w {
        for dy in -w..=w {
            if dx * dx + dy * dy <= w * w {
                out.push((dx, dy));
            }
        }
    }
    out
}

/// A shaped line of text, ready to be stamped anywhere on a canvas.
pub struct ShapedText {
    pub width: u32,
    pub height: u32,
    runs: Vec<(f32, Vec<vello_cpu::Glyph>)>,
}

impl std::fmt::Debug for ShapedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapedText")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("runs", &self.runs.len())
            .finish()
    }
}

/// One placement of shaped text with its colors.
#[derive(Clone, Copy, Debug)]
pub struct TextDraw<'a> {
    pub text: &'a ShapedText,
    pub x: i64,
    pub y: i64,
    pub fill: Rgba8,
    pub stroke: Rgba8,
    pub stroke_width: u32,
}

/// Shapes text with Parley and rasterizes glyph runs with `vello_cpu`.
pub struct TextRenderer {
    font: ResolvedFont,
    family: String,
    cpu_font: vello_cpu::peniko::FontData,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("family", &self.family)
            .field("size_px", &self.font.size_px)
            .field("fallback", &self.font.fallback)
            .finish()
    }
}

impl TextRenderer {
    pub fn new(font: ResolvedFont) -> CardResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.data.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CardError::font("no font families registered from font bytes"))?;
        let registered = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::font("registered font family has no name"))?
            .to_string();
        let mut family = registered;
        for (id, _) in &families {
            if let Some(name) = font_ctx.collection.family_name(*id)
                && name.eq_ignore_ascii_case(&font.family)
            {
                family = name.to_owned();
                break;
            }
        }

        let cpu_font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.data.to_vec()),
            font.index,
        );

        Ok(Self {
            font,
            family,
            cpu_font,
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
        })
    }

    pub fn font(&self) -> &ResolvedFont {
        &self.font
    }

    /// Shape `text` at the resolved font's size.
    pub fn shape(&mut self, text: &str) -> CardResult<ShapedText> {
        self.shape_sized(text, self.font.size_px)
    }

    pub fn shape_sized(&mut self, text: &str, size_px: f32) -> CardResult<ShapedText> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::validation("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        let mut runs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run
                    .positioned_glyphs()
                    .map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                    .collect();
                runs.push((run.run().font_size(), glyphs));
            }
        }

        Ok(ShapedText {
            width: layout.width().ceil().max(0.0) as u32,
            height: layout.height().ceil().max(0.0) as u32,
            runs,
        })
    }

    /// Rasterize `draws` into a transparent canvas-sized layer and composite it onto `canvas`.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        draws: &[TextDraw<'_>],
        opacity: Opacity,
    ) -> CardResult<()> {
        let (w, h) = canvas.dimensions();
        let w16: u16 = w
            .try_into()
            .map_err(|_| CardError::render("canvas width exceeds u16 for text rendering"))?;
        let h16: u16 = h
            .try_into()
            .map_err(|_| CardError::render("canvas height exceeds u16 for text rendering"))?;

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        for draw in draws {
            let mut stamps: Vec<((i32, i32), Rgba8)> = stroke_offsets(draw.stroke_width)
                .into_iter()
                .map(|off| (off, draw.stroke))
                .collect();
            stamps.push(((0, 0), draw.fill));

            for ((dx, dy), color) in stamps {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    color.r, color.g, color.b, color.a,
                ));
                ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                    (draw.x + i64::from(dx)) as f64,
                    (draw.y + i64::from(dy)) as f64,
                )));
                for (font_size, glyphs) in &draw.text.runs {
                    ctx.glyph_run(&self.cpu_font)
                        .font_size(*font_size)
                        .fill_glyphs(glyphs.iter().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        }));
                }
            }
        }
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);

        let mut layer = composite::unpremultiply(w, h, pixmap.data_as_u8_slice())?;
        composite::scale_alpha(&mut layer, opacity);
        composite::over_in_place(canvas, &layer)
    }

    /// Draw the stroked title, and the numeral one line above it when present.
    pub fn draw_card_text(
        &mut self,
        canvas: &mut RgbaImage,
        name: &str,
        numeral: &str,
        cfg: &TextConfig,
    ) -> CardResult<StageOutcome> {
        let title = self.shape(name)?;
        let title_x = center_x(canvas.width(), title.width);
        let title_y = place_y(cfg.position, canvas.height(), title.height, cfg.offset_y);

        let numeral_shaped = if numeral.is_empty() {
            None
        } else {
            Some(self.shape(numeral)?)
        };

        let mut draws = vec![TextDraw {
            text: &title,
            x: title_x,
            y: title_y,
            fill: cfg.color,
            stroke: cfg.stroke_color,
            stroke_width: cfg.stroke_width,
        }];
        if let Some(shaped) = &numeral_shaped {
            draws.push(TextDraw {
                text: shaped,
                x: center_x(canvas.width(), shaped.width),
                y: title_y - i64::from(shaped.height) - NUMERAL_GAP_PX,
                fill: cfg.color,
                stroke: cfg.stroke_color,
                stroke_width: cfg.stroke_width,
            });
        }

        self.draw(canvas, &draws, cfg.opacity)?;
        Ok(StageOutcome::Applied)
    }
}
