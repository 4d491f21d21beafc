//! Per-card state machine and batch driver.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{ImageFormat, RgbaImage};

use crate::{
    catalog::{ArcanaCatalog, Card},
    config::ElementConfig,
    fonts::FontBook,
    foundation::error::{CardError, CardResult},
    render::{
        ElementKind, SkipReason, StageOutcome, border::apply_border, overlay::apply_overlay,
        text::TextRenderer,
    },
    workspace::Workspace,
};

/// Card processing states, visited strictly in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CardState {
    Loaded,
    Bordered,
    Nameplated,
    Numeraled,
    Texted,
    Saved,
}

impl CardState {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Loaded => Some(Self::Bordered),
            Self::Bordered => Some(Self::Nameplated),
            Self::Nameplated => Some(Self::Numeraled),
            Self::Numeraled => Some(Self::Texted),
            Self::Texted => Some(Self::Saved),
            Self::Saved => None,
        }
    }
}

/// What happened in one compositing stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Applied,
    Skipped(SkipReason),
    /// The stage errored; the canvas passed through unchanged.
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageRecord {
    /// State reached once the stage finished.
    pub state: CardState,
    pub status: StageStatus,
}

/// Result of a card that reached [`CardState::Saved`].
#[derive(Clone, Debug)]
pub struct CardReport {
    pub card: Card,
    pub output: PathBuf,
    pub stages: Vec<StageRecord>,
}

impl CardReport {
    pub fn status(&self, state: CardState) -> Option<&StageStatus> {
        self.stages
            .iter()
            .find(|r| r.state == state)
            .map(|r| &r.status)
    }
}

#[derive(Debug)]
pub struct CardFailure {
    pub filename: String,
    pub error: CardError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<CardReport>,
    pub failures: Vec<CardFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.processed.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded() + self.failed()
    }
}

/// Composites configured elements onto card images, one card at a time.
pub struct CardPipeline {
    workspace: Workspace,
    config: ElementConfig,
    catalog: ArcanaCatalog,
    text: Result<TextRenderer, String>,
}

impl std::fmt::Debug for CardPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardPipeline")
            .field("workspace", &self.workspace)
            .field("text", &self.text.as_ref().map(|r| r.font().family.clone()))
            .finish_non_exhaustive()
    }
}

impl CardPipeline {
    /// The text font is resolved once up front; a missing font only fails the text stage.
    pub fn new(
        workspace: Workspace,
        config: ElementConfig,
        catalog: ArcanaCatalog,
        fonts: &FontBook,
    ) -> Self {
        let text = if config.use_custom_elements.text {
            fonts
                .resolve(&config.text.font, config.text.size as f32)
                .and_then(TextRenderer::new)
                .map_err(|e| {
                    tracing::warn!(font = %config.text.font, error = %e, "text font unavailable");
                    e.to_string()
                })
        } else {
            Err("text disabled".to_owned())
        };
        Self {
            workspace,
            config,
            catalog,
            text,
        }
    }

    pub fn config(&self) -> &ElementConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn catalog(&self) -> &ArcanaCatalog {
        &self.catalog
    }

    /// Process every file in `filenames`; per-card failures never stop the batch.
    pub fn run_batch(&mut self, filenames: &[String]) -> BatchReport {
        let mut report = BatchReport::default();
        for filename in filenames {
            match self.process_card(filename) {
                Ok(card) => report.processed.push(card),
                Err(error) => {
                    tracing::error!(file = %filename, error = %error, "card failed");
                    report.failures.push(CardFailure {
                        filename: filename.clone(),
                        error,
                    });
                }
            }
        }
        tracing::info!(
            succeeded = report.succeeded(),
            total = report.total(),
            "batch finished"
        );
        report
    }

    /// Load `filename` from the cards directory, run all stages and save to the output
    /// directory under the same name.
    #[tracing::instrument(skip(self))]
    pub fn process_card(&mut self, filename: &str) -> CardResult<CardReport> {
        let input = self.workspace.cards_dir.join(filename);
        let output = self.workspace.output_dir.join(filename);

        let mut canvas = image::open(&input)
            .with_context(|| format!("open card '{}'", input.display()))?
            .to_rgba8();
        let card = Card::from_filename(&self.catalog, filename);

        let mut state = CardState::Loaded;
        let mut stages = Vec::with_capacity(4);
        while let Some(next) = state.next() {
            if next == CardState::Saved {
                save_canvas(&canvas, &output)?;
                tracing::info!(output = %output.display(), name = %card.name, "saved card");
                break;
            }
            let status = match self.run_stage(next, &mut canvas, &card) {
                Ok(StageOutcome::Applied) => {
                    tracing::debug!(stage = ?next, "applied");
                    StageStatus::Applied
                }
                Ok(StageOutcome::Skipped(SkipReason::MissingAsset(path))) => {
                    tracing::warn!(
                        stage = ?next,
                        path = %path.display(),
                        "element asset not found"
                    );
                    StageStatus::Skipped(SkipReason::MissingAsset(path))
                }
                Ok(StageOutcome::Skipped(reason)) => {
                    tracing::debug!(stage = ?next, ?reason, "skipped");
                    StageStatus::Skipped(reason)
                }
                Err(err) => {
                    tracing::warn!(
                        stage = ?next,
                        error = %err,
                        "stage failed, passing canvas through"
                    );
                    StageStatus::Failed(err.to_string())
                }
            };
            stages.push(StageRecord {
                state: next,
                status,
            });
            state = next;
        }

        Ok(CardReport {
            card,
            output,
            stages,
        })
    }

    fn run_stage(
        &mut self,
        state: CardState,
        canvas: &mut RgbaImage,
        card: &Card,
    ) -> CardResult<StageOutcome> {
        let toggles = self.config.use_custom_elements;
        match state {
            CardState::Bordered => {
                if !toggles.border {
                    return Ok(StageOutcome::Skipped(SkipReason::Disabled));
                }
                let path = self.asset_path(ElementKind::Border);
                apply_border(canvas, &path, &self.config.border)
            }
            CardState::Nameplated => {
                if !toggles.nameplate {
                    return Ok(StageOutcome::Skipped(SkipReason::Disabled));
                }
                let path = self.asset_path(ElementKind::Nameplate);
                apply_overlay(
                    canvas,
                    &path,
                    &self.config.nameplate,
                    ElementKind::Nameplate.width_ratio(),
                )
            }
            CardState::Numeraled => {
                if !toggles.numeral {
                    return Ok(StageOutcome::Skipped(SkipReason::Disabled));
                }
                if card.numeral.is_empty() {
                    return Ok(StageOutcome::Skipped(SkipReason::NoNumeral));
                }
                let path = self.asset_path(ElementKind::Numeral);
                apply_overlay(
                    canvas,
                    &path,
                    &self.config.numeral,
                    ElementKind::Numeral.width_ratio(),
                )
            }
            CardState::Texted => {
                if !toggles.text {
                    return Ok(StageOutcome::Skipped(SkipReason::Disabled));
                }
                let renderer = self.text.as_mut().map_err(|e| CardError::font(e.clone()))?;
                renderer.draw_card_text(canvas, &card.name, &card.numeral, &self.config.text)
            }
            CardState::Loaded | CardState::Saved => Err(CardError::validation(format!(
                "{state:?} is not a compositing stage"
            ))),
        }
    }

    fn asset_path(&self, kind: ElementKind) -> PathBuf {
        let file = match kind {
            ElementKind::Border => &self.config.border.file,
            ElementKind::Nameplate => &self.config.nameplate.file,
            ElementKind::Numeral => &self.config.numeral.file,
        };
        self.workspace.element_dir(kind).join(file)
    }
}

/// Save in the format implied by the extension; formats without alpha get RGB pixels.
pub fn save_canvas(canvas: &RgbaImage, path: &Path) -> CardResult<()> {
    let format = ImageFormat::from_path(path)?;
    match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(canvas.clone())
            .to_rgb8()
            .save_with_format(path, format)?,
        _ => canvas.save_with_format(path, format)?,
    }
    Ok(())
}
