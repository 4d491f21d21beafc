#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod configure;
pub mod fonts;
pub mod foundation;
pub mod framing;
pub mod pipeline;
pub mod render;
pub mod workspace;

pub use catalog::{ArcanaCatalog, Card, CardIdentity, CatalogEntry};
pub use config::{ElementConfig, ElementToggles, ImageElementConfig, Opacity, Position, TextConfig};
pub use configure::{Prompter, run_configure};
pub use fonts::{FALLBACK_FONT_SIZE, FontBook, ResolvedFont};
pub use foundation::color::Rgba8;
pub use foundation::error::{CardError, CardResult};
pub use framing::{
    FitMode, FrameJob, FrameLabels, FrameReport, InnerWindow, frame_card, load_label_mapping,
};
pub use pipeline::{
    BatchReport, CardFailure, CardPipeline, CardReport, CardState, StageRecord, StageStatus,
    save_canvas,
};
pub use render::{ElementKind, SkipReason, StageOutcome};
pub use workspace::{Workspace, list_images};
