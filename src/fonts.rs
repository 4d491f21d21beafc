//! Font discovery for the text stage.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use usvg::fontdb;

use crate::foundation::error::{CardError, CardResult};

/// Pixel size used whenever the configured font cannot be found.
pub const FALLBACK_FONT_SIZE: f32 = 40.0;

/// Last-resort face when the database has none (Tuffy, public domain).
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/Tuffy.ttf");
const BUNDLED_FAMILY: &str = "Tuffy";

/// A concrete font face ready for layout and rasterization.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    pub data: Arc<Vec<u8>>,
    /// Face index inside `data` (non-zero for font collections).
    pub index: u32,
    pub family: String,
    pub size_px: f32,
    /// True when the configured font was not found and a fallback face was substituted.
    pub fallback: bool,
}

/// Searchable set of font faces.
pub struct FontBook {
    db: fontdb::Database,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::system()
    }
}

impl FontBook {
    /// A book with no faces; every lookup fails.
    pub fn empty() -> Self {
        Self {
            db: fontdb::Database::new(),
        }
    }

    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self { db }
    }

    /// System fonts plus every font found under `dirs`.
    pub fn with_dirs(dirs: &[PathBuf]) -> Self {
        let mut book = Self::system();
        for dir in dirs {
            book.db.load_fonts_dir(dir);
        }
        book
    }

    pub fn load_font_file(&mut self, path: &Path) -> CardResult<()> {
        self.db
            .load_font_file(path)
            .with_context(|| format!("load font '{}'", path.display()))?;
        Ok(())
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Resolve `name` (a font file path, family name, PostScript name or file stem) at
    /// `size_px`.
    ///
    /// Unknown names fall back to a sans-serif face at [`FALLBACK_FONT_SIZE`], or to the
    /// bundled face when the book is empty.
    pub fn resolve(&self, name: &str, size_px: f32) -> CardResult<ResolvedFont> {
        if let Some(font) = load_font_path(name, size_px) {
            return Ok(font);
        }

        if let Some(id) = self.find_by_name(name) {
            return self.face(id, size_px, false);
        }

        let fallback = self
            .db
            .query(&fontdb::Query {
                families: &[fontdb::Family::SansSerif],
                ..fontdb::Query::default()
            })
            .or_else(|| self.db.faces().next().map(|f| f.id));

        let font = match fallback {
            Some(id) => self.face(id, FALLBACK_FONT_SIZE, true)?,
            None => bundled_font(),
        };
        tracing::warn!(
            requested = name,
            family = %font.family,
            size = FALLBACK_FONT_SIZE,
            "font not found, using fallback"
        );
        Ok(font)
    }

    fn find_by_name(&self, name: &str) -> Option<fontdb::ID> {
        let wanted = name.trim();
        let wanted_stem = Path::new(wanted)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(wanted);

        let by_family = self.db.faces().find(|face| {
            face.families
                .iter()
                .any(|(family, _)| family.eq_ignore_ascii_case(wanted))
                || face.post_script_name.eq_ignore_ascii_case(wanted)
        });
        if let Some(face) = by_family {
            return Some(face.id);
        }

        self.db
            .faces()
            .find(|face| {
                let path = match &face.source {
                    fontdb::Source::File(path) | fontdb::Source::SharedFile(path, _) => path,
                    fontdb::Source::Binary(_) => return false,
                };
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| stem.eq_ignore_ascii_case(wanted_stem))
            })
            .map(|face| face.id)
    }

    fn face(&self, id: fontdb::ID, size_px: f32, fallback: bool) -> CardResult<ResolvedFont> {
        let family = self
            .db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_default();
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| {
                CardError::font(format!("font face data for '{family}' unavailable"))
            })?;
        Ok(ResolvedFont {
            data: Arc::new(data),
            index,
            family,
            size_px,
            fallback,
        })
    }
}

fn bundled_font() -> ResolvedFont {
    ResolvedFont {
        data: Arc::new(BUNDLED_FONT.to_vec()),
        index: 0,
        family: BUNDLED_FAMILY.to_owned(),
        size_px: FALLBACK_FONT_SIZE,
        fallback: true,
    }
}

fn load_font_path(name: &str, size_px: f32) -> Option<ResolvedFont> {
    let path = Path::new(name);
    if !path.is_file() {
        return None;
    }
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "cannot read font file");
            return None;
        }
    };

    let mut db = fontdb::Database::new();
    db.load_font_data(data.clone());
    let face = db.faces().next()?;
    Some(ResolvedFont {
        family: face
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_default(),
        index: face.index,
        data: Arc::new(data),
        size_px,
        fallback: false,
    })
}
