use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{foundation::error::CardResult, render::ElementKind};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// On-disk layout shared by all commands, rooted at one directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    pub cards_dir: PathBuf,
    pub borders_dir: PathBuf,
    pub nameplates_dir: PathBuf,
    pub numerals_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config_path: PathBuf,
}

impl Workspace {
    pub fn at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            cards_dir: root.join("images").join("cards"),
            borders_dir: root.join("elements").join("borders"),
            nameplates_dir: root.join("elements").join("nameplates"),
            numerals_dir: root.join("elements").join("numerals"),
            output_dir: root.join("images").join("final"),
            config_path: root.join("config").join("elements_config.json"),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn element_dir(&self, kind: ElementKind) -> &Path {
        match kind {
            ElementKind::Border => &self.borders_dir,
            ElementKind::Nameplate => &self.nameplates_dir,
            ElementKind::Numeral => &self.numerals_dir,
        }
    }

    pub fn ensure_directories(&self) -> CardResult<()> {
        for dir in [
            &self.cards_dir,
            &self.borders_dir,
            &self.nameplates_dir,
            &self.numerals_dir,
            &self.output_dir,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create directory '{}'", dir.display()))?;
        }
        Ok(())
    }

    pub fn card_files(&self) -> CardResult<Vec<String>> {
        list_images(&self.cards_dir)
    }
}

pub fn is_image_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// File names of raster images directly inside `dir`, sorted. A missing directory lists as
/// empty.
pub fn list_images(dir: &Path) -> CardResult<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("list directory '{}'", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str()
            && is_image_file(name)
        {
            out.push(name.to_owned());
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn layout_matches_directory_contract() {
        let ws = Workspace::at("/deck");
        assert_eq!(ws.cards_dir, Path::new("/deck/images/cards"));
        assert_eq!(ws.output_dir, Path::new("/deck/images/final"));
        assert_eq!(
            ws.element_dir(ElementKind::Numeral),
            Path::new("/deck/elements/numerals")
        );
        assert_eq!(
            ws.config_path,
            Path::new("/deck/config/elements_config.json")
        );
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(is_image_file("a.PNG"));
        assert!(is_image_file("b.jpeg"));
        assert!(is_image_file("c.webp"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn list_images_filters_and_sorts() {
        let dir = temp_dir("list_images");
        let ws = Workspace::at(&dir);
        ws.ensure_directories().unwrap();
        for name in ["b.png", "a.jpg", "readme.md"] {
            std::fs::write(ws.cards_dir.join(name), b"x").unwrap();
        }
        std::fs::create_dir_all(ws.cards_dir.join("nested.png")).unwrap();

        assert_eq!(ws.card_files().unwrap(), vec!["a.jpg", "b.png"]);
        assert!(list_images(&dir.join("missing")).unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
