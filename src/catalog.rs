//! Card identity resolution.
//!
//! A card's display name and numeral are derived purely from its file name. Major arcana are
//! looked up in an [`ArcanaCatalog`]; anything else gets a best-effort title.

use std::path::Path;

/// One named entry of the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub numeral: String,
}

/// Resolved identity of a card image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardIdentity {
    pub name: String,
    /// Roman numeral (or `"0"`), empty for cards outside the catalog.
    pub numeral: String,
}

/// A card file on disk together with its resolved identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub filename: String,
    pub name: String,
    pub numeral: String,
}

impl Card {
    pub fn from_filename(catalog: &ArcanaCatalog, filename: &str) -> Self {
        let CardIdentity { name, numeral } = catalog.resolve(filename);
        Self {
            filename: filename.to_owned(),
            name,
            numeral,
        }
    }
}

const MAJOR_ARCANA: [(&str, &str); 22] = [
    ("The Fool", "0"),
    ("The Magician", "I"),
    ("The High Priestess", "II"),
    ("The Empress", "III"),
    ("The Emperor", "IV"),
    ("The Hierophant", "V"),
    ("The Lovers", "VI"),
    ("The Chariot", "VII"),
    ("Strength", "VIII"),
    ("The Hermit", "IX"),
    ("Wheel of Fortune", "X"),
    ("Justice", "XI"),
    ("The Hanged Man", "XII"),
    ("Death", "XIII"),
    ("Temperance", "XIV"),
    ("The Devil", "XV"),
    ("The Tower", "XVI"),
    ("The Star", "XVII"),
    ("The Moon", "XVIII"),
    ("The Sun", "XIX"),
    ("Judgement", "XX"),
    ("The World", "XXI"),
];

/// Immutable, ordered lookup table of named cards.
///
/// Construct once and share by reference; the default is the 22 major arcana.
#[derive(Clone, Debug)]
pub struct ArcanaCatalog {
    entries: Vec<CatalogEntry>,
    keys: Vec<String>,
}

impl Default for ArcanaCatalog {
    fn default() -> Self {
        Self::major_arcana()
    }
}

impl ArcanaCatalog {
    pub fn major_arcana() -> Self {
        Self::new(MAJOR_ARCANA.iter().map(|(name, numeral)| CatalogEntry {
            name: (*name).to_owned(),
            numeral: (*numeral).to_owned(),
        }))
    }

    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let entries: Vec<CatalogEntry> = entries.into_iter().collect();
        let keys = entries.iter().map(|e| comparison_key(&e.name)).collect();
        Self { entries, keys }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose comparison key equals that of `name`.
    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        let key = comparison_key(name);
        self.keys
            .iter()
            .position(|k| *k == key)
            .map(|idx| &self.entries[idx])
    }

    /// Resolve a card file name into a display name and numeral. Never fails.
    pub fn resolve(&self, filename: &str) -> CardIdentity {
        let stem = card_stem(filename);

        if let Some(entry) = self.lookup(stem) {
            return CardIdentity {
                name: entry.name.clone(),
                numeral: entry.numeral.clone(),
            };
        }

        let title = title_case(&stem.replace('_', " "));
        let words: Vec<&str> = title.split_whitespace().collect();
        let of_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| **w == "Of")
            .map(|(i, _)| i)
            .collect();

        if let [idx] = of_positions.as_slice() {
            let rank = words[..*idx].join(" ");
            let suit = words[idx + 1..].join(" ");
            return CardIdentity {
                name: format!("{rank} of {suit}"),
                numeral: String::new(),
            };
        }

        CardIdentity {
            name: title,
            numeral: String::new(),
        }
    }
}

/// File stem with any `_v<N>` variation suffix removed.
///
/// Everything from the first `_v` onward is dropped.
pub fn card_stem(filename: &str) -> &str {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    match stem.find("_v") {
        Some(idx) => &stem[..idx],
        None => stem,
    }
}

fn comparison_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
