//! Named color palettes for recoloring.
//!
//! Palette files are JSON objects mapping a name to a list of `#rrggbb`
//! strings:
//!
//! ```json
//! { "sepia": ["#2b1d0e", "#7a5230", "#c9a66b", "#f3e2c0"] }
//! ```

use crate::error::{MosaicError, Result};
use rgb::RGB8;
use std::collections::BTreeMap;
use std::path::Path;

const BYZANTINE: &[&str] = &[
    "#1b1b3a", "#2e4a7d", "#3f7cac", "#c9a227", "#e8c766", "#8c2f39", "#f2ead3", "#5a3d2b",
];
const ROMAN: &[&str] = &[
    "#efe6d2", "#c8b28e", "#9c7a54", "#6b4e31", "#2f2418", "#a23b2a", "#6f7f5c", "#d9a45b",
];
const RAVENNA: &[&str] = &[
    "#0f2d52", "#1f5f8b", "#2e8b57", "#9bc53d", "#f4d35e", "#ffffff", "#7d3c98", "#c0392b",
];
const GRAYSCALE: &[&str] = &[
    "#000000", "#242424", "#494949", "#6d6d6d", "#929292", "#b6b6b6", "#dbdbdb", "#ffffff",
];

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex(text: &str) -> Result<RGB8> {
    let hex = text.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MosaicError::Config(format!("invalid color '{text}', expected #rrggbb")));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16)
        .map_err(|e| MosaicError::Config(format!("invalid color '{text}': {e}")));
    Ok(RGB8::new(channel(0)?, channel(2)?, channel(4)?))
}

fn parse_list(name: &str, entries: &[&str]) -> Result<Vec<RGB8>> {
    entries
        .iter()
        .map(|e| parse_hex(e))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| MosaicError::Config(format!("palette '{name}': {e}")))
}

/// Palettes keyed by name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palettes {
    entries: BTreeMap<String, Vec<RGB8>>,
}

impl Palettes {
    pub fn new() -> Self {
        Self::default()
    }

    /// The palettes shipped with the crate.
    pub fn builtin() -> Self {
        let mut palettes = Self::new();
        for (name, colors) in [
            ("byzantine", BYZANTINE),
            ("roman", ROMAN),
            ("ravenna", RAVENNA),
            ("grayscale", GRAYSCALE),
        ] {
            if let Ok(parsed) = parse_list(name, colors) {
                palettes.insert(name, parsed);
            }
        }
        palettes
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(text)
            .map_err(|e| MosaicError::Config(format!("malformed palette file: {e}")))?;
        let mut palettes = Self::new();
        for (name, colors) in raw {
            let refs: Vec<&str> = colors.iter().map(String::as_str).collect();
            let parsed = parse_list(&name, &refs)?;
            palettes.insert(&name, parsed);
        }
        Ok(palettes)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, name: &str, colors: Vec<RGB8>) {
        self.entries.insert(name.to_string(), colors);
    }

    /// Add every palette of `other`, replacing same-named ones.
    pub fn extend(&mut self, other: Palettes) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, name: &str) -> Option<&[RGB8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `names` to palettes; an empty list selects all of them.
    pub fn select(&self, names: &[String]) -> Result<Vec<(String, Vec<RGB8>)>> {
        let chosen: Vec<&str> = if names.is_empty() {
            self.names().collect()
        } else {
            names.iter().map(String::as_str).collect()
        };
        chosen
            .into_iter()
            .map(|name| {
                let colors = self
                    .get(name)
                    .ok_or_else(|| MosaicError::Config(format!("unknown palette '{name}'")))?;
                if colors.is_empty() {
                    return Err(MosaicError::Config(format!("palette '{name}' is empty")));
                }
                Ok((name.to_string(), colors.to_vec()))
            })
            .collect()
    }
}
