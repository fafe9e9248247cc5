//! Aspect table: the renderer's `Type → (Color, Shape)` mapping.

use std::collections::HashMap;
use std::path::Path;

use cira_core::{CiraError, CiraResult};
use serde::Deserialize;

/// Glyph drawn for a bump (or a legend entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Shape {
    Circle,
    Triangle,
    Square,
    /// Used by repair-tag legend entries, never by bumps
    Line,
}

impl std::str::FromStr for Shape {
    type Err = CiraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Circle" => Ok(Shape::Circle),
            "Triangle" => Ok(Shape::Triangle),
            "Square" => Ok(Shape::Square),
            "Line" => Ok(Shape::Line),
            other => Err(CiraError::Parse(format!("unknown shape '{other}'"))),
        }
    }
}

/// Color and shape for one type key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectStyle {
    pub color: String,
    pub shape: Shape,
}

#[derive(Debug, Deserialize)]
struct AspectRow {
    #[serde(rename = "Type")]
    key: String,
    #[serde(rename = "Color")]
    color: String,
    #[serde(rename = "Shape")]
    shape: Shape,
}

/// Lookup table keyed by bump type or repair tag name.
#[derive(Debug, Clone, Default)]
pub struct AspectTable {
    styles: HashMap<String, AspectStyle>,
}

impl AspectTable {
    pub fn insert(&mut self, key: impl Into<String>, color: impl Into<String>, shape: Shape) {
        self.styles.insert(
            key.into(),
            AspectStyle {
                color: color.into(),
                shape,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&AspectStyle> {
        self.styles.get(key)
    }

    /// Like [`AspectTable::get`], but a missing key is a hard error — the
    /// renderer cannot invent colors.
    pub fn style_for(&self, key: &str) -> CiraResult<&AspectStyle> {
        self.styles.get(key).ok_or_else(|| {
            CiraError::MissingReference(format!("no aspect entry for type '{key}'"))
        })
    }
}

/// Load an aspect CSV (`Type,Color,Shape` header).
pub fn load_aspect(path: &Path) -> CiraResult<AspectTable> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| CiraError::Parse(format!("reading aspect file '{}': {e}", path.display())))?;
    let mut table = AspectTable::default();
    for (i, result) in reader.deserialize::<AspectRow>().enumerate() {
        let row = result
            .map_err(|e| CiraError::Parse(format!("malformed aspect record {}: {e}", i + 1)))?;
        table.insert(row.key, row.color, row.shape);
    }
    Ok(table)
}
