//! Container format detection for bump-map files.

use std::path::Path;

use cira_core::{CiraError, CiraResult};

/// Supported bump-map container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFormat {
    /// YAML mapping-of-lists (one list per column)
    Yaml,
    /// CSV with a header row
    Csv,
    /// JSON array of record objects
    Json,
    /// XML document with one element per record
    Xml,
}

impl MapFormat {
    pub const ALL: &'static [MapFormat] = &[
        MapFormat::Yaml,
        MapFormat::Csv,
        MapFormat::Json,
        MapFormat::Xml,
    ];

    /// Expected file extensions for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MapFormat::Yaml => &["yaml", "yml"],
            MapFormat::Csv => &["csv"],
            MapFormat::Json => &["json"],
            MapFormat::Xml => &["xml"],
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            MapFormat::Yaml => "YAML mapping-of-lists",
            MapFormat::Csv => "CSV",
            MapFormat::Json => "JSON array",
            MapFormat::Xml => "XML rows",
        }
    }

    /// Detect the format from a file extension.
    pub fn detect(path: &Path) -> CiraResult<MapFormat> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        for format in Self::ALL {
            if format.extensions().iter().any(|e| *e == ext) {
                return Ok(*format);
            }
        }

        Err(CiraError::InputFormat(format!(
            "unsupported bump-map extension '.{ext}' for '{}' (supported: yaml, yml, csv, json, xml)",
            path.display()
        )))
    }
}

impl std::fmt::Display for MapFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.friendly_name())
    }
}
