//! Bump-map loaders.
//!
//! Four container formats, one record schema: `Name, X, Y, Type, Spare,
//! Bundle` (plus an optional `Z` axis). CSV and JSON carry one object per
//! record; YAML carries one list per column; XML carries one element per
//! record with one child element per field.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use cira_core::{Bump, BumpTable, BumpType, CiraError, CiraResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::format::MapFormat;

/// Truthiness parser shared by every container: accepts native booleans,
/// integers, and the `True`/`False` spellings CSV files carry.
fn parse_flexible_bool(s: &str) -> Result<bool, String> {
    match s.trim() {
        "true" | "True" | "TRUE" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "0" | "" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

#[derive(Debug)]
struct FlexBool(bool);

impl<'de> Deserialize<'de> for FlexBool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlexBoolVisitor;

        impl<'de> de::Visitor<'de> for FlexBoolVisitor {
            type Value = FlexBool;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a boolean or a True/False string")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<FlexBool, E> {
                Ok(FlexBool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FlexBool, E> {
                Ok(FlexBool(v != 0))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FlexBool, E> {
                Ok(FlexBool(v != 0))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FlexBool, E> {
                parse_flexible_bool(v).map(FlexBool).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(FlexBoolVisitor)
    }
}

fn de_spare<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlexBool>::deserialize(deserializer)?
        .map(|b| b.0)
        .unwrap_or(false))
}

fn de_bundle<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// One bump-map record as read from disk, before disambiguation and scaling.
#[derive(Debug, Clone, Deserialize)]
pub struct BumpRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z", default)]
    pub z: Option<f64>,
    #[serde(rename = "Type")]
    pub kind: BumpType,
    #[serde(rename = "Spare", default, deserialize_with = "de_spare")]
    pub spare: bool,
    #[serde(rename = "Bundle", default, deserialize_with = "de_bundle")]
    pub bundle: Option<String>,
}

impl BumpRecord {
    fn into_bump(self) -> Bump {
        Bump {
            name: self.name,
            x: self.x,
            y: self.y,
            z: self.z,
            kind: self.kind,
            spare: self.spare,
            bundle: self.bundle,
        }
    }
}

/// YAML bump maps are columnar: one list per field, row i spread across them.
#[derive(Debug, Deserialize)]
struct ColumnarMap {
    #[serde(rename = "Name")]
    name: Vec<String>,
    #[serde(rename = "X")]
    x: Vec<f64>,
    #[serde(rename = "Y")]
    y: Vec<f64>,
    #[serde(rename = "Z", default)]
    z: Option<Vec<f64>>,
    #[serde(rename = "Type")]
    kind: Vec<BumpType>,
    #[serde(rename = "Spare", default)]
    spare: Option<Vec<FlexBool>>,
    #[serde(rename = "Bundle", default)]
    bundle: Option<Vec<Option<String>>>,
}

impl ColumnarMap {
    fn into_records(self) -> CiraResult<Vec<BumpRecord>> {
        let n = self.name.len();
        let check = |label: &str, len: usize| -> CiraResult<()> {
            if len != n {
                return Err(CiraError::Parse(format!(
                    "column '{label}' has {len} entries but 'Name' has {n}"
                )));
            }
            Ok(())
        };
        check("X", self.x.len())?;
        check("Y", self.y.len())?;
        check("Type", self.kind.len())?;
        if let Some(z) = &self.z {
            check("Z", z.len())?;
        }
        if let Some(spare) = &self.spare {
            check("Spare", spare.len())?;
        }
        if let Some(bundle) = &self.bundle {
            check("Bundle", bundle.len())?;
        }

        let mut records = Vec::with_capacity(n);
        for i in 0..n {
            records.push(BumpRecord {
                name: self.name[i].clone(),
                x: self.x[i],
                y: self.y[i],
                z: self.z.as_ref().map(|z| z[i]),
                kind: self.kind[i],
                spare: self.spare.as_ref().map(|s| s[i].0).unwrap_or(false),
                bundle: self
                    .bundle
                    .as_ref()
                    .and_then(|b| b[i].clone())
                    .filter(|s| !s.trim().is_empty()),
            });
        }
        Ok(records)
    }
}

fn parse_yaml(content: &str) -> CiraResult<Vec<BumpRecord>> {
    let map: ColumnarMap = serde_yaml::from_str(content)
        .map_err(|e| CiraError::Parse(format!("malformed YAML bump map: {e}")))?;
    map.into_records()
}

fn parse_csv(content: &str) -> CiraResult<Vec<BumpRecord>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut records = Vec::new();
    for (i, result) in reader.deserialize::<BumpRecord>().enumerate() {
        let record = result
            .map_err(|e| CiraError::Parse(format!("malformed CSV record {}: {e}", i + 1)))?;
        records.push(record);
    }
    Ok(records)
}

fn parse_json(content: &str) -> CiraResult<Vec<BumpRecord>> {
    serde_json::from_str(content)
        .map_err(|e| CiraError::Parse(format!("malformed JSON bump map: {e}")))
}

/// XML bump maps hold one element per record under the root, one child
/// element per field. Element names are the field names.
fn parse_xml(content: &str) -> CiraResult<Vec<BumpRecord>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut current_field: Option<String> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 3 {
                    current_field =
                        Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(field) = &current_field {
                    let text = t
                        .unescape()
                        .map_err(|e| CiraError::Parse(format!("bad XML text: {e}")))?;
                    fields.insert(field.clone(), text.into_owned());
                }
            }
            Ok(Event::End(_)) => {
                if depth == 3 {
                    current_field = None;
                } else if depth == 2 {
                    records.push(record_from_xml_fields(&fields, records.len() + 1)?);
                    fields.clear();
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CiraError::Parse(format!("malformed XML bump map: {e}"))),
            _ => {}
        }
    }

    Ok(records)
}

fn record_from_xml_fields(
    fields: &HashMap<String, String>,
    index: usize,
) -> CiraResult<BumpRecord> {
    let required = |key: &str| -> CiraResult<&String> {
        fields.get(key).ok_or_else(|| {
            CiraError::Parse(format!("XML record {index} is missing field '{key}'"))
        })
    };
    let parse_coord = |key: &str| -> CiraResult<f64> {
        required(key)?.trim().parse().map_err(|_| {
            CiraError::Parse(format!(
                "XML record {index} has non-numeric '{key}' value '{}'",
                fields[key]
            ))
        })
    };

    Ok(BumpRecord {
        name: required("Name")?.clone(),
        x: parse_coord("X")?,
        y: parse_coord("Y")?,
        z: match fields.get("Z") {
            Some(z) => Some(z.trim().parse().map_err(|_| {
                CiraError::Parse(format!("XML record {index} has non-numeric 'Z' value '{z}'"))
            })?),
            None => None,
        },
        kind: required("Type")?.parse()?,
        spare: match fields.get("Spare") {
            Some(s) => parse_flexible_bool(s)
                .map_err(|e| CiraError::Parse(format!("XML record {index}: {e}")))?,
            None => false,
        },
        bundle: fields
            .get("Bundle")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

/// Load the raw record sequence from a bump-map file, dispatching on the
/// file extension.
pub fn load_bump_records(path: &Path) -> CiraResult<Vec<BumpRecord>> {
    let format = MapFormat::detect(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading bump map '{}'", path.display()))
        .map_err(CiraError::from)?;

    match format {
        MapFormat::Yaml => parse_yaml(&content),
        MapFormat::Csv => parse_csv(&content),
        MapFormat::Json => parse_json(&content),
        MapFormat::Xml => parse_xml(&content),
    }
}

/// Load a bump map and build the indexed table (name disambiguation and
/// per-axis scaling included).
pub fn load_bump_map(path: &Path, x_scale: f64, y_scale: f64) -> CiraResult<BumpTable> {
    let records = load_bump_records(path)?;
    BumpTable::from_records(records.into_iter().map(BumpRecord::into_bump), x_scale, y_scale)
}
