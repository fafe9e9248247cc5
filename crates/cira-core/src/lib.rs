//! # cira-core: Die-to-Die Interface Modeling Core
//!
//! Data structures shared by every CIRA crate: the bump table (geometry and
//! functional role of each physical connection), the route table (flattened
//! Interconnect Repair List), fault tags, and the geometric short test.
//!
//! ## Design
//!
//! Both tables are immutable after load. Route rows reference bumps by name;
//! the tables resolve names to integer indices once at load time so the
//! solvers never do repeated string scans in their inner loops.
//!
//! ## Quick start
//!
//! ```rust
//! use cira_core::{Bump, BumpTable, BumpType};
//!
//! let table = BumpTable::from_records(
//!     vec![
//!         Bump::new("rxdata0_phy", 0.0, 0.0, BumpType::Data),
//!         Bump::new("VSS_phy", 25.0, 0.0, BumpType::Gnd),
//!     ],
//!     1.0,
//!     1.0,
//! )
//! .unwrap();
//!
//! assert_eq!(table.len(), 2);
//! assert!(table.get("rxdata0_phy").is_some());
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod route;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{CiraError, CiraResult};
pub use geometry::{euclidean_distance, forms_short};
pub use route::{signal_name, RouteRow, RouteStatus, RouteTable};

/// Index of a bump inside a [`BumpTable`] (newtype for type safety).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BumpId(usize);

impl BumpId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BumpId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

/// Functional role of a bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BumpType {
    Data,
    Addr,
    Clk,
    Sideband,
    Power,
    Gnd,
    Spare,
    None,
}

impl BumpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::Data => "DATA",
            BumpType::Addr => "ADDR",
            BumpType::Clk => "CLK",
            BumpType::Sideband => "SIDEBAND",
            BumpType::Power => "POWER",
            BumpType::Gnd => "GND",
            BumpType::Spare => "SPARE",
            BumpType::None => "NONE",
        }
    }

    /// Types that carry a functional signal which must survive repair.
    pub fn is_functional(&self) -> bool {
        matches!(
            self,
            BumpType::Data | BumpType::Addr | BumpType::Clk | BumpType::Sideband
        )
    }
}

impl std::fmt::Display for BumpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BumpType {
    type Err = CiraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DATA" => Ok(BumpType::Data),
            "ADDR" => Ok(BumpType::Addr),
            "CLK" => Ok(BumpType::Clk),
            "SIDEBAND" => Ok(BumpType::Sideband),
            "POWER" => Ok(BumpType::Power),
            "GND" => Ok(BumpType::Gnd),
            "SPARE" => Ok(BumpType::Spare),
            "NONE" => Ok(BumpType::None),
            other => Err(CiraError::Parse(format!("unknown bump type '{other}'"))),
        }
    }
}

/// Resolution of a fault after classification and solving.
///
/// `Benign` and `Catastrophic` are final at classification time; `Repair`
/// is the classifier's "a solver must decide" tag, resolved to `Repairable`
/// or `Unrepairable` by the capacity or routing solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepairTag {
    Benign,
    Repair,
    Repairable,
    Unrepairable,
    Catastrophic,
}

impl RepairTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairTag::Benign => "Benign",
            RepairTag::Repair => "Repair",
            RepairTag::Repairable => "Repairable",
            RepairTag::Unrepairable => "Unrepairable",
            RepairTag::Catastrophic => "Catastrophic",
        }
    }
}

impl std::fmt::Display for RepairTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical connection point on the die-to-die interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bump {
    /// Unique name (after disambiguation), usually carrying a `_phy` suffix
    pub name: String,
    /// X coordinate in micrometers, after per-axis scaling
    pub x: f64,
    /// Y coordinate in micrometers, after per-axis scaling
    pub y: f64,
    /// Optional third axis; distance computations use it when both bumps have one
    pub z: Option<f64>,
    pub kind: BumpType,
    /// Spare flag; independent from `kind` (a SPARE-typed bump need not be flagged)
    pub spare: bool,
    /// Bundle id for bundle-granularity repair, if any
    pub bundle: Option<String>,
}

impl Bump {
    pub fn new(name: impl Into<String>, x: f64, y: f64, kind: BumpType) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z: None,
            kind,
            spare: false,
            bundle: None,
        }
    }

    pub fn with_spare(mut self, spare: bool) -> Self {
        self.spare = spare;
        self
    }

    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    /// Functional signal carried by this connection (`_phy` stripped).
    pub fn signal(&self) -> String {
        signal_name(&self.name)
    }
}

/// Axis-aligned bounding box of a bump layout, in micrometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Bounding-box area in square millimeters.
    pub fn surface_mm2(&self) -> f64 {
        self.width() * self.height() * 1e-6
    }
}

/// Indexed, immutable collection of the interface's bumps.
///
/// Construction disambiguates colliding names (the n-th repetition of a name
/// becomes `name_n`, scanning in input order) and applies the per-axis scale
/// factors, so every consumer sees final names and final coordinates.
#[derive(Debug, Clone, Default)]
pub struct BumpTable {
    bumps: Vec<Bump>,
    by_name: HashMap<String, BumpId>,
}

impl BumpTable {
    /// Build a table from raw records, disambiguating names and scaling X/Y.
    pub fn from_records(
        records: impl IntoIterator<Item = Bump>,
        x_scale: f64,
        y_scale: f64,
    ) -> CiraResult<Self> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut bumps = Vec::new();
        let mut by_name = HashMap::new();

        for mut bump in records {
            if !bump.x.is_finite() || !bump.y.is_finite() {
                return Err(CiraError::Parse(format!(
                    "bump '{}' has non-finite coordinates",
                    bump.name
                )));
            }
            let count = seen.entry(bump.name.clone()).or_insert(0);
            if *count > 0 {
                bump.name = format!("{}_{}", bump.name, count);
            }
            *count += 1;

            bump.x *= x_scale;
            bump.y *= y_scale;

            let id = BumpId(bumps.len());
            by_name.insert(bump.name.clone(), id);
            bumps.push(bump);
        }

        Ok(Self { bumps, by_name })
    }

    pub fn len(&self) -> usize {
        self.bumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bumps.is_empty()
    }

    /// Look up a bump by (disambiguated) name. O(1) expected.
    pub fn get(&self, name: &str) -> Option<&Bump> {
        self.by_name.get(name).map(|id| &self.bumps[id.0])
    }

    pub fn id_of(&self, name: &str) -> Option<BumpId> {
        self.by_name.get(name).copied()
    }

    pub fn bump(&self, id: BumpId) -> &Bump {
        &self.bumps[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bump> {
        self.bumps.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = BumpId> {
        (0..self.bumps.len()).map(BumpId)
    }

    /// All bumps flagged as spares, in table order.
    pub fn spares(&self) -> Vec<&Bump> {
        self.bumps.iter().filter(|b| b.spare).collect()
    }

    pub fn spare_count(&self) -> usize {
        self.bumps.iter().filter(|b| b.spare).count()
    }

    /// Bounding box of the layout; `None` for an empty table.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.bumps.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for bump in &self.bumps[1..] {
            bounds.min_x = bounds.min_x.min(bump.x);
            bounds.max_x = bounds.max_x.max(bump.x);
            bounds.min_y = bounds.min_y.min(bump.y);
            bounds.max_y = bounds.max_y.max(bump.y);
        }
        Some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<Bump> {
        vec![
            Bump::new("rxdata0_phy", 0.0, 0.0, BumpType::Data),
            Bump::new("VSS_phy", 25.0, 0.0, BumpType::Gnd),
            Bump::new("VSS_phy", 50.0, 0.0, BumpType::Gnd),
            Bump::new("VSS_phy", 75.0, 0.0, BumpType::Gnd),
            Bump::new("spare0_phy", 100.0, 0.0, BumpType::Spare).with_spare(true),
        ]
    }

    #[test]
    fn test_name_disambiguation() {
        let table = BumpTable::from_records(sample_records(), 1.0, 1.0).unwrap();

        // First occurrence keeps the bare name, later ones get _1, _2, ...
        assert!(table.get("VSS_phy").is_some());
        assert!(table.get("VSS_phy_1").is_some());
        assert!(table.get("VSS_phy_2").is_some());
        assert!(table.get("VSS_phy_3").is_none());

        // All names distinct after load
        let names: std::collections::HashSet<_> = table.iter().map(|b| b.name.clone()).collect();
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn test_axis_scaling() {
        let table = BumpTable::from_records(sample_records(), 2.0, 0.5).unwrap();
        let vss = table.get("VSS_phy_1").unwrap();
        assert_eq!(vss.x, 100.0);
        assert_eq!(vss.y, 0.0);
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let records = vec![Bump::new("bad", f64::NAN, 0.0, BumpType::Data)];
        assert!(BumpTable::from_records(records, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_spares() {
        let table = BumpTable::from_records(sample_records(), 1.0, 1.0).unwrap();
        assert_eq!(table.spare_count(), 1);
        assert_eq!(table.spares()[0].name, "spare0_phy");
    }

    #[test]
    fn test_bounds_and_surface() {
        let table = BumpTable::from_records(
            vec![
                Bump::new("a", 0.0, 0.0, BumpType::Data),
                Bump::new("b", 1000.0, 2000.0, BumpType::Data),
            ],
            1.0,
            1.0,
        )
        .unwrap();
        let bounds = table.bounds().unwrap();
        assert_eq!(bounds.width(), 1000.0);
        assert_eq!(bounds.height(), 2000.0);
        assert!((bounds.surface_mm2() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_spare_flag_independent_from_type() {
        // A SPARE-typed bump without the flag and a GND bump with it are both legal.
        let table = BumpTable::from_records(
            vec![
                Bump::new("s", 0.0, 0.0, BumpType::Spare),
                Bump::new("g", 1.0, 0.0, BumpType::Gnd).with_spare(true),
            ],
            1.0,
            1.0,
        )
        .unwrap();
        assert!(!table.get("s").unwrap().spare);
        assert!(table.get("g").unwrap().spare);
    }

    #[test]
    fn test_bump_type_roundtrip() {
        for kind in [
            BumpType::Data,
            BumpType::Addr,
            BumpType::Clk,
            BumpType::Sideband,
            BumpType::Power,
            BumpType::Gnd,
            BumpType::Spare,
            BumpType::None,
        ] {
            let parsed: BumpType = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("BOGUS".parse::<BumpType>().is_err());
    }

    #[test]
    fn test_serde_uppercase_names() {
        let json = serde_json::to_string(&BumpType::Sideband).unwrap();
        assert_eq!(json, "\"SIDEBAND\"");
        let back: BumpType = serde_json::from_str("\"GND\"").unwrap();
        assert_eq!(back, BumpType::Gnd);
    }
}
