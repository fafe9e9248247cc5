//! # cira-io: Input loaders
//!
//! Pure loaders producing the typed tables of `cira-core`:
//!
//! - bump maps from YAML (mapping-of-lists), CSV, JSON (array of objects)
//!   and XML row documents — all four containers yield the same record
//!   schema;
//! - the Interconnect Repair List (nested YAML, leading comment block
//!   allowed) flattened into route rows;
//! - system descriptions for whole-system yield analysis.
//!
//! Loaders fail fast with a single diagnostic ([`cira_core::CiraError`]);
//! they never partially load.

pub mod bump_map;
pub mod format;
pub mod irl;
pub mod system;

pub use bump_map::{load_bump_map, load_bump_records, BumpRecord};
pub use format::MapFormat;
pub use irl::{load_irl, parse_irl};
pub use system::{load_system_description, DieDescriptor, SystemDescription};
