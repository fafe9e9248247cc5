//! Result-table persistence.
//!
//! Writes the fault, reparability, repair-solutions and yield tables as
//! CSV. List-valued cells (fault bump lists, chain lists, per-chain mux
//! settings) are serialized as JSON arrays so downstream tooling can parse
//! them without guessing at separators.

use std::fs::{self, File};
use std::path::Path;

use anyhow::Context;
use cira_core::{CiraError, CiraResult};

use crate::analysis::FaultRecord;
use crate::monte_carlo::YieldPoint;
use crate::system::SystemYieldPoint;

fn create_writer(path: &Path) -> CiraResult<csv::Writer<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory '{}'", parent.display()))
                .map_err(CiraError::from)?;
        }
    }
    let file = File::create(path)
        .with_context(|| format!("creating output file '{}'", path.display()))
        .map_err(CiraError::from)?;
    Ok(csv::Writer::from_writer(file))
}

fn json_cell<T: serde::Serialize>(value: &T) -> CiraResult<String> {
    serde_json::to_string(value).map_err(|e| CiraError::Other(e.to_string()))
}

fn write_records(path: &Path, records: &[FaultRecord], with_solutions: bool) -> CiraResult<()> {
    let mut writer = create_writer(path)?;

    if with_solutions {
        writer
            .write_record(["Fault", "Repair_Type", "Chain_list", "Repair_Solutions"])
            .map_err(|e| CiraError::Other(e.to_string()))?;
    } else {
        writer
            .write_record(["Fault", "Repair_Type", "Chain_list"])
            .map_err(|e| CiraError::Other(e.to_string()))?;
    }

    for record in records {
        let fault = json_cell(&record.fault)?;
        let chains = json_cell(&record.chains)?;
        let result = if with_solutions {
            let solutions = match &record.solutions {
                Some(solutions) => json_cell(solutions)?,
                None => String::new(),
            };
            writer.write_record([
                fault.as_str(),
                record.tag.as_str(),
                chains.as_str(),
                solutions.as_str(),
            ])
        } else {
            writer.write_record([fault.as_str(), record.tag.as_str(), chains.as_str()])
        };
        result.map_err(|e| CiraError::Other(e.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the enumerated fault table (preliminary tags).
pub fn write_fault_table(path: &Path, records: &[FaultRecord]) -> CiraResult<()> {
    write_records(path, records, false)
}

/// Write the reparability table (solver-resolved tags).
pub fn write_reparability_table(path: &Path, records: &[FaultRecord]) -> CiraResult<()> {
    write_records(path, records, false)
}

/// Write the repair-solutions table (resolved tags plus mux programming).
pub fn write_repair_solutions_table(path: &Path, records: &[FaultRecord]) -> CiraResult<()> {
    write_records(path, records, true)
}

/// Write an interface yield curve.
pub fn write_yield_table(path: &Path, points: &[YieldPoint]) -> CiraResult<()> {
    let mut writer = create_writer(path)?;
    writer
        .write_record(["Electrical_Yield", "Yield_Without_Repair", "Yield_With_Repair"])
        .map_err(|e| CiraError::Other(e.to_string()))?;
    for point in points {
        writer
            .write_record([
                point.electrical_yield.to_string(),
                point.without_repair.to_string(),
                point.with_repair.to_string(),
            ])
            .map_err(|e| CiraError::Other(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a system yield curve, surface ratio included.
pub fn write_system_yield_table(path: &Path, points: &[SystemYieldPoint]) -> CiraResult<()> {
    let mut writer = create_writer(path)?;
    writer
        .write_record([
            "Electrical_Yield",
            "Yield_Without_Repair",
            "Yield_With_Repair",
            "Surface_Ratio",
        ])
        .map_err(|e| CiraError::Other(e.to_string()))?;
    for point in points {
        writer
            .write_record([
                point.electrical_yield.to_string(),
                point.without_repair.to_string(),
                point.with_repair.to_string(),
                point
                    .surface_ratio
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
            ])
            .map_err(|e| CiraError::Other(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
