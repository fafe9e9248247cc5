//! Reparability analysis drivers.
//!
//! Ties the pipeline together: enumerate fault patterns, classify them,
//! resolve `Repair`-tagged ones with the capacity solver (statistics) or
//! the routing solver (solutions), and summarize the counts.

use cira_core::{BumpTable, CiraResult, RepairTag, RouteTable};
use serde::Serialize;

use crate::capacity::capacity_solve;
use crate::enumerate::{enumerate_faults, FaultModel};
use crate::routing::{routing_solve, ChainAssignment, RouteOutcome};

/// One row of the fault / reparability / repair-solutions tables.
#[derive(Debug, Clone, Serialize)]
pub struct FaultRecord {
    /// Names of the faulty bumps
    pub fault: Vec<String>,
    pub tag: RepairTag,
    /// Involved repair chains, first-seen order
    pub chains: Vec<String>,
    /// Mux programming per chain; only present after the routing solver ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solutions: Option<Vec<ChainAssignment>>,
}

/// Aggregate counts over a resolved fault table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairSummary {
    pub total: usize,
    pub repairable: usize,
    pub benign: usize,
    pub catastrophic: usize,
    pub unrepairable: usize,
}

impl RepairSummary {
    pub fn from_records(records: &[FaultRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.tag {
                RepairTag::Repairable => summary.repairable += 1,
                RepairTag::Benign => summary.benign += 1,
                RepairTag::Catastrophic => summary.catastrophic += 1,
                RepairTag::Unrepairable => summary.unrepairable += 1,
                RepairTag::Repair => {}
            }
        }
        summary
    }

    /// Share of faults the interface survives, in percent.
    pub fn reparability_percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.repairable + self.benign) as f64 / self.total as f64 * 100.0
    }
}

impl std::fmt::Display for RepairSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total faults: {}, Repairable: {}, Benign: {}, Catastrophic: {}, Unrepairable: {}, {}%",
            self.total,
            self.repairable,
            self.benign,
            self.catastrophic,
            self.unrepairable,
            self.reparability_percentage()
        )
    }
}

/// Enumerate and classify every fault pattern (preliminary tags only).
pub fn fault_table(
    model: &FaultModel,
    bumps: &BumpTable,
    routes: &RouteTable,
) -> CiraResult<Vec<FaultRecord>> {
    let records = enumerate_faults(model, bumps, routes)?
        .map(|pattern| FaultRecord {
            fault: pattern
                .bumps
                .iter()
                .map(|&id| bumps.bump(id).name.clone())
                .collect(),
            tag: pattern.tag,
            chains: pattern.chains,
            solutions: None,
        })
        .collect();
    Ok(records)
}

/// Resolve every `Repair`-tagged record in place with the capacity solver.
pub fn resolve_with_capacity(records: &mut [FaultRecord], bumps: &BumpTable, routes: &RouteTable) {
    for record in records {
        if record.tag == RepairTag::Repair {
            let fault: Vec<&str> = record.fault.iter().map(String::as_str).collect();
            record.tag = capacity_solve(&record.chains, &fault, bumps, routes);
        }
    }
}

/// Resolve every `Repair`-tagged record in place with the routing solver,
/// recording the concrete mux/select assignments.
pub fn resolve_with_routing(records: &mut [FaultRecord], bumps: &BumpTable, routes: &RouteTable) {
    for record in records {
        if record.tag != RepairTag::Repair {
            continue;
        }
        let ids: Vec<_> = record
            .fault
            .iter()
            .filter_map(|name| bumps.id_of(name))
            .collect();
        match routing_solve(&ids, bumps, routes) {
            RouteOutcome::Repairable(assignments) => {
                record.tag = RepairTag::Repairable;
                record.solutions = Some(assignments);
            }
            RouteOutcome::Unrepairable => record.tag = RepairTag::Unrepairable,
        }
    }
}

/// Resolve every `Repair`-tagged fault with the capacity solver.
pub fn reparability_statistics(
    model: &FaultModel,
    bumps: &BumpTable,
    routes: &RouteTable,
) -> CiraResult<(Vec<FaultRecord>, RepairSummary)> {
    let mut records = fault_table(model, bumps, routes)?;
    resolve_with_capacity(&mut records, bumps, routes);
    let summary = RepairSummary::from_records(&records);
    Ok((records, summary))
}

/// Resolve every `Repair`-tagged fault with the routing solver.
pub fn repair_solutions(
    model: &FaultModel,
    bumps: &BumpTable,
    routes: &RouteTable,
) -> CiraResult<(Vec<FaultRecord>, RepairSummary)> {
    let mut records = fault_table(model, bumps, routes)?;
    resolve_with_routing(&mut records, bumps, routes);
    let summary = RepairSummary::from_records(&records);
    Ok((records, summary))
}
