//! Bundle solver: reparability at bundle granularity.
//!
//! When the interface repairs whole bundles instead of individual signals,
//! a fault is recoverable iff every live bundle it touches can fall back to
//! a spare bundle that is itself unaffected. Bumps without a bundle are
//! ignored.

use cira_core::{signal_name, BumpId, BumpTable, RepairTag, RouteStatus, RouteTable};

/// Decide reparability at bundle granularity.
///
/// The route table is expected at bundle granularity too: connections are
/// bundle ids, a `Default` row marks a live bundle, and a bundle's `Repair`
/// row names its designated fallback bundle.
pub fn bundle_solve(fault: &[BumpId], bumps: &BumpTable, routes: &RouteTable) -> RepairTag {
    // Distinct bundles touched by the fault, first-seen order
    let mut touched: Vec<&str> = Vec::new();
    for &id in fault {
        if let Some(bundle) = bumps.bump(id).bundle.as_deref() {
            if !touched.contains(&bundle) {
                touched.push(bundle);
            }
        }
    }

    for bundle in &touched {
        // Pure-spare bundles (no Default row) need no rescue themselves
        if !routes.has_default_row(bundle) {
            continue;
        }

        let signal = signal_name(bundle);
        let target = routes
            .rows_for_signal(&signal)
            .find(|row| row.status == RouteStatus::Repair)
            .map(|row| row.connection.as_str());

        match target {
            // The fallback bundle is faulted too
            Some(target) if touched.contains(&target) => return RepairTag::Unrepairable,
            Some(_) => {}
            // A live bundle with nothing to fall back to
            None => return RepairTag::Unrepairable,
        }
    }

    RepairTag::Repairable
}
