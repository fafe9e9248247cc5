//! Capacity solver: the fast, necessary-condition reparability check.
//!
//! Per involved repair chain, counts the spares the chain can offer against
//! the faulty connections it must rescue. Purely arithmetic — it never
//! constructs a route, so it can be optimistic in pathological topologies,
//! but a fault it rejects is rejected by the routing solver too.

use std::collections::HashSet;

use cira_core::{signal_name, BumpTable, RepairTag, RouteTable};

/// Decide reparability by per-chain spare-vs-demand counting.
///
/// Returns [`RepairTag::Repairable`] or [`RepairTag::Unrepairable`]. `fault`
/// holds the faulty connection names; `chains` the involved repair chains
/// from classification.
pub fn capacity_solve(
    chains: &[String],
    fault: &[&str],
    bumps: &BumpTable,
    routes: &RouteTable,
) -> RepairTag {
    for chain in chains {
        // Spares this chain can offer: distinct connections that are either
        // spare-flagged in the bump map or spare-only in the route table
        // (no Default row anywhere).
        let mut spares: Vec<&str> = Vec::new();
        for row in routes.rows_for_chain(chain) {
            let flagged = bumps
                .get(&row.connection)
                .map(|b| b.spare)
                .unwrap_or(false);
            if (flagged || !routes.has_default_row(&row.connection))
                && !spares.contains(&row.connection.as_str())
            {
                spares.push(&row.connection);
            }
        }

        let chain_connections: HashSet<&str> = routes
            .rows_for_chain(chain)
            .map(|r| r.connection.as_str())
            .collect();
        let chain_signals: HashSet<&str> = routes
            .rows_for_chain(chain)
            .map(|r| r.signal.as_str())
            .collect();

        let mut faulty_demand = 0usize;
        for connection in fault {
            if chain_connections.contains(connection) {
                faulty_demand += 1;
            }

            // A chain signal with no repair route at all cannot be rescued,
            // whatever the spare count.
            let signal = signal_name(connection);
            if chain_signals.contains(signal.as_str())
                && !routes.has_repair_row_for_signal(&signal)
            {
                return RepairTag::Unrepairable;
            }
        }

        if faulty_demand > spares.len() {
            return RepairTag::Unrepairable;
        }
    }

    RepairTag::Repairable
}
