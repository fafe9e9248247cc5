//! Routing solver: the exhaustive, sufficient-condition check.
//!
//! Backtracks over the multiplexer configuration space of each involved
//! repair chain. Variables are the chain's signals, domains are their route
//! rows (explored in table order), and the single global constraint is
//! all-different over connections. One solution per chain suffices; a chain
//! with none makes the whole fault unrepairable.

use std::collections::HashSet;

use cira_core::{BumpId, BumpTable, RouteRow, RouteTable};
use serde::Serialize;

/// Mux programming for one repair chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainAssignment {
    pub chain: String,
    /// `(mux, sel)` pairs, one per rerouted signal
    pub settings: Vec<(String, String)>,
}

/// Outcome of the routing search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Every involved chain found a consistent assignment
    Repairable(Vec<ChainAssignment>),
    /// Some chain exhausted its configuration space
    Unrepairable,
}

impl RouteOutcome {
    pub fn is_repairable(&self) -> bool {
        matches!(self, RouteOutcome::Repairable(_))
    }
}

/// Search for a concrete repair assignment for a `Repair`-tagged fault.
pub fn routing_solve(
    fault: &[BumpId],
    bumps: &BumpTable,
    routes: &RouteTable,
) -> RouteOutcome {
    // Per involved chain, the signals needing a live connection. Keyed by
    // first-seen chain order; a later faulty bump in the same chain rebuilds
    // the list (its reversal heuristic wins).
    let mut plans: Vec<(String, Vec<String>)> = Vec::new();

    for &id in fault {
        let bump = bumps.bump(id);
        if !bump.kind.is_functional() || bump.spare {
            continue;
        }
        let Some(chain) = routes
            .rows_for_connection(&bump.name)
            .next()
            .map(|row| row.chain.clone())
        else {
            continue;
        };

        let mut signals: Vec<String> = Vec::new();
        for row in routes.rows_for_chain(&chain) {
            let spare = bumps.get(&row.connection).map(|b| b.spare).unwrap_or(false);
            if !spare && !signals.contains(&row.signal) {
                signals.push(row.signal.clone());
            }
        }

        // Heuristic: when the endangered signal sits in the second half of
        // the list, reverse it so the search collides with the fault early
        // and prunes dead subtrees sooner.
        let bump_signal = bump.signal();
        if let Some(pos) = signals.iter().position(|s| *s == bump_signal) {
            if pos * 2 > signals.len() {
                signals.reverse();
            }
        }

        match plans.iter_mut().find(|(c, _)| *c == chain) {
            Some(entry) => entry.1 = signals,
            None => plans.push((chain, signals)),
        }
    }

    if plans.is_empty() {
        return RouteOutcome::Unrepairable;
    }

    // Working table: faulty connections are gone, and only the signals we
    // are routing remain. The loaded table is never touched.
    let faulty: HashSet<&str> = fault.iter().map(|&id| bumps.bump(id).name.as_str()).collect();
    let wanted: HashSet<&str> = plans
        .iter()
        .flat_map(|(_, signals)| signals.iter().map(String::as_str))
        .collect();
    let working = routes
        .without_connections(&faulty)
        .restricted_to_signals(&wanted);

    let mut assignments = Vec::with_capacity(plans.len());
    for (chain, signals) in &plans {
        match solve_chain(signals, &working) {
            Some(solution) => assignments.push(ChainAssignment {
                chain: chain.clone(),
                settings: solution
                    .iter()
                    .map(|row| (row.mux.clone(), row.sel.clone()))
                    .collect(),
            }),
            None => return RouteOutcome::Unrepairable,
        }
    }

    RouteOutcome::Repairable(assignments)
}

/// Depth-first search over one chain's signals; stops at the first
/// complete assignment.
fn solve_chain<'a>(signals: &[String], working: &'a RouteTable) -> Option<Vec<&'a RouteRow>> {
    let mut used: Vec<&str> = Vec::with_capacity(signals.len());
    let mut partial: Vec<&RouteRow> = Vec::with_capacity(signals.len());
    if descend(signals, 0, &mut used, &mut partial, working) {
        Some(partial)
    } else {
        None
    }
}

fn descend<'a>(
    signals: &[String],
    depth: usize,
    used: &mut Vec<&'a str>,
    partial: &mut Vec<&'a RouteRow>,
    working: &'a RouteTable,
) -> bool {
    debug_assert_eq!(used.len(), partial.len());
    debug_assert_eq!(used.len(), depth);

    if depth == signals.len() {
        return true;
    }

    for row in working.rows_for_signal(&signals[depth]) {
        if used.contains(&row.connection.as_str()) {
            continue;
        }
        used.push(&row.connection);
        partial.push(row);
        if descend(signals, depth + 1, used, partial, working) {
            return true;
        }
        used.pop();
        partial.pop();
    }

    false
}
