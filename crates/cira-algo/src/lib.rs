//! # cira-algo: Fault-Reparability Engine
//!
//! The analysis core: given a loaded bump table and route table, this crate
//!
//! - enumerates fault patterns consistent with a fault model
//!   ([`FaultEnumerator`]: k-bump shorts constrained by geometric
//!   connectivity, single or multiple opens);
//! - classifies each fault ([`classify_fault`]: Benign / Repair /
//!   Catastrophic plus the involved repair chains);
//! - decides reparability with a fast per-chain capacity check
//!   ([`capacity_solve`], necessary condition) or an exhaustive
//!   backtracking router ([`routing_solve`], sufficient condition with a
//!   concrete mux/select assignment);
//! - handles bundle-granularity interfaces ([`bundle_solve`]);
//! - estimates interface and system yield by Monte-Carlo sweep over
//!   electrical yields ([`estimate_interface_yield`],
//!   [`estimate_system_yield`]).
//!
//! Everything here is single-threaded and purely computational; solver
//! outcomes are values (`Repairable` / `Unrepairable`), never errors. All
//! randomness flows from one seeded source, so runs are reproducible per
//! seed.

pub mod analysis;
pub mod bundle;
pub mod capacity;
pub mod classify;
pub mod enumerate;
pub mod io;
pub mod monte_carlo;
pub mod routing;
pub mod system;

pub use analysis::{
    fault_table, repair_solutions, reparability_statistics, resolve_with_capacity,
    resolve_with_routing, FaultRecord, RepairSummary,
};
pub use bundle::bundle_solve;
pub use capacity::capacity_solve;
pub use classify::{classify_fault, effective_type, Classification};
pub use enumerate::{enumerate_faults, Combinations, FaultEnumerator, FaultKind, FaultModel, FaultPattern, MultiFaultMode};
pub use monte_carlo::{estimate_interface_yield, yield_range, SampleCounters, YieldConfig, YieldPoint};
pub use routing::{routing_solve, ChainAssignment, RouteOutcome};
pub use system::{estimate_system_yield, surface_figures, SurfaceFigures, SystemInterface, SystemYieldPoint};
